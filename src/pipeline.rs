//! Per-frame control pipeline and the main loop
//!
//! Each acquired frame runs extraction, stabilization, cache update and
//! dispatch to completion before the next frame is requested. Waiting for
//! the next frame is the loop's only suspension point.

use std::time::Instant;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::control::{
    ChannelCache, ChannelId, ChannelValue, CycleSnapshot, EyeToggle, HandDebouncer,
};
use crate::error::{GesturaError, SourceError};
use crate::output::{DispatchReport, OscDispatcher};
use crate::tracking::features::{self, HandClassifier};
use crate::tracking::{FaceLandmarks, FrameSource, HandLandmarks, HandSide, LandmarkFrame};

/// All cross-cycle state for one set of channels
#[derive(Debug, Clone)]
pub struct ControlPipeline {
    classifier: HandClassifier,
    eyes: EyeToggle,
    left_hand: HandDebouncer,
    right_hand: HandDebouncer,
    cache: ChannelCache,
}

impl Default for ControlPipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ControlPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            classifier: HandClassifier::from_config(&config.hands),
            eyes: EyeToggle::from_config(&config.eyes),
            left_hand: HandDebouncer::new(config.hands.debounce_frames),
            right_hand: HandDebouncer::new(config.hands.debounce_frames),
            cache: ChannelCache::new(),
        }
    }

    pub fn eye_toggle(&self) -> &EyeToggle {
        &self.eyes
    }

    pub fn cache(&self) -> &ChannelCache {
        &self.cache
    }

    /// Run one cycle over `frame` and return the values to emit
    pub fn process(&mut self, frame: &LandmarkFrame, now: Instant) -> CycleSnapshot {
        self.cache.begin_cycle();

        self.update_face(frame.face.as_ref(), now);
        for side in HandSide::BOTH {
            self.update_hand(side, frame.hand(side));
        }

        self.cache.snapshot()
    }

    fn update_face(&mut self, face: Option<&FaceLandmarks>, now: Instant) {
        let Some(face) = face else {
            // a tracking gap must not let a closed-eye dwell keep running
            self.eyes.update(None, now);
            return;
        };

        if let Some(position) = features::head_position(face) {
            self.cache.update(ChannelId::Head, ChannelValue::Vector3(position));
        }

        let ear = features::average_ear(face);
        self.eyes.update(ear, now);

        if let Some(ear) = ear {
            self.cache.update(ChannelId::Eyes, ChannelValue::Flag(self.eyes.value()));
            self.cache.update(ChannelId::EyeRatio, ChannelValue::Scalar(ear));
        }
    }

    fn update_hand(&mut self, side: HandSide, hand: Option<&HandLandmarks>) {
        let debouncer = match side {
            HandSide::Left => &mut self.left_hand,
            HandSide::Right => &mut self.right_hand,
        };

        let Some(hand) = hand else {
            debouncer.update(None);
            return;
        };

        if let Some(position) = features::wrist_position(hand) {
            self.cache
                .update(ChannelId::hand_position(side), ChannelValue::Vector3(position));
        }

        if let Some(closed) = debouncer.update(self.classifier.is_closed(hand)) {
            self.cache
                .update(ChannelId::hand_open(side), ChannelValue::Flag(!closed));
        }
    }
}

/// Loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Frames processed and dispatched
    pub processed: u64,
    /// Cycles skipped because no frame could be acquired
    pub skipped: u64,
    pub messages_sent: u64,
    pub send_failures: u64,
}

impl CycleStats {
    fn record(&mut self, report: DispatchReport) {
        self.processed += 1;
        self.messages_sent += report.sent as u64;
        self.send_failures += report.failed as u64;
    }
}

/// Run cycles until shutdown or until the source closes
pub async fn run<S: FrameSource>(
    source: &mut S,
    pipeline: &mut ControlPipeline,
    dispatcher: &OscDispatcher,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> CycleStats {
    let mut stats = CycleStats::default();

    loop {
        let frame = tokio::select! {
            frame = source.next_frame() => frame,
            _ = shutdown_rx.recv() => {
                tracing::info!("Control loop shutting down");
                break;
            }
        };

        match frame {
            Ok(frame) => {
                let snapshot = pipeline.process(&frame, Instant::now());
                tracing::trace!(fresh = snapshot.fresh_count(), "Cycle processed");
                stats.record(dispatcher.dispatch(&snapshot));
            }
            Err(GesturaError::Source(SourceError::Closed)) => {
                tracing::warn!("Landmark source closed, stopping control loop");
                break;
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!("Skipping cycle: {}", e);
            }
        }
    }

    stats
}
