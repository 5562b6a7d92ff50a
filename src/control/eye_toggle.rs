//! Eye toggle: hysteresis with a dwell timer
//!
//! The toggle flips only after the eyes have stayed below the closed
//! threshold for the full dwell duration. Ordinary blinks never reach it.
//! A flip latches until the eyes open (or the face is lost), so one closed
//! interval toggles at most once however long it lasts.

use std::time::{Duration, Instant};

use crate::config::EyeConfig;

/// Where the toggle is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyePhase {
    /// Eyes open, undetected, or not yet timing a closed interval
    Watching,
    /// Eyes continuously closed, dwell not yet reached
    ArmedClosed,
    /// Already flipped during this closed interval; waits for the eyes to open
    Latched,
}

/// Eye toggle state. `value` starts open (`true`).
#[derive(Debug, Clone)]
pub struct EyeToggle {
    closed_threshold: f32,
    dwell: Duration,
    value: bool,
    closed_since: Option<Instant>,
    latched: bool,
}

impl EyeToggle {
    pub fn new(closed_threshold: f32, dwell: Duration) -> Self {
        Self {
            closed_threshold,
            dwell,
            value: true,
            closed_since: None,
            latched: false,
        }
    }

    pub fn from_config(config: &EyeConfig) -> Self {
        Self::new(config.closed_threshold, config.dwell())
    }

    /// Current toggle value
    pub fn value(&self) -> bool {
        self.value
    }

    pub fn phase(&self) -> EyePhase {
        if self.latched {
            EyePhase::Latched
        } else if self.closed_since.is_some() {
            EyePhase::ArmedClosed
        } else {
            EyePhase::Watching
        }
    }

    /// When the current closed interval started, if one is being timed
    pub fn closed_since(&self) -> Option<Instant> {
        self.closed_since
    }

    /// Feed one frame's EAR (`None` when no face was seen). Returns `true`
    /// if the value flipped on this frame.
    pub fn update(&mut self, ear: Option<f32>, now: Instant) -> bool {
        let Some(ear) = ear.filter(|e| *e < self.closed_threshold) else {
            self.reset_timer();
            return false;
        };

        if self.latched {
            return false;
        }

        match self.closed_since {
            None => {
                tracing::trace!(ear, "Eyes closed, dwell timer started");
                self.closed_since = Some(now);
                false
            }
            Some(since) if now.saturating_duration_since(since) >= self.dwell => {
                self.value = !self.value;
                self.closed_since = None;
                self.latched = true;
                tracing::debug!(value = self.value, "Eye toggle flipped");
                true
            }
            Some(_) => false,
        }
    }

    /// End the current closed interval, timed or latched
    pub fn reset_timer(&mut self) {
        self.closed_since = None;
        self.latched = false;
    }
}

impl Default for EyeToggle {
    fn default() -> Self {
        Self::from_config(&EyeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: f32 = 0.30;
    const CLOSED: f32 = 0.10;
    const FRAME: Duration = Duration::from_millis(10);

    /// Feed `ear` every 10 ms for `span`, starting at `start`. Returns the
    /// number of flips and the time after the last frame.
    fn feed(
        toggle: &mut EyeToggle,
        ear: Option<f32>,
        start: Instant,
        span: Duration,
    ) -> (u32, Instant) {
        let mut flips = 0;
        let mut t = start;
        let end = start + span;
        while t < end {
            if toggle.update(ear, t) {
                flips += 1;
            }
            t += FRAME;
        }
        (flips, t)
    }

    #[test]
    fn test_starts_open_and_watching() {
        let toggle = EyeToggle::default();
        assert!(toggle.value());
        assert_eq!(toggle.phase(), EyePhase::Watching);
    }

    #[test]
    fn test_closed_just_under_dwell_never_flips() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        // frames at 0..=740 ms: the last one is 740 ms after the first
        let (flips, t) = feed(&mut toggle, Some(CLOSED), t0, dwell - Duration::from_millis(5));
        assert_eq!(flips, 0);
        assert_eq!(toggle.phase(), EyePhase::ArmedClosed);

        let (flips, _) = feed(&mut toggle, Some(OPEN), t, Duration::from_secs(1));
        assert_eq!(flips, 0);
        assert!(toggle.value());
        assert_eq!(toggle.phase(), EyePhase::Watching);
    }

    #[test]
    fn test_closed_past_dwell_flips_once() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        let (flips, t) = feed(&mut toggle, Some(CLOSED), t0, dwell + Duration::from_millis(15));
        assert_eq!(flips, 1);
        assert!(!toggle.value());

        let (flips, _) = feed(&mut toggle, Some(OPEN), t, Duration::from_millis(500));
        assert_eq!(flips, 0);
        assert!(!toggle.value());
    }

    #[test]
    fn test_flip_happens_at_dwell_mark() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        assert!(!toggle.update(Some(CLOSED), t0));
        assert!(!toggle.update(Some(CLOSED), t0 + Duration::from_millis(749)));
        assert!(toggle.update(Some(CLOSED), t0 + dwell));
    }

    #[test]
    fn test_long_closure_flips_only_once() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        let (flips, t) = feed(&mut toggle, Some(CLOSED), t0, Duration::from_secs(5));
        assert_eq!(flips, 1);
        assert!(!toggle.value());
        assert_eq!(toggle.phase(), EyePhase::Latched);

        // one open frame ends the interval; the next flip needs a full dwell
        assert!(!toggle.update(Some(OPEN), t));
        assert_eq!(toggle.phase(), EyePhase::Watching);
        let t = t + FRAME;
        let (flips, t) = feed(&mut toggle, Some(CLOSED), t, dwell - FRAME);
        assert_eq!(flips, 0);
        assert!(!toggle.value());
        let (flips, _) = feed(&mut toggle, Some(CLOSED), t, Duration::from_secs(3));
        assert_eq!(flips, 1);
        assert!(toggle.value());
    }

    #[test]
    fn test_slow_frames_still_flip_once() {
        let mut toggle = EyeToggle::new(0.21, Duration::from_millis(750));
        let t0 = Instant::now();

        let mut flips = 0;
        for i in 0..=90u32 {
            if toggle.update(Some(CLOSED), t0 + Duration::from_millis(33) * i) {
                flips += 1;
            }
        }
        assert_eq!(flips, 1);
    }

    #[test]
    fn test_missing_face_releases_latch() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        let (flips, t) = feed(&mut toggle, Some(CLOSED), t0, Duration::from_secs(1));
        assert_eq!(flips, 1);
        assert!(!toggle.update(None, t));
        assert_eq!(toggle.phase(), EyePhase::Watching);

        let (flips, _) = feed(&mut toggle, Some(CLOSED), t + FRAME, Duration::from_secs(1));
        assert_eq!(flips, 1);
        assert!(toggle.value());
    }

    #[test]
    fn test_missing_face_cancels_timer() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        let (_, t) = feed(&mut toggle, Some(CLOSED), t0, Duration::from_millis(600));
        assert_eq!(toggle.phase(), EyePhase::ArmedClosed);

        assert!(!toggle.update(None, t));
        assert_eq!(toggle.phase(), EyePhase::Watching);
        assert!(toggle.closed_since().is_none());

        // a fresh closed interval must time from zero again
        let t = t + FRAME;
        let (flips, t) = feed(&mut toggle, Some(CLOSED), t, Duration::from_millis(600));
        assert_eq!(flips, 0);
        assert!(toggle.value());
        assert!(toggle.update(Some(CLOSED), t + Duration::from_millis(150)));
    }

    #[test]
    fn test_single_open_frame_resets_dwell() {
        let dwell = Duration::from_millis(750);
        let mut toggle = EyeToggle::new(0.21, dwell);
        let t0 = Instant::now();

        toggle.update(Some(CLOSED), t0);
        toggle.update(Some(OPEN), t0 + Duration::from_millis(400));
        assert!(!toggle.update(Some(CLOSED), t0 + Duration::from_millis(410)));
        assert!(!toggle.update(Some(CLOSED), t0 + Duration::from_millis(800)));
        assert!(toggle.value());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut toggle = EyeToggle::new(0.2, Duration::from_millis(100));
        let t0 = Instant::now();
        toggle.update(Some(0.2), t0);
        assert_eq!(toggle.phase(), EyePhase::Watching);
        toggle.update(Some(0.19), t0);
        assert_eq!(toggle.phase(), EyePhase::ArmedClosed);
    }
}
