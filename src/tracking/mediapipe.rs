//! MediaPipe landmark receiver
//!
//! Receives JSON-over-UDP packets from an external MediaPipe helper, one
//! datagram per processed video frame:
//!
//! ```json
//! {
//!   "timestamp": 12.345,
//!   "face": [[x, y, z], ...],
//!   "hands": [{"label": "Right", "score": 0.97, "landmarks": [[x, y, z], ...]}]
//! }
//! ```
//!
//! `face` is null or absent when no face was found; `hands` is empty when no
//! hands were found. Hand labels are the detector's own and are resolved to
//! channels here, according to the configured [`HandednessConvention`].

use serde::Deserialize;
use tokio::net::UdpSocket;

use crate::config::{HandednessConvention, SourceConfig};
use crate::error::{GesturaError, SourceError};
use crate::tracking::landmarks::{
    resolve_side, FaceLandmarks, HandLandmarks, Landmark, LandmarkFrame, HAND_POINTS,
};

/// Largest datagram we accept (a full face mesh plus two hands fits easily)
const MAX_PACKET: usize = 65536;

/// A hand as reported by the detector
#[derive(Debug, Clone, Deserialize)]
pub struct MpHand {
    /// Detector handedness label ("Left" / "Right")
    pub label: String,
    #[serde(default = "default_score")]
    pub score: f32,
    pub landmarks: Vec<Landmark>,
}

fn default_score() -> f32 {
    1.0
}

/// A single JSON packet from the MediaPipe helper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandmarkPacket {
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub face: Option<Vec<Landmark>>,
    #[serde(default)]
    pub hands: Vec<MpHand>,
}

impl LandmarkPacket {
    /// Parse a datagram
    pub fn parse(bytes: &[u8]) -> Result<Self, SourceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SourceError::Parse(format!("JSON parse error: {}", e)))
    }

    /// Build a frame, resolving hand sides. Hands with an unknown label or
    /// the wrong number of points, and empty faces, are dropped as misses.
    pub fn into_frame(self, convention: HandednessConvention) -> LandmarkFrame {
        let mut frame = LandmarkFrame::empty();
        if let Some(ts) = self.timestamp {
            frame = frame.with_timestamp(ts);
        }

        match self.face {
            Some(points) if !points.is_empty() => {
                frame = frame.with_face(FaceLandmarks::new(points));
            }
            Some(_) => tracing::debug!("Ignoring empty face landmark set"),
            None => {}
        }

        for hand in self.hands {
            let Some(side) = resolve_side(&hand.label, convention) else {
                tracing::debug!("Ignoring hand with unknown label '{}'", hand.label);
                continue;
            };
            if hand.landmarks.len() != HAND_POINTS {
                tracing::debug!(
                    "Ignoring {} hand with {} landmarks (expected {})",
                    side,
                    hand.landmarks.len(),
                    HAND_POINTS
                );
                continue;
            }
            frame = frame.with_hand(HandLandmarks::new(side, hand.score, hand.landmarks));
        }

        frame
    }
}

/// Supplies one landmark frame per cycle.
///
/// `next_frame` is the only place the control loop waits. An error means the
/// frame could not be acquired and the cycle is skipped.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn next_frame(&mut self) -> Result<LandmarkFrame, GesturaError>;
}

/// UDP receiver for the MediaPipe helper
pub struct LandmarkReceiver {
    config: SourceConfig,
    socket: Option<UdpSocket>,
    buf: Vec<u8>,
}

impl LandmarkReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            config: config.clone(),
            socket: None,
            buf: vec![0u8; MAX_PACKET],
        }
    }

    /// Bind the UDP socket and start receiving
    pub async fn start(&mut self) -> Result<(), GesturaError> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).await.map_err(|e| {
            SourceError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        tracing::info!(
            "Landmark receiver listening on {} (handedness: {:?})",
            socket.local_addr().map(|a| a.to_string()).unwrap_or(addr),
            self.config.handedness
        );
        self.socket = Some(socket);

        Ok(())
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Landmark receiver stopped");
    }
}

impl FrameSource for LandmarkReceiver {
    async fn next_frame(&mut self) -> Result<LandmarkFrame, GesturaError> {
        let socket = self.socket.as_ref().ok_or(SourceError::Closed)?;

        let (size, _peer) = socket
            .recv_from(&mut self.buf)
            .await
            .map_err(|e| SourceError::Receiver(format!("Receive error: {}", e)))?;

        let packet = LandmarkPacket::parse(&self.buf[..size])?;
        Ok(packet.into_frame(self.config.handedness))
    }
}
