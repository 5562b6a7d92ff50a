//! Tracking module
//!
//! Landmark input and per-frame feature extraction:
//! - Frame data model and hand side resolution
//! - MediaPipe landmark receiver (JSON over UDP)
//! - Head, eye and hand feature extractors

pub mod features;
pub mod landmarks;
pub mod mediapipe;

pub use landmarks::{FaceLandmarks, HandLandmarks, HandSide, Landmark, LandmarkFrame};
pub use mediapipe::{FrameSource, LandmarkReceiver};
