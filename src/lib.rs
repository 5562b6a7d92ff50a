//! Gestura - landmark-driven OSC controller
//!
//! Turns a stream of face and hand landmark detections into stable control
//! channels for a live application (game engine, visual instrument, stage rig):
//! - Head position from the nose tip
//! - Eye toggle driven by a deliberate, held eye closure
//! - Per-hand wrist position and open/closed state
//!
//! Every channel is sent once per processed frame over OSC/UDP. Channels that
//! were not detected this frame repeat their last known value.

pub mod config;
pub mod control;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod tracking;

pub use config::Config;
pub use error::GesturaError;
pub use pipeline::{run, ControlPipeline, CycleStats};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
