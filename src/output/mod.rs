//! Output module
//!
//! Sends the per-cycle channel snapshot to the controlled application as
//! OSC messages over UDP.

pub mod osc;

pub use osc::{DispatchReport, OscDispatcher};
