//! Control signal stabilization
//!
//! Stateful pieces that sit between the feature extractors and the output:
//! - Eye toggle with hysteresis and dwell
//! - Hand open/closed debouncing
//! - Channel cache with last-known-value fallback

pub mod channel;
pub mod eye_toggle;
pub mod hand;

pub use channel::{Channel, ChannelCache, ChannelId, ChannelValue, CycleSnapshot};
pub use eye_toggle::{EyePhase, EyeToggle};
pub use hand::HandDebouncer;
