//! Channel cache with last-known-value fallback
//!
//! Every channel always holds a value. A channel that was not refreshed this
//! cycle re-emits whatever it held last, or its default before the first
//! detection.

use std::collections::BTreeMap;

use crate::tracking::landmarks::HandSide;

/// Frame centre at zero depth
pub const DEFAULT_POSITION: [f32; 3] = [0.5, 0.5, 0.0];

/// Logical output signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelId {
    Head,
    Eyes,
    LeftHand,
    LeftHandOpen,
    RightHand,
    RightHandOpen,
    /// Raw averaged eye-aspect-ratio, for tuning the threshold
    EyeRatio,
}

impl ChannelId {
    pub const ALL: [ChannelId; 7] = [
        ChannelId::Head,
        ChannelId::Eyes,
        ChannelId::LeftHand,
        ChannelId::LeftHandOpen,
        ChannelId::RightHand,
        ChannelId::RightHandOpen,
        ChannelId::EyeRatio,
    ];

    pub fn hand_position(side: HandSide) -> Self {
        match side {
            HandSide::Left => ChannelId::LeftHand,
            HandSide::Right => ChannelId::RightHand,
        }
    }

    pub fn hand_open(side: HandSide) -> Self {
        match side {
            HandSide::Left => ChannelId::LeftHandOpen,
            HandSide::Right => ChannelId::RightHandOpen,
        }
    }

    /// Value held before the signal is first detected
    pub fn default_value(self) -> ChannelValue {
        match self {
            ChannelId::Head | ChannelId::LeftHand | ChannelId::RightHand => {
                ChannelValue::Vector3(DEFAULT_POSITION)
            }
            ChannelId::Eyes | ChannelId::LeftHandOpen | ChannelId::RightHandOpen => {
                ChannelValue::Flag(true)
            }
            ChannelId::EyeRatio => ChannelValue::Scalar(0.0),
        }
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChannelId::Head => "head",
            ChannelId::Eyes => "eyes",
            ChannelId::LeftHand => "left_hand",
            ChannelId::LeftHandOpen => "left_hand_open",
            ChannelId::RightHand => "right_hand",
            ChannelId::RightHandOpen => "right_hand_open",
            ChannelId::EyeRatio => "eye_ratio",
        };
        f.write_str(name)
    }
}

/// A channel value. Flags go out as 0/1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Vector3([f32; 3]),
    Scalar(f32),
    Flag(bool),
}

/// One output slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub value: ChannelValue,
    /// Refreshed by a detection during the current cycle
    pub fresh: bool,
}

/// Owns every channel's last-known value
#[derive(Debug, Clone)]
pub struct ChannelCache {
    channels: BTreeMap<ChannelId, Channel>,
}

impl Default for ChannelCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelCache {
    pub fn new() -> Self {
        let channels = ChannelId::ALL
            .iter()
            .map(|&id| {
                (
                    id,
                    Channel {
                        value: id.default_value(),
                        fresh: false,
                    },
                )
            })
            .collect();
        Self { channels }
    }

    /// Mark every channel stale ahead of a new cycle
    pub fn begin_cycle(&mut self) {
        for channel in self.channels.values_mut() {
            channel.fresh = false;
        }
    }

    /// Store a freshly computed value
    pub fn update(&mut self, id: ChannelId, value: ChannelValue) {
        self.channels.insert(id, Channel { value, fresh: true });
    }

    pub fn get(&self, id: ChannelId) -> ChannelValue {
        self.channels
            .get(&id)
            .map(|c| c.value)
            .unwrap_or_else(|| id.default_value())
    }

    pub fn is_fresh(&self, id: ChannelId) -> bool {
        self.channels.get(&id).is_some_and(|c| c.fresh)
    }

    /// Immutable copy of every channel for this cycle
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            channels: self.channels.clone(),
        }
    }
}

/// Consistent per-cycle view handed to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSnapshot {
    channels: BTreeMap<ChannelId, Channel>,
}

impl CycleSnapshot {
    pub fn get(&self, id: ChannelId) -> ChannelValue {
        self.channels
            .get(&id)
            .map(|c| c.value)
            .unwrap_or_else(|| id.default_value())
    }

    pub fn is_fresh(&self, id: ChannelId) -> bool {
        self.channels.get(&id).is_some_and(|c| c.fresh)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &Channel)> {
        self.channels.iter().map(|(id, c)| (*id, c))
    }

    /// Number of channels refreshed this cycle
    pub fn fresh_count(&self) -> usize {
        self.channels.values().filter(|c| c.fresh).count()
    }
}
