//! Per-frame landmark data
//!
//! A [`LandmarkFrame`] is produced and consumed within a single cycle. Hand
//! side labels are normalized once, by [`resolve_side`], before a frame is
//! built; nothing downstream looks at the detector's raw labels.

use serde::{Deserialize, Serialize};

use crate::config::HandednessConvention;

/// Number of points in a hand landmark set
pub const HAND_POINTS: usize = 21;

/// A single detector landmark in normalized image space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Mirror across the vertical image axis
    pub fn flipped(self) -> Self {
        Self {
            x: 1.0 - self.x,
            ..self
        }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(l: Landmark) -> Self {
        l.to_array()
    }
}

/// Logical hand channel, from the viewer's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    pub fn mirrored(self) -> Self {
        match self {
            HandSide::Left => HandSide::Right,
            HandSide::Right => HandSide::Left,
        }
    }
}

impl std::fmt::Display for HandSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandSide::Left => write!(f, "left"),
            HandSide::Right => write!(f, "right"),
        }
    }
}

/// Map a detector handedness label to a hand channel.
///
/// Returns `None` for labels other than left/right.
pub fn resolve_side(reported: &str, convention: HandednessConvention) -> Option<HandSide> {
    let side = match reported.trim().to_lowercase().as_str() {
        "left" => HandSide::Left,
        "right" => HandSide::Right,
        _ => return None,
    };

    Some(match convention {
        HandednessConvention::Mirrored => side.mirrored(),
        HandednessConvention::Direct => side,
    })
}

/// Face mesh landmarks for one face
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<Landmark>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }
}

/// Hand landmarks for one hand, side already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub side: HandSide,
    /// Detector confidence for this hand
    pub score: f32,
    pub points: Vec<Landmark>,
}

impl HandLandmarks {
    pub fn new(side: HandSide, score: f32, points: Vec<Landmark>) -> Self {
        Self {
            side,
            score,
            points,
        }
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= HAND_POINTS
    }

    /// The same hand seen in a horizontally flipped image, on the other channel
    pub fn mirrored(&self) -> Self {
        Self {
            side: self.side.mirrored(),
            score: self.score,
            points: self.points.iter().map(|p| p.flipped()).collect(),
        }
    }
}

/// Everything the detector reported for one video frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    /// Detector timestamp in seconds, if it sent one
    pub timestamp: Option<f64>,
    pub face: Option<FaceLandmarks>,
    hands: Vec<HandLandmarks>,
}

impl LandmarkFrame {
    /// An empty frame: nothing detected
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_face(mut self, face: FaceLandmarks) -> Self {
        self.face = Some(face);
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a hand. At most one hand is kept per side; a second hand on the
    /// same side replaces the first unless its score is lower.
    pub fn with_hand(mut self, hand: HandLandmarks) -> Self {
        match self.hands.iter_mut().find(|h| h.side == hand.side) {
            Some(existing) if hand.score >= existing.score => *existing = hand,
            Some(_) => {
                tracing::trace!("Dropping lower-confidence duplicate {} hand", hand.side);
            }
            None => self.hands.push(hand),
        }
        self
    }

    pub fn hand(&self, side: HandSide) -> Option<&HandLandmarks> {
        self.hands.iter().find(|h| h.side == side)
    }

    pub fn hands(&self) -> &[HandLandmarks] {
        &self.hands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(side: HandSide, score: f32, x: f32) -> HandLandmarks {
        HandLandmarks::new(side, score, vec![Landmark::new(x, 0.5, 0.0); HAND_POINTS])
    }

    #[test]
    fn test_resolve_side_mirrored_inverts() {
        let c = HandednessConvention::Mirrored;
        assert_eq!(resolve_side("Right", c), Some(HandSide::Left));
        assert_eq!(resolve_side("Left", c), Some(HandSide::Right));
    }

    #[test]
    fn test_resolve_side_direct_keeps() {
        let c = HandednessConvention::Direct;
        assert_eq!(resolve_side("Right", c), Some(HandSide::Right));
        assert_eq!(resolve_side(" left ", c), Some(HandSide::Left));
    }

    #[test]
    fn test_resolve_side_unknown_label() {
        assert_eq!(resolve_side("", HandednessConvention::Direct), None);
        assert_eq!(resolve_side("both", HandednessConvention::Mirrored), None);
    }

    #[test]
    fn test_landmark_json_array() {
        let l: Landmark = serde_json::from_str("[0.1, 0.2, -0.3]").unwrap();
        assert_eq!(l, Landmark::new(0.1, 0.2, -0.3));
        assert_eq!(serde_json::to_string(&l).unwrap(), "[0.1,0.2,-0.3]");
    }

    #[test]
    fn test_duplicate_side_keeps_higher_score() {
        let frame = LandmarkFrame::empty()
            .with_hand(hand(HandSide::Left, 0.9, 0.1))
            .with_hand(hand(HandSide::Left, 0.6, 0.2));
        assert_eq!(frame.hands().len(), 1);
        assert_eq!(frame.hand(HandSide::Left).unwrap().points[0].x, 0.1);

        let frame = frame.with_hand(hand(HandSide::Left, 0.95, 0.3));
        assert_eq!(frame.hand(HandSide::Left).unwrap().points[0].x, 0.3);
        assert!(frame.hand(HandSide::Right).is_none());
    }

    #[test]
    fn test_mirrored_hand_switches_side() {
        let h = hand(HandSide::Right, 0.8, 0.25).mirrored();
        assert_eq!(h.side, HandSide::Left);
        assert!((h.points[0].x - 0.75).abs() < 1e-6);
        assert_eq!(h.points[0].y, 0.5);
    }
}
