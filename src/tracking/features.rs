//! Feature extraction from landmark geometry
//!
//! Everything here is stateless and recomputed every frame. A feature that
//! needs a landmark index the detector did not supply comes back as `None`,
//! which callers treat exactly like a missed detection.

use crate::config::{HandClosedPolicy, HandConfig};
use crate::tracking::landmarks::{FaceLandmarks, HandLandmarks, HandSide, Landmark};

/// Guards the EAR division when the horizontal eye span collapses
pub const EAR_EPSILON: f32 = 1e-6;

/// Face mesh landmark indices
pub mod face_mesh {
    pub const NOSE_TIP: usize = 4;
    /// Outer corner, two upper lid points, inner corner, two lower lid points
    pub const RIGHT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
    pub const LEFT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];
}

/// Hand landmark indices
pub mod hand {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_TIP: usize = 8;
    /// (tip, pip) for index, middle, ring and pinky
    pub const FINGERS: [(usize, usize); 4] = [(8, 6), (12, 10), (16, 14), (20, 18)];
}

/// Head position: the nose tip, passed through unclamped
pub fn head_position(face: &FaceLandmarks) -> Option<[f32; 3]> {
    face.get(face_mesh::NOSE_TIP).map(Landmark::to_array)
}

/// Eye aspect ratio of six ordered eye landmarks.
///
/// `(|p1.y - p5.y| + |p2.y - p4.y|) / (2 * |p0.x - p3.x| + ε)`
pub fn eye_aspect_ratio(p: &[Landmark; 6]) -> f32 {
    let vertical = (p[1].y - p[5].y).abs() + (p[2].y - p[4].y).abs();
    let horizontal = (p[0].x - p[3].x).abs();
    vertical / (2.0 * horizontal + EAR_EPSILON)
}

fn eye_points(face: &FaceLandmarks, indices: &[usize; 6]) -> Option<[Landmark; 6]> {
    let mut points = [Landmark::default(); 6];
    for (slot, &index) in points.iter_mut().zip(indices) {
        *slot = face.get(index)?;
    }
    Some(points)
}

/// EAR averaged over both eyes
pub fn average_ear(face: &FaceLandmarks) -> Option<f32> {
    let right = eye_points(face, &face_mesh::RIGHT_EYE)?;
    let left = eye_points(face, &face_mesh::LEFT_EYE)?;
    Some((eye_aspect_ratio(&right) + eye_aspect_ratio(&left)) / 2.0)
}

/// Wrist position of a hand
pub fn wrist_position(hand: &HandLandmarks) -> Option<[f32; 3]> {
    if !hand.is_complete() {
        return None;
    }
    hand.get(hand::WRIST).map(Landmark::to_array)
}

/// Decides whether a hand is closed, using exactly one configured heuristic
#[derive(Debug, Clone)]
pub struct HandClassifier {
    policy: HandClosedPolicy,
    finger_margin: f32,
    thumb_margin: f32,
    min_folded: u8,
}

impl Default for HandClassifier {
    fn default() -> Self {
        Self::from_config(&HandConfig::default())
    }
}

impl HandClassifier {
    pub fn from_config(config: &HandConfig) -> Self {
        Self {
            policy: config.policy,
            finger_margin: config.finger_margin,
            thumb_margin: config.thumb_margin,
            min_folded: config.min_folded,
        }
    }

    pub fn policy(&self) -> HandClosedPolicy {
        self.policy
    }

    /// `Some(true)` if the hand is closed, `None` if the landmark set is incomplete
    pub fn is_closed(&self, hand: &HandLandmarks) -> Option<bool> {
        if !hand.is_complete() {
            return None;
        }

        match self.policy {
            HandClosedPolicy::MultiFinger => {
                self.folded_fingers(hand).map(|n| n >= self.min_folded)
            }
            HandClosedPolicy::TwoFinger => two_finger_closed(hand),
        }
    }

    /// Number of folded fingers, thumb included.
    ///
    /// Long fingers are folded when the tip is not clearly above its PIP
    /// joint. The thumb is folded when its tip has moved across the thumb MCP
    /// towards the palm; that direction depends on the side, so the result
    /// is identical for a hand and its mirror image on the other channel.
    pub fn folded_fingers(&self, hand: &HandLandmarks) -> Option<u8> {
        let thumb_tip = hand.get(hand::THUMB_TIP)?;
        let thumb_mcp = hand.get(hand::THUMB_MCP)?;
        let across = match hand.side {
            HandSide::Right => thumb_tip.x - thumb_mcp.x,
            HandSide::Left => thumb_mcp.x - thumb_tip.x,
        };

        let mut count = u8::from(across > -self.thumb_margin);

        for (tip, pip) in hand::FINGERS {
            let tip = hand.get(tip)?;
            let pip = hand.get(pip)?;
            if tip.y > pip.y - self.finger_margin {
                count += 1;
            }
        }

        Some(count)
    }
}

fn two_finger_closed(hand: &HandLandmarks) -> Option<bool> {
    let thumb_down = hand.get(hand::THUMB_TIP)?.y > hand.get(hand::THUMB_IP)?.y;
    let index_down = hand.get(hand::INDEX_TIP)?.y > hand.get(hand::INDEX_MCP)?.y;
    Some(thumb_down || index_down)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::tracking::landmarks::HAND_POINTS;

    /// Face mesh sized like MediaPipe's, eyes open to the given EAR
    pub fn face_with_ear(ear: f32) -> FaceLandmarks {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 478];
        points[face_mesh::NOSE_TIP] = Landmark::new(0.52, 0.48, -0.05);
        place_eye(&mut points, &face_mesh::RIGHT_EYE, 0.35, ear);
        place_eye(&mut points, &face_mesh::LEFT_EYE, 0.60, ear);
        FaceLandmarks::new(points)
    }

    fn place_eye(points: &mut [Landmark], idx: &[usize; 6], x0: f32, ear: f32) {
        let width = 0.1;
        // with both spans equal, EAR = 2h / 2w = h / w
        let h = ear * width;
        let y = 0.4;
        points[idx[0]] = Landmark::new(x0, y, 0.0);
        points[idx[1]] = Landmark::new(x0 + 0.03, y - h / 2.0, 0.0);
        points[idx[2]] = Landmark::new(x0 + 0.07, y - h / 2.0, 0.0);
        points[idx[3]] = Landmark::new(x0 + width, y, 0.0);
        points[idx[4]] = Landmark::new(x0 + 0.07, y + h / 2.0, 0.0);
        points[idx[5]] = Landmark::new(x0 + 0.03, y + h / 2.0, 0.0);
    }

    /// Right hand, palm towards the camera, fingers up
    pub fn open_hand(side: HandSide) -> HandLandmarks {
        let mut points = vec![Landmark::new(0.5, 0.8, 0.0); HAND_POINTS];
        points[hand::WRIST] = Landmark::new(0.5, 0.8, 0.0);
        // thumb sticks out away from the palm
        points[hand::THUMB_MCP] = Landmark::new(0.45, 0.7, 0.0);
        points[hand::THUMB_IP] = Landmark::new(0.38, 0.62, 0.0);
        points[hand::THUMB_TIP] = Landmark::new(0.33, 0.58, 0.0);
        for (i, (tip, pip)) in hand::FINGERS.iter().enumerate() {
            let x = 0.47 + 0.04 * i as f32;
            points[*pip] = Landmark::new(x, 0.55, 0.0);
            points[*tip] = Landmark::new(x, 0.40, 0.0);
            points[pip - 1] = Landmark::new(x, 0.65, 0.0);
        }
        let hand = HandLandmarks::new(HandSide::Right, 0.9, points);
        match side {
            HandSide::Right => hand,
            HandSide::Left => hand.mirrored(),
        }
    }

    /// Same hand, fist
    pub fn closed_hand(side: HandSide) -> HandLandmarks {
        let mut hand = open_hand(HandSide::Right);
        hand.points[hand::THUMB_IP] = Landmark::new(0.50, 0.66, 0.0);
        hand.points[hand::THUMB_TIP] = Landmark::new(0.54, 0.68, 0.0);
        for (tip, pip) in hand::FINGERS {
            let x = hand.points[pip].x;
            hand.points[tip] = Landmark::new(x, 0.62, 0.0);
        }
        match side {
            HandSide::Right => hand,
            HandSide::Left => hand.mirrored(),
        }
    }
}
