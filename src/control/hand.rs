//! Hand open/closed stabilizer

/// Adopts a new hand-closed reading only after it has been seen on
/// `required_frames` consecutive detections. With `required_frames == 1`
/// every reading is adopted immediately.
#[derive(Debug, Clone)]
pub struct HandDebouncer {
    required_frames: u32,
    stable: Option<bool>,
    candidate: Option<(bool, u32)>,
}

impl HandDebouncer {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames: required_frames.max(1),
            stable: None,
            candidate: None,
        }
    }

    /// Last adopted reading, `None` before the first one
    pub fn stable(&self) -> Option<bool> {
        self.stable
    }

    /// Feed this frame's reading (`None` on a missed detection) and return
    /// the reading to publish, if any.
    pub fn update(&mut self, closed: Option<bool>) -> Option<bool> {
        let Some(closed) = closed else {
            self.candidate = None;
            return None;
        };

        if self.stable == Some(closed) {
            self.candidate = None;
            return self.stable;
        }

        let seen = match self.candidate {
            Some((value, n)) if value == closed => n + 1,
            _ => 1,
        };

        if seen >= self.required_frames {
            self.stable = Some(closed);
            self.candidate = None;
        } else {
            self.candidate = Some((closed, seen));
        }

        self.stable
    }
}

impl Default for HandDebouncer {
    fn default() -> Self {
        Self::new(1)
    }
}
