use serde::Serialize;

pub const SWIPE_THRESHOLD: f64 = 100.0;

const MAX_TILT_OFFSET: f64 = 200.0;
const MAX_TILT_DEGREES: f64 = 20.0;
const INDICATOR_START: f64 = 20.0;
const INDICATOR_FULL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Not interested.
    Left,
    /// Interested.
    Right,
}

/// A pointer drag on the top card.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pointer_id: i32,
    start_x: f64,
    current_x: f64,
}

impl DragState {
    pub fn begin(pointer_id: i32, x: f64) -> Self {
        Self {
            pointer_id,
            start_x: x,
            current_x: x,
        }
    }

    pub fn pointer_id(&self) -> i32 {
        self.pointer_id
    }

    /// Tracks the pointer; events from any other pointer are ignored.
    pub fn update(&mut self, pointer_id: i32, x: f64) -> bool {
        if pointer_id != self.pointer_id {
            return false;
        }
        self.current_x = x;
        true
    }

    pub fn delta(&self) -> f64 {
        self.current_x - self.start_x
    }

    /// The committed direction, or `None` when the card should snap back.
    pub fn release(&self, threshold: f64) -> Option<SwipeDirection> {
        let delta = self.delta();
        if delta.abs() <= threshold {
            return None;
        }
        if delta > 0.0 {
            Some(SwipeDirection::Right)
        } else {
            Some(SwipeDirection::Left)
        }
    }

    pub fn tilt_degrees(&self) -> f64 {
        let normalized = (self.delta() / MAX_TILT_OFFSET).clamp(-1.0, 1.0);
        normalized * MAX_TILT_DEGREES
    }

    /// Opacity of the (nope, like) stamps on the card.
    pub fn indicator_opacity(&self) -> (f64, f64) {
        let ramp = |distance: f64| {
            ((distance - INDICATOR_START) / (INDICATOR_FULL - INDICATOR_START)).clamp(0.0, 1.0)
        };
        let delta = self.delta();
        if delta < 0.0 {
            (ramp(-delta), 0.0)
        } else {
            (0.0, ramp(delta))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dragged(delta: f64) -> DragState {
        let mut drag = DragState::begin(7, 300.0);
        drag.update(7, 300.0 + delta);
        drag
    }

    #[rstest]
    #[case(150.0, Some(SwipeDirection::Right))]
    #[case(-101.0, Some(SwipeDirection::Left))]
    #[case(100.0, None)]
    #[case(-40.0, None)]
    #[case(0.0, None)]
    fn release_commits_past_threshold(#[case] delta: f64, #[case] expected: Option<SwipeDirection>) {
        assert_eq!(dragged(delta).release(SWIPE_THRESHOLD), expected);
    }

    #[test]
    fn other_pointers_are_ignored() {
        let mut drag = DragState::begin(1, 10.0);
        assert!(!drag.update(2, 400.0));
        assert_eq!(drag.delta(), 0.0);
        assert!(drag.update(1, 60.0));
        assert_eq!(drag.delta(), 50.0);
    }

    #[test]
    fn tilt_is_clamped() {
        assert_eq!(dragged(100.0).tilt_degrees(), 10.0);
        assert_eq!(dragged(-500.0).tilt_degrees(), -20.0);
    }

    #[test]
    fn indicators_ramp_with_distance() {
        assert_eq!(dragged(10.0).indicator_opacity(), (0.0, 0.0));
        assert_eq!(dragged(60.0).indicator_opacity(), (0.0, 0.5));
        assert_eq!(dragged(-140.0).indicator_opacity(), (1.0, 0.0));
    }
}
