/// Top-left corner of the overlay window in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Raw pointer input delivered to the overlay window, in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release,
}

/// What a finished gesture turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The finger never left the threshold box around the press point.
    Tap,
    Drag,
}

#[derive(Debug, Clone, Copy)]
struct ActiveGesture {
    window_start: Position,
    touch_x: f32,
    touch_y: f32,
    current: Position,
    moved: bool,
}

/// Tells a drag from a tap. Both start with the same press, so a gesture only counts as a
/// drag once the pointer moves more than `threshold_px` away from the press point on either
/// axis. Once moved, it stays a drag even if the pointer comes back.
#[derive(Debug)]
pub struct TouchTracker {
    threshold_px: i32,
    active: Option<ActiveGesture>,
}

impl TouchTracker {
    pub fn new(threshold_px: i32) -> Self {
        Self {
            threshold_px,
            active: None,
        }
    }

    pub fn press(&mut self, window: Position, x: f32, y: f32) {
        self.active = Some(ActiveGesture {
            window_start: window,
            touch_x: x,
            touch_y: y,
            current: window,
            moved: false,
        });
    }

    /// Returns the position the window should move to, `None` without a press.
    pub fn drag(&mut self, x: f32, y: f32) -> Option<Position> {
        let gesture = self.active.as_mut()?;
        let dx = (x - gesture.touch_x) as i32;
        let dy = (y - gesture.touch_y) as i32;
        if dx.abs() > self.threshold_px || dy.abs() > self.threshold_px {
            gesture.moved = true;
        }
        gesture.current = Position {
            x: gesture.window_start.x + dx,
            y: gesture.window_start.y + dy,
        };
        Some(gesture.current)
    }

    /// Finishes the gesture, returning its outcome and the final window position.
    pub fn release(&mut self) -> Option<(GestureOutcome, Position)> {
        let gesture = self.active.take()?;
        let outcome = if gesture.moved {
            GestureOutcome::Drag
        } else {
            GestureOutcome::Tap
        };
        Some((outcome, gesture.current))
    }

    /// Drops an unfinished gesture, e.g. when the window disappears mid drag.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn threshold_px(&self) -> i32 {
        self.threshold_px
    }
}

#[cfg(test)]
mod tests {
    use super::{GestureOutcome, Position, TouchTracker};

    const WINDOW: Position = Position { x: 0, y: 240 };

    #[test]
    fn test_small_jitter_is_a_tap() {
        let mut tracker = TouchTracker::new(6);
        tracker.press(WINDOW, 100., 300.);

        assert_eq!(tracker.drag(103., 305.), Some(Position { x: 3, y: 245 }));
        assert_eq!(tracker.drag(106.9, 294.), Some(Position { x: 6, y: 234 }));

        assert_eq!(
            tracker.release(),
            Some((GestureOutcome::Tap, Position { x: 6, y: 234 }))
        );
    }

    #[test]
    fn test_either_axis_past_threshold_is_a_drag() {
        let mut tracker = TouchTracker::new(6);
        tracker.press(WINDOW, 100., 300.);
        tracker.drag(100., 307.);
        assert_eq!(tracker.release().map(|v| v.0), Some(GestureOutcome::Drag));

        tracker.press(WINDOW, 100., 300.);
        tracker.drag(92., 300.);
        assert_eq!(tracker.release().map(|v| v.0), Some(GestureOutcome::Drag));
    }

    #[test]
    fn test_drag_stays_a_drag_after_returning() {
        let mut tracker = TouchTracker::new(6);
        tracker.press(WINDOW, 100., 300.);
        tracker.drag(150., 300.);
        tracker.drag(100., 300.);

        assert_eq!(tracker.release(), Some((GestureOutcome::Drag, WINDOW)));
    }

    #[test]
    fn test_press_release_without_moves() {
        let mut tracker = TouchTracker::new(6);
        tracker.press(WINDOW, 10., 10.);
        assert_eq!(tracker.release(), Some((GestureOutcome::Tap, WINDOW)));
    }

    #[test]
    fn test_input_without_press_is_ignored() {
        let mut tracker = TouchTracker::new(6);
        assert_eq!(tracker.drag(10., 10.), None);
        assert_eq!(tracker.release(), None);

        tracker.press(WINDOW, 10., 10.);
        tracker.cancel();
        assert_eq!(tracker.release(), None);
    }
}
