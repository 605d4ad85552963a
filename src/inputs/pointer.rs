//! Mouse drag, click and wheel

use crate::pdf::ZoomState;

use super::{Intent, Point, horizontal_fraction};

#[derive(Clone, Copy, Debug)]
struct Drag {
    origin: Point,
    start_offset: (f32, f32),
}

/// Tracks one mouse drag at a time
#[derive(Debug, Default)]
pub struct PointerTracker {
    drag: Option<Drag>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Begin a pan drag. Only custom zoom can be dragged; returns whether a
    /// drag started.
    pub fn mouse_down(&mut self, at: Point, zoom: &ZoomState) -> bool {
        if !zoom.is_custom() {
            return false;
        }
        self.drag = Some(Drag {
            origin: at,
            start_offset: zoom.offset(),
        });
        true
    }

    /// Pan target for the current drag position
    pub fn mouse_move(&mut self, at: Point, zoom: &ZoomState) -> Option<Intent> {
        let drag = self.drag?;
        if !zoom.is_custom() {
            self.drag = None;
            return None;
        }
        Some(Intent::PanTo {
            x: drag.start_offset.0 + (at.x - drag.origin.x),
            y: drag.start_offset.1 + (at.y - drag.origin.y),
        })
    }

    pub fn mouse_up(&mut self) {
        self.drag = None;
    }

    /// Click-to-navigate; suppressed while dragging or custom-zoomed
    pub fn click(&self, x: f32, viewer_width: f32, zoom: &ZoomState) -> Option<Intent> {
        if self.is_dragging() || zoom.is_custom() {
            return None;
        }
        horizontal_fraction(x, viewer_width).map(Intent::NavigateAt)
    }

    /// Wheel up zooms in, wheel down zooms out. The caller always
    /// suppresses the default scroll.
    pub fn wheel(&self, delta_y: f32) -> Option<Intent> {
        if delta_y < 0.0 {
            Some(Intent::ZoomIn)
        } else if delta_y > 0.0 {
            Some(Intent::ZoomOut)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom_zoom() -> ZoomState {
        let mut zoom = ZoomState::new();
        zoom.set_custom_scale(2.0);
        zoom.set_offset(10.0, 5.0, None);
        zoom
    }

    #[test]
    fn drag_only_in_custom_zoom() {
        let mut tracker = PointerTracker::new();
        assert!(!tracker.mouse_down(Point::new(0.0, 0.0), &ZoomState::new()));
        assert!(!tracker.is_dragging());
        assert_eq!(tracker.mouse_move(Point::new(5.0, 5.0), &ZoomState::new()), None);
    }

    #[test]
    fn drag_adds_delta_to_starting_offset() {
        let zoom = custom_zoom();
        let mut tracker = PointerTracker::new();
        assert!(tracker.mouse_down(Point::new(100.0, 100.0), &zoom));
        assert_eq!(
            tracker.mouse_move(Point::new(130.0, 90.0), &zoom),
            Some(Intent::PanTo { x: 40.0, y: -5.0 })
        );
        tracker.mouse_up();
        assert_eq!(tracker.mouse_move(Point::new(0.0, 0.0), &zoom), None);
    }

    #[test]
    fn click_suppressed_when_zoomed_or_dragging() {
        let zoom = custom_zoom();
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.click(10.0, 100.0, &zoom), None);

        tracker.mouse_down(Point::new(0.0, 0.0), &zoom);
        assert_eq!(tracker.click(10.0, 100.0, &ZoomState::new()), None);

        tracker.mouse_up();
        assert_eq!(
            tracker.click(25.0, 100.0, &ZoomState::new()),
            Some(Intent::NavigateAt(0.25))
        );
    }

    #[test]
    fn wheel_direction() {
        let tracker = PointerTracker::new();
        assert_eq!(tracker.wheel(-3.0), Some(Intent::ZoomIn));
        assert_eq!(tracker.wheel(3.0), Some(Intent::ZoomOut));
        assert_eq!(tracker.wheel(0.0), None);
    }
}
