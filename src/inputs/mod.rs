//! Gesture and key interpretation
//!
//! Raw input becomes an [`Intent`]; the viewer decides what the intent does.

pub mod keyboard;
pub mod pointer;
pub mod touch;

pub use keyboard::{KeyContext, interpret_key};
pub use pointer::PointerTracker;
pub use touch::TouchTracker;

/// What a recognized gesture asks the viewer to do
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intent {
    NextPage,
    PreviousPage,
    /// Click or tap at a horizontal position, 0.0 (left) to 1.0 (right)
    NavigateAt(f32),
    ZoomIn,
    ZoomOut,
    ToggleFullscreen,
    /// Absolute pan offset in display pixels
    PanTo { x: f32, y: f32 },
}

/// Position in viewer pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Normalized horizontal position inside a viewer `width` pixels wide
pub(crate) fn horizontal_fraction(x: f32, width: f32) -> Option<f32> {
    if width > 0.0 && width.is_finite() {
        Some((x / width).clamp(0.0, 1.0))
    } else {
        None
    }
}
