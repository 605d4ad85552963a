//! Touch gestures: tap, swipe, pinch and one-finger pan
//!
//! Pinch is continuous. Every move compares the finger distance with the
//! previous sample and zooms one step when it changed by more than 2%.

use std::time::{Duration, Instant};

use crate::pdf::ZoomState;
use crate::settings::ReadingDirection;

use super::{Intent, Point, horizontal_fraction};

/// Most a finger may travel and still count as a tap
pub const TAP_MAX_DISTANCE: f32 = 10.0;
pub const TAP_MAX_DURATION: Duration = Duration::from_millis(300);
/// Least horizontal travel for a swipe
pub const SWIPE_MIN_DISTANCE: f32 = 50.0;
/// Relative distance change per sample that triggers a pinch zoom step
const PINCH_STEP: f32 = 0.02;

#[derive(Clone, Copy, Debug)]
struct Pinch {
    initial_distance: f32,
    last_ratio: f32,
}

#[derive(Debug, Default)]
pub struct TouchTracker {
    start: Option<(Point, Instant)>,
    pan: Option<(Point, (f32, f32))>,
    pinch: Option<Pinch>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// `touches` holds every finger currently down
    pub fn touch_start(&mut self, touches: &[Point], now: Instant, zoom: &ZoomState) {
        match touches {
            [finger] => {
                self.start = Some((*finger, now));
                self.pinch = None;
                self.pan = zoom.is_custom().then(|| (*finger, zoom.offset()));
            }
            [a, b, ..] => {
                self.pinch = Some(Pinch {
                    initial_distance: a.distance_to(*b),
                    last_ratio: 1.0,
                });
                self.start = None;
                self.pan = None;
            }
            [] => {}
        }
    }

    pub fn touch_move(&mut self, touches: &[Point], zoom: &ZoomState) -> Option<Intent> {
        match touches {
            [a, b, ..] => {
                let pinch = self.pinch.as_mut()?;
                if pinch.initial_distance <= 0.0 {
                    return None;
                }
                let ratio = a.distance_to(*b) / pinch.initial_distance;
                let change = ratio / pinch.last_ratio;
                pinch.last_ratio = ratio;
                if change > 1.0 + PINCH_STEP {
                    Some(Intent::ZoomIn)
                } else if change < 1.0 - PINCH_STEP {
                    Some(Intent::ZoomOut)
                } else {
                    None
                }
            }
            [finger] if zoom.is_custom() => {
                let (origin, offset) = self.pan?;
                Some(Intent::PanTo {
                    x: offset.0 + (finger.x - origin.x),
                    y: offset.1 + (finger.y - origin.y),
                })
            }
            _ => None,
        }
    }

    /// Finish a gesture where the last finger lifted at `end`.
    ///
    /// A short, still touch is a tap and navigates by position. A long
    /// horizontal movement is a swipe, unless the finger was panning a
    /// zoomed page.
    pub fn touch_end(
        &mut self,
        end: Point,
        now: Instant,
        viewer_width: f32,
        direction: ReadingDirection,
    ) -> Option<Intent> {
        if self.pinch.take().is_some() {
            self.start = None;
            self.pan = None;
            return None;
        }
        let panning = self.pan.take().is_some();
        let (origin, started) = self.start.take()?;

        let dx = end.x - origin.x;
        let dy = end.y - origin.y;
        let elapsed = now.saturating_duration_since(started);

        if origin.distance_to(end) < TAP_MAX_DISTANCE && elapsed < TAP_MAX_DURATION {
            return horizontal_fraction(end.x, viewer_width).map(Intent::NavigateAt);
        }
        if panning {
            return None;
        }
        if dx.abs() > SWIPE_MIN_DISTANCE && dx.abs() > dy.abs() {
            // finger moving right reveals what is to the left
            let forward = (dx > 0.0) == direction.is_rtl();
            return Some(if forward {
                Intent::NextPage
            } else {
                Intent::PreviousPage
            });
        }
        None
    }
}
