//! Auto-hiding chrome
//!
//! Activity from an attached source shows the UI and restarts the hide
//! timer. The timer is a deadline checked by [`UiVisibility::tick`].

use std::time::{Duration, Instant};

use log::debug;

/// Delay before the UI hides after the last activity
pub const AUTO_HIDE_DELAY: Duration = Duration::from_secs(3);

/// Kinds of input that count as activity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivitySource {
    PointerMove,
    PointerDown,
    Touch,
    Key,
    Wheel,
}

impl ActivitySource {
    pub const ALL: [ActivitySource; 5] = [
        ActivitySource::PointerMove,
        ActivitySource::PointerDown,
        ActivitySource::Touch,
        ActivitySource::Key,
        ActivitySource::Wheel,
    ];
}

#[derive(Debug, Clone)]
pub struct UiVisibility {
    visible: bool,
    hide_at: Option<Instant>,
    delay: Duration,
    sources: Vec<ActivitySource>,
}

impl Default for UiVisibility {
    fn default() -> Self {
        Self::new(AUTO_HIDE_DELAY)
    }
}

impl UiVisibility {
    /// Starts visible, with no sources attached and no timer running
    pub fn new(delay: Duration) -> Self {
        Self {
            visible: true,
            hide_at: None,
            delay,
            sources: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_attached(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Start listening to `sources`. Replaces any earlier set.
    pub fn attach(&mut self, sources: &[ActivitySource], now: Instant) {
        self.sources = sources.to_vec();
        self.show(now);
    }

    /// Stop listening and stop the timer. The UI stays shown.
    pub fn detach(&mut self) {
        self.sources.clear();
        self.hide_at = None;
        self.visible = true;
    }

    /// Show the UI and restart the hide timer
    pub fn show(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + self.delay);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_at = None;
    }

    /// Feed one input event. Ignored unless the source is attached.
    pub fn on_activity(&mut self, source: ActivitySource, now: Instant) {
        if self.sources.contains(&source) {
            self.show(now);
        }
    }

    /// Hide if the timer ran out. Returns true when visibility changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(at) if now >= at => {
                debug!("Hiding UI after inactivity");
                self.hide();
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_after_inactivity() {
        let start = Instant::now();
        let mut ui = UiVisibility::default();
        ui.attach(&ActivitySource::ALL, start);

        assert!(!ui.tick(start + Duration::from_secs(2)));
        assert!(ui.is_visible());
        assert!(ui.tick(start + Duration::from_secs(3)));
        assert!(!ui.is_visible());
        assert!(!ui.tick(start + Duration::from_secs(10)));
    }

    #[test]
    fn activity_restarts_timer() {
        let start = Instant::now();
        let mut ui = UiVisibility::default();
        ui.attach(&[ActivitySource::PointerMove], start);

        ui.on_activity(ActivitySource::PointerMove, start + Duration::from_secs(2));
        assert!(!ui.tick(start + Duration::from_secs(4)));
        assert!(ui.tick(start + Duration::from_secs(5)));

        ui.on_activity(ActivitySource::PointerMove, start + Duration::from_secs(6));
        assert!(ui.is_visible());
    }

    #[test]
    fn unattached_sources_are_ignored() {
        let start = Instant::now();
        let mut ui = UiVisibility::default();
        ui.attach(&[ActivitySource::Touch], start);
        ui.hide();

        ui.on_activity(ActivitySource::Key, start);
        assert!(!ui.is_visible());
        ui.on_activity(ActivitySource::Touch, start);
        assert!(ui.is_visible());
    }

    #[test]
    fn detach_stops_timer() {
        let start = Instant::now();
        let mut ui = UiVisibility::default();
        ui.attach(&ActivitySource::ALL, start);
        ui.detach();

        assert!(!ui.tick(start + Duration::from_secs(60)));
        assert!(ui.is_visible());
        ui.on_activity(ActivitySource::Key, start);
        assert_eq!(ui.next_deadline(), None);
    }
}
