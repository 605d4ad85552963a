//! Navigation button bar
//!
//! The four buttons keep a fixed left-to-right layout (first, previous,
//! next, last). For right-to-left content the logical targets swap, so the
//! leftmost button goes to the last page and "previous" goes forward.

use std::time::Instant;

use crate::settings::ReadingDirection;

use super::navigation::Navigator;

/// Physical button position, left to right
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlPosition {
    First,
    Previous,
    Next,
    Last,
}

impl ControlPosition {
    pub const ALL: [ControlPosition; 4] = [
        ControlPosition::First,
        ControlPosition::Previous,
        ControlPosition::Next,
        ControlPosition::Last,
    ];
}

/// Logical navigation a button triggers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavAction {
    FirstPage,
    PreviousPage,
    NextPage,
    LastPage,
}

impl NavAction {
    pub fn title(self) -> &'static str {
        match self {
            NavAction::FirstPage => "First page",
            NavAction::PreviousPage => "Previous page",
            NavAction::NextPage => "Next page",
            NavAction::LastPage => "Last page",
        }
    }

    fn is_backward(self) -> bool {
        matches!(self, NavAction::FirstPage | NavAction::PreviousPage)
    }

    pub fn apply(self, navigator: &mut Navigator, now: Instant) -> Option<usize> {
        match self {
            NavAction::FirstPage => navigator.go_to_first_page(now),
            NavAction::PreviousPage => navigator.go_to_previous_page(now),
            NavAction::NextPage => navigator.go_to_next_page(now),
            NavAction::LastPage => navigator.go_to_last_page(now),
        }
    }

    /// True when the action would leave the current page unchanged
    pub fn is_noop(self, navigator: &Navigator) -> bool {
        let Some(last) = navigator.last_page_target() else {
            return true;
        };
        let current = navigator.current_page();
        if self.is_backward() {
            current <= 1
        } else {
            current >= last
        }
    }
}

/// The action bound to a button position for a reading direction
pub fn action_for(position: ControlPosition, direction: ReadingDirection) -> NavAction {
    match (direction, position) {
        (ReadingDirection::Ltr, ControlPosition::First) => NavAction::FirstPage,
        (ReadingDirection::Ltr, ControlPosition::Previous) => NavAction::PreviousPage,
        (ReadingDirection::Ltr, ControlPosition::Next) => NavAction::NextPage,
        (ReadingDirection::Ltr, ControlPosition::Last) => NavAction::LastPage,
        (ReadingDirection::Rtl, ControlPosition::First) => NavAction::LastPage,
        (ReadingDirection::Rtl, ControlPosition::Previous) => NavAction::NextPage,
        (ReadingDirection::Rtl, ControlPosition::Next) => NavAction::PreviousPage,
        (ReadingDirection::Rtl, ControlPosition::Last) => NavAction::FirstPage,
    }
}

/// One rendered button
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavControl {
    pub position: ControlPosition,
    pub action: NavAction,
    pub title: &'static str,
    pub disabled: bool,
}

/// Buttons in display order for the navigator's current state
pub fn navigation_controls(navigator: &Navigator) -> [NavControl; 4] {
    let direction = navigator.layout().reading_direction;
    ControlPosition::ALL.map(|position| {
        let action = action_for(position, direction);
        NavControl {
            position,
            action,
            title: action.title(),
            disabled: action.is_noop(navigator),
        }
    })
}
