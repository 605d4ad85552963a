use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::settings::ReadingDirection;

use super::Intent;

/// Viewer state that decides which keys are live
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyContext {
    pub document_loaded: bool,
    /// Focus is in a text field (page number input)
    pub text_input_focused: bool,
    pub direction: ReadingDirection,
    pub fullscreen_available: bool,
    pub zoom_available: bool,
}

/// Map a key press to an intent.
///
/// `Some` means the key was recognized and its default action should be
/// suppressed. Arrow keys follow the reading direction: for right-to-left
/// content the left arrow moves forward.
pub fn interpret_key(key: &KeyEvent, ctx: &KeyContext) -> Option<Intent> {
    if !ctx.document_loaded || ctx.text_input_focused {
        return None;
    }
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Left => Some(match ctx.direction {
            ReadingDirection::Rtl => Intent::NextPage,
            ReadingDirection::Ltr => Intent::PreviousPage,
        }),
        KeyCode::Right => Some(match ctx.direction {
            ReadingDirection::Rtl => Intent::PreviousPage,
            ReadingDirection::Ltr => Intent::NextPage,
        }),
        KeyCode::F(11) if ctx.fullscreen_available => Some(Intent::ToggleFullscreen),
        KeyCode::Char('+' | '=') if ctx.zoom_available => Some(Intent::ZoomIn),
        KeyCode::Char('-' | '_') if ctx.zoom_available => Some(Intent::ZoomOut),
        _ => None,
    }
}
