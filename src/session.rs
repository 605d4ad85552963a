//! Event loop around a [`Viewer`]
//!
//! Feeds keys from an [`EventSource`] into the viewer, ticks it at its
//! deadlines and hands every finished render to a callback.

use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::event_source::{Event, EventSource, KeyCode, KeyEvent};
use crate::reader::{PassOutcome, Viewer};
use crate::settings::KeyValueStore;

/// Longest wait for input when no timer is due
const IDLE_POLL: Duration = Duration::from_millis(50);
/// Sleep step while waiting for a render to settle
const SETTLE_STEP: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionKey {
    Quit,
    Handled,
    Ignored,
}

/// Session bindings on top of the viewer's own keys
fn handle_session_key<S: KeyValueStore>(
    viewer: &mut Viewer<S>,
    key: &KeyEvent,
    now: Instant,
) -> SessionKey {
    if key.kind == crossterm::event::KeyEventKind::Release {
        return SessionKey::Ignored;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return SessionKey::Quit,
        KeyCode::Home => {
            viewer.go_to_first_page(now);
        }
        KeyCode::End => {
            viewer.go_to_last_page(now);
        }
        KeyCode::Char('s') => viewer.toggle_view_mode(),
        KeyCode::Char('d') => viewer.toggle_reading_direction(),
        KeyCode::Char('c') => viewer.toggle_treat_first_page_as_cover(),
        KeyCode::Char('f') => viewer.cycle_fit_mode(),
        KeyCode::Char('0') => viewer.reset_zoom(),
        _ => return SessionKey::Ignored,
    }
    SessionKey::Handled
}

/// Run until the source asks to quit
pub fn run_with_event_source<S: KeyValueStore>(
    viewer: &mut Viewer<S>,
    source: &mut dyn EventSource,
    mut on_render: impl FnMut(&Viewer<S>) -> Result<()>,
) -> Result<()> {
    info!("Interactive session started");
    loop {
        let now = Instant::now();
        match viewer.tick(now).pass {
            Some(PassOutcome::Completed) => on_render(viewer)?,
            Some(PassOutcome::Failed(message)) => warn!("{message}"),
            Some(PassOutcome::Cancelled) | None => {}
        }

        let timeout = viewer
            .next_deadline()
            .map_or(IDLE_POLL, |d| d.saturating_duration_since(now).min(IDLE_POLL));
        if !source.poll(timeout)? {
            continue;
        }

        let Event::Key(key) = source.read()? else {
            continue;
        };
        let now = Instant::now();
        if viewer.handle_key(&key, now) {
            continue;
        }
        match handle_session_key(viewer, &key, now) {
            SessionKey::Quit => break,
            SessionKey::Handled => debug!("Session key {:?}", key.code),
            SessionKey::Ignored => {}
        }
    }
    viewer.dispose();
    info!("Interactive session ended");
    Ok(())
}

/// Tick until the view has settled, returning how the last pass ended
pub fn settle<S: KeyValueStore>(
    viewer: &mut Viewer<S>,
    timeout: Duration,
) -> Result<Option<PassOutcome>> {
    let started = Instant::now();
    let mut last = None;
    loop {
        let now = Instant::now();
        if let Some(outcome) = viewer.tick(now).pass {
            last = Some(outcome);
        }
        if viewer.is_settled() {
            return Ok(last);
        }
        if now.duration_since(started) > timeout {
            bail!("render did not settle within {timeout:?}");
        }
        let wait = viewer
            .next_deadline()
            .map_or(SETTLE_STEP, |d| d.saturating_duration_since(now).min(SETTLE_STEP));
        std::thread::sleep(wait);
    }
}
