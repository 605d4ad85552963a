//! The viewer: settings, navigation, zoom, rendering and chrome wired together
//!
//! All state lives here and changes only through these methods. Time is
//! passed in explicitly; the owner calls [`Viewer::tick`] from its event
//! loop, at the latest by [`Viewer::next_deadline`].

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use image::RgbaImage;
use log::{debug, info};

use crate::inputs::{Intent, KeyContext, Point, PointerTracker, TouchTracker, interpret_key};
use crate::pdf::{DecodeEngine, FitMode, ZoomState};
use crate::settings::{
    KeyValueStore, ReadingDirection, SettingsStore, Theme, ViewMode, ViewSettings,
};

use super::controls::{ControlPosition, NavControl, action_for, navigation_controls};
use super::loader::{DocumentLoader, LoadError, LoadState, LoadedDocument, SelectedFile};
use super::navigation::{Navigator, PageLayout, RENDER_DEBOUNCE, SpreadPages};
use super::scheduler::{
    GRACE_PERIOD, PassOutcome, RenderInputs, RenderScheduler, RequestOutcome, ViewportMetrics,
};
use super::surface::{CanvasSlot, Surface, compose_side_by_side};
use super::visibility::{AUTO_HIDE_DELAY, ActivitySource, UiVisibility};

/// Timings and initial viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    pub render_debounce: Duration,
    pub grace_period: Duration,
    pub auto_hide_delay: Duration,
    pub viewport: ViewportMetrics,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render_debounce: RENDER_DEBOUNCE,
            grace_period: GRACE_PERIOD,
            auto_hide_delay: AUTO_HIDE_DELAY,
            viewport: ViewportMetrics::default(),
        }
    }
}

/// What changed during one [`Viewer::tick`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// New `render_page` after the debounce fired
    pub render_page: Option<usize>,
    pub ui_visibility_changed: bool,
    /// A render pass ended
    pub pass: Option<PassOutcome>,
}

pub struct Viewer<S: KeyValueStore> {
    settings: SettingsStore<S>,
    loader: DocumentLoader,
    navigator: Navigator,
    zoom: ZoomState,
    scheduler: RenderScheduler,
    ui: UiVisibility,
    pointer: PointerTracker,
    touch: TouchTracker,
    viewport: ViewportMetrics,
    fullscreen: bool,
    page_input_focused: bool,
    /// Inputs of the last accepted render request
    requested: Option<RenderInputs>,
}

impl<S: KeyValueStore> Viewer<S> {
    pub fn new(store: S, engine: Box<dyn DecodeEngine>) -> Self {
        Self::with_config(store, engine, ViewerConfig::default())
    }

    pub fn with_config(store: S, engine: Box<dyn DecodeEngine>, config: ViewerConfig) -> Self {
        let settings = SettingsStore::load(store);
        let layout = PageLayout::from(settings.settings());
        Self {
            settings,
            loader: DocumentLoader::new(engine),
            navigator: Navigator::with_debounce(layout, config.render_debounce),
            zoom: ZoomState::new(),
            scheduler: RenderScheduler::with_grace_period(config.grace_period),
            ui: UiVisibility::new(config.auto_hide_delay),
            pointer: PointerTracker::new(),
            touch: TouchTracker::new(),
            viewport: config.viewport,
            fullscreen: false,
            page_input_focused: false,
            requested: None,
        }
    }

    // ---- state ----

    pub fn settings(&self) -> &ViewSettings {
        self.settings.settings()
    }

    pub fn settings_store(&self) -> &SettingsStore<S> {
        &self.settings
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.loader.document()
    }

    pub fn title(&self) -> Option<&str> {
        self.loader.document().map(|d| d.title.as_str())
    }

    pub fn num_pages(&self) -> Option<usize> {
        self.navigator.num_pages()
    }

    pub fn current_page(&self) -> usize {
        self.navigator.current_page()
    }

    pub fn render_page(&self) -> usize {
        self.navigator.render_page()
    }

    pub fn spread_pages(&self) -> SpreadPages {
        self.navigator.spread_pages()
    }

    pub fn zoom(&self) -> &ZoomState {
        &self.zoom
    }

    pub fn is_rendering(&self) -> bool {
        self.scheduler.is_rendering()
    }

    pub fn render_error(&self) -> Option<&str> {
        self.scheduler.error()
    }

    pub fn surface(&self, slot: CanvasSlot) -> Option<&Surface> {
        self.scheduler.surface(slot)
    }

    pub fn controls(&self) -> [NavControl; 4] {
        navigation_controls(&self.navigator)
    }

    pub fn is_ui_visible(&self) -> bool {
        self.ui.is_visible()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn viewport(&self) -> ViewportMetrics {
        self.viewport
    }

    /// Current slot rasters as one image, left slot first
    pub fn snapshot(&self) -> Option<RgbaImage> {
        let slots: &[CanvasSlot] = match self.settings().view_mode {
            ViewMode::Single => &[CanvasSlot::Single],
            ViewMode::Spread => &[CanvasSlot::Left, CanvasSlot::Right],
        };
        let rasters = slots
            .iter()
            .map(|slot| self.scheduler.surface(*slot)?.raster.as_ref())
            .collect::<Option<Vec<_>>>()?;
        compose_side_by_side(&rasters)
    }

    /// Text for the page number field
    pub fn page_indicator(&self) -> String {
        self.navigator.current_page().to_string()
    }

    // ---- documents ----

    /// Load `file`, replacing any open document
    pub fn load_file(&mut self, file: SelectedFile, now: Instant) -> Result<(), LoadError> {
        self.scheduler.set_document(None);
        self.navigator.unload();
        self.zoom.reset_zoom();
        self.requested = None;

        match self.loader.load(file) {
            Ok(doc) => {
                let handle = doc.handle.clone();
                let num_pages = doc.num_pages;
                self.navigator.load_document(num_pages);
                self.scheduler.set_document(Some(handle));
                self.ui.attach(&ActivitySource::ALL, now);
                Ok(())
            }
            Err(e) => {
                self.ui.detach();
                Err(e)
            }
        }
    }

    pub fn clear_document(&mut self) {
        info!("Closing document");
        self.loader.clear();
        self.navigator.unload();
        self.scheduler.set_document(None);
        self.zoom.reset_zoom();
        self.ui.detach();
        self.requested = None;
    }

    // ---- navigation ----

    pub fn go_to_page(&mut self, page: usize, now: Instant) -> Option<usize> {
        self.navigator.handle_page_change(page, now)
    }

    pub fn go_to_next_page(&mut self, now: Instant) -> Option<usize> {
        self.navigator.go_to_next_page(now)
    }

    pub fn go_to_previous_page(&mut self, now: Instant) -> Option<usize> {
        self.navigator.go_to_previous_page(now)
    }

    pub fn go_to_first_page(&mut self, now: Instant) -> Option<usize> {
        self.navigator.go_to_first_page(now)
    }

    pub fn go_to_last_page(&mut self, now: Instant) -> Option<usize> {
        self.navigator.go_to_last_page(now)
    }

    /// Press a navigation button; disabled buttons do nothing
    pub fn activate_control(&mut self, position: ControlPosition, now: Instant) -> Option<usize> {
        let action = action_for(position, self.settings().reading_direction);
        if action.is_noop(&self.navigator) {
            return None;
        }
        action.apply(&mut self.navigator, now)
    }

    /// Parse and apply a typed page number. Rejected input leaves the
    /// indicator on the current page.
    pub fn submit_page_input(&mut self, text: &str, now: Instant) -> bool {
        let Some(num_pages) = self.navigator.num_pages() else {
            return false;
        };
        match text.trim().parse::<usize>() {
            Ok(page) if (1..=num_pages).contains(&page) => {
                self.navigator.handle_page_change(page, now);
                true
            }
            _ => {
                debug!("Ignoring page input {text:?}");
                false
            }
        }
    }

    pub fn set_page_input_focused(&mut self, focused: bool) {
        self.page_input_focused = focused;
    }

    // ---- settings ----

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.settings.set_view_mode(view_mode);
        self.sync_layout();
    }

    pub fn set_reading_direction(&mut self, direction: ReadingDirection) {
        self.settings.set_reading_direction(direction);
        self.sync_layout();
    }

    pub fn set_treat_first_page_as_cover(&mut self, cover: bool) {
        self.settings.set_treat_first_page_as_cover(cover);
        self.sync_layout();
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.set_theme(theme);
    }

    pub fn toggle_view_mode(&mut self) {
        self.settings.toggle_view_mode();
        self.sync_layout();
    }

    pub fn toggle_reading_direction(&mut self) {
        self.settings.toggle_reading_direction();
        self.sync_layout();
    }

    pub fn toggle_treat_first_page_as_cover(&mut self) {
        self.settings.toggle_treat_first_page_as_cover();
        self.sync_layout();
    }

    pub fn reset_settings(&mut self) {
        self.settings.reset_to_defaults();
        self.sync_layout();
    }

    fn sync_layout(&mut self) {
        self.navigator
            .set_layout(PageLayout::from(self.settings.settings()));
    }

    // ---- zoom and pan ----

    /// Fit-mode scale shown right now, the base for stepping out of a fit mode
    fn shown_scale(&self) -> Option<f32> {
        if self.zoom.is_custom() {
            None
        } else {
            self.scheduler.display_scale()
        }
    }

    pub fn zoom_in(&mut self) {
        let shown = self.shown_scale();
        self.zoom.zoom_in(shown);
    }

    pub fn zoom_out(&mut self) {
        let shown = self.shown_scale();
        self.zoom.zoom_out(shown);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom.reset_zoom();
    }

    pub fn set_fit_mode(&mut self, fit_mode: FitMode) {
        self.zoom.set_fit_mode(fit_mode);
    }

    pub fn cycle_fit_mode(&mut self) {
        self.zoom.cycle_fit_mode();
    }

    pub fn set_custom_scale(&mut self, scale: f32) {
        self.zoom.set_custom_scale(scale);
    }

    /// Pan, clamped against the last rendered page and its container
    pub fn pan_to(&mut self, x: f32, y: f32) {
        let bounds = self.scheduler.page_geometry().map(Into::into);
        self.zoom.set_offset(x, y, bounds);
    }

    // ---- chrome ----

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        info!("Fullscreen {}", if self.fullscreen { "on" } else { "off" });
        self.fullscreen
    }

    pub fn show_ui(&mut self, now: Instant) {
        self.ui.show(now);
    }

    pub fn hide_ui(&mut self) {
        self.ui.hide();
    }

    pub fn set_viewport(&mut self, viewport: ViewportMetrics) {
        self.viewport = viewport;
    }

    // ---- raw input ----

    pub fn apply(&mut self, intent: Intent, now: Instant) {
        debug!("Applying {intent:?}");
        match intent {
            Intent::NextPage => {
                self.navigator.go_to_next_page(now);
            }
            Intent::PreviousPage => {
                self.navigator.go_to_previous_page(now);
            }
            Intent::NavigateAt(position) => {
                self.navigator.navigate_click(position, now);
            }
            Intent::ZoomIn => self.zoom_in(),
            Intent::ZoomOut => self.zoom_out(),
            Intent::ToggleFullscreen => {
                self.toggle_fullscreen();
            }
            Intent::PanTo { x, y } => self.pan_to(x, y),
        }
    }

    /// Returns true when the key was recognized
    pub fn handle_key(&mut self, key: &KeyEvent, now: Instant) -> bool {
        self.ui.on_activity(ActivitySource::Key, now);
        let ctx = KeyContext {
            document_loaded: self.navigator.is_loaded(),
            text_input_focused: self.page_input_focused,
            direction: self.settings().reading_direction,
            fullscreen_available: true,
            zoom_available: true,
        };
        match interpret_key(key, &ctx) {
            Some(intent) => {
                self.apply(intent, now);
                true
            }
            None => false,
        }
    }

    pub fn pointer_down(&mut self, at: Point, now: Instant) -> bool {
        self.ui.on_activity(ActivitySource::PointerDown, now);
        self.pointer.mouse_down(at, &self.zoom)
    }

    pub fn pointer_move(&mut self, at: Point, now: Instant) {
        self.ui.on_activity(ActivitySource::PointerMove, now);
        if let Some(intent) = self.pointer.mouse_move(at, &self.zoom) {
            self.apply(intent, now);
        }
    }

    pub fn pointer_up(&mut self) {
        self.pointer.mouse_up();
    }

    /// Click at `x` pixels from the viewer's left edge
    pub fn click(&mut self, x: f32, now: Instant) {
        if let Some(intent) = self.pointer.click(x, self.viewport.width, &self.zoom) {
            self.apply(intent, now);
        }
    }

    pub fn wheel(&mut self, delta_y: f32, now: Instant) {
        self.ui.on_activity(ActivitySource::Wheel, now);
        if let Some(intent) = self.pointer.wheel(delta_y) {
            self.apply(intent, now);
        }
    }

    pub fn touch_start(&mut self, touches: &[Point], now: Instant) {
        self.ui.on_activity(ActivitySource::Touch, now);
        self.touch.touch_start(touches, now, &self.zoom);
    }

    pub fn touch_move(&mut self, touches: &[Point], now: Instant) {
        self.ui.on_activity(ActivitySource::Touch, now);
        if let Some(intent) = self.touch.touch_move(touches, &self.zoom) {
            self.apply(intent, now);
        }
    }

    pub fn touch_end(&mut self, end: Point, now: Instant) {
        let direction = self.settings().reading_direction;
        if let Some(intent) = self
            .touch
            .touch_end(end, now, self.viewport.width, direction)
        {
            self.apply(intent, now);
        }
    }

    // ---- event loop ----

    /// Inputs a render pass would use right now
    pub fn render_inputs(&self) -> RenderInputs {
        RenderInputs {
            render_page: self.navigator.render_page(),
            layout: *self.navigator.layout(),
            zoom: self.zoom.clone(),
            viewport: self.viewport,
            ui_visible: self.ui.is_visible(),
        }
    }

    /// Fire due timers, collect render results and start a pass when the
    /// view no longer matches what was last requested.
    ///
    /// A request dropped because a pass was in flight is retried on a later
    /// tick, once that pass has ended.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport {
            render_page: self.navigator.poll(now),
            ui_visibility_changed: self.ui.tick(now),
            pass: self.scheduler.poll(now),
        };
        // a cancelled pass left its slots empty, whatever the inputs are now
        if report.pass == Some(PassOutcome::Cancelled) {
            self.requested = None;
        }

        let inputs = self.render_inputs();
        if self.requested.as_ref() != Some(&inputs) {
            match self.scheduler.request(inputs.clone(), now) {
                RequestOutcome::Started => {
                    self.requested = Some(inputs);
                    if let Some(outcome) = self.scheduler.poll(now) {
                        report.pass = Some(outcome);
                    }
                }
                RequestOutcome::Dropped | RequestOutcome::NoDocument => {}
            }
        }
        report
    }

    /// Earliest instant at which [`Viewer::tick`] has timer work
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.navigator.next_deadline(),
            self.scheduler.next_deadline(),
            self.ui.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// True when no debounce is pending, no pass is running and the last
    /// pass matches the current view
    pub fn is_settled(&self) -> bool {
        if self.navigator.next_deadline().is_some() || self.scheduler.is_rendering() {
            return false;
        }
        !self.scheduler.has_document() || self.requested.as_ref() == Some(&self.render_inputs())
    }

    /// Stop timers and cancel outstanding renders
    pub fn dispose(&mut self) {
        self.navigator.dispose();
        self.scheduler.teardown();
        self.ui.detach();
    }
}
