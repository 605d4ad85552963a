//! Render scheduler - turns view state into raster output for the canvas slots
//!
//! One render pass at a time. A request that arrives while a pass is in
//! flight is dropped, not queued; the owner re-requests once the scheduler is
//! idle if the view has moved on. Before a pass reuses the slots, any task
//! still tracked is cancelled and the pass waits a short grace period.
//! Cancellation is a flag on the task: the engine may keep working, but a
//! cancelled task's output is never copied into a surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, info};

use crate::pdf::{PanBounds, PdfDocument, RenderFault, RenderTask, ZoomState};
use crate::settings::ViewMode;

use super::navigation::{PageLayout, SpreadPages, calculate_spread_pages};
use super::surface::{CanvasSlot, Surface};

/// Wait between cancelling tracked tasks and reusing their slots
pub const GRACE_PERIOD: Duration = Duration::from_millis(10);
/// Space kept free around the page
pub const CONTAINER_MARGIN: f32 = 32.0;
/// Vertical space taken by chrome while the UI is shown
pub const CHROME_VISIBLE: f32 = 120.0;
/// Vertical space kept while the UI is hidden
pub const CHROME_HIDDEN: f32 = 16.0;

pub const RENDER_ERROR_MESSAGE: &str = "Failed to render the PDF";

/// Viewer size and pixel density
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Everything a render pass depends on. Any change means a new pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInputs {
    pub render_page: usize,
    pub layout: PageLayout,
    pub zoom: ZoomState,
    pub viewport: ViewportMetrics,
    pub ui_visible: bool,
}

impl RenderInputs {
    /// Area available to the page(s) after margin and chrome
    pub fn container_size(&self) -> (f32, f32) {
        let chrome = if self.ui_visible {
            CHROME_VISIBLE
        } else {
            CHROME_HIDDEN
        };
        (
            (self.viewport.width - CONTAINER_MARGIN).max(1.0),
            (self.viewport.height - CONTAINER_MARGIN - chrome).max(1.0),
        )
    }

    fn device_pixel_ratio(&self) -> f32 {
        let dpr = self.viewport.device_pixel_ratio;
        if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
    }

    fn slots(&self, num_pages: usize) -> Vec<(CanvasSlot, Option<usize>)> {
        match self.layout.view_mode {
            ViewMode::Single => vec![(
                CanvasSlot::Single,
                SpreadPages::resolve(self.render_page, num_pages),
            )],
            ViewMode::Spread => {
                let pages = calculate_spread_pages(self.render_page, &self.layout);
                vec![
                    (CanvasSlot::Left, SpreadPages::resolve(pages.left, num_pages)),
                    (CanvasSlot::Right, SpreadPages::resolve(pages.right, num_pages)),
                ]
            }
        }
    }
}

/// What [`RenderScheduler::request`] did with a request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A pass is starting (possibly after the grace period)
    Started,
    /// A pass was already in flight
    Dropped,
    /// Nothing to render
    NoDocument,
}

/// How a finished pass ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    /// Superseded; not an error
    Cancelled,
    Failed(String),
}

/// Native page size and the box it was fitted into, for pan clamping
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub container_width: f32,
    pub container_height: f32,
}

impl From<PageGeometry> for PanBounds {
    fn from(g: PageGeometry) -> Self {
        PanBounds {
            container_width: g.container_width,
            container_height: g.container_height,
            page_width: g.page_width,
            page_height: g.page_height,
        }
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Grace {
        until: Instant,
        inputs: RenderInputs,
    },
    Rendering {
        pending: Vec<CanvasSlot>,
        fault: Option<RenderFault>,
    },
}

pub struct RenderScheduler {
    document: Option<Arc<dyn PdfDocument>>,
    phase: Phase,
    /// At most one live task per slot
    tracked: HashMap<CanvasSlot, RenderTask>,
    surfaces: HashMap<CanvasSlot, Surface>,
    error: Option<String>,
    grace: Duration,
    display_scale: Option<f32>,
    geometry: Option<PageGeometry>,
    last_inputs: Option<RenderInputs>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::with_grace_period(GRACE_PERIOD)
    }

    pub fn with_grace_period(grace: Duration) -> Self {
        Self {
            document: None,
            phase: Phase::Idle,
            tracked: HashMap::new(),
            surfaces: HashMap::new(),
            error: None,
            grace,
            display_scale: None,
            geometry: None,
            last_inputs: None,
        }
    }

    /// Swap the document. Outstanding work is cancelled and all slots cleared.
    pub fn set_document(&mut self, document: Option<Arc<dyn PdfDocument>>) {
        self.teardown();
        self.phase = Phase::Idle;
        self.tracked.clear();
        self.surfaces.clear();
        self.error = None;
        self.display_scale = None;
        self.geometry = None;
        self.last_inputs = None;
        self.document = document;
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// True from an accepted request until its pass finishes
    pub fn is_rendering(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn surface(&self, slot: CanvasSlot) -> Option<&Surface> {
        self.surfaces.get(&slot)
    }

    /// Scale the active fit mode produced in the last pass, in CSS pixels per point
    pub fn display_scale(&self) -> Option<f32> {
        self.display_scale
    }

    pub fn page_geometry(&self) -> Option<PageGeometry> {
        self.geometry
    }

    /// Inputs of the most recently started pass
    pub fn last_inputs(&self) -> Option<&RenderInputs> {
        self.last_inputs.as_ref()
    }

    /// When [`RenderScheduler::poll`] next needs to run for a timer
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            Phase::Grace { until, .. } => Some(*until),
            _ => None,
        }
    }

    /// Ask for a pass with `inputs`.
    ///
    /// Tracked tasks are cancelled first. If a pass is already in flight the
    /// request is dropped; the in-flight pass observes its cancelled tasks
    /// and ends without an error.
    pub fn request(&mut self, inputs: RenderInputs, now: Instant) -> RequestOutcome {
        if self.document.is_none() {
            return RequestOutcome::NoDocument;
        }

        let cancelled_any = self.teardown();
        if self.is_rendering() {
            debug!(
                "Render already in flight, dropping request for page {}",
                inputs.render_page
            );
            return RequestOutcome::Dropped;
        }

        self.error = None;
        if cancelled_any {
            self.phase = Phase::Grace {
                until: now + self.grace,
                inputs,
            };
        } else {
            self.start_pass(inputs);
        }
        RequestOutcome::Started
    }

    /// Cancel every tracked task. Returns whether any slot held one.
    pub fn teardown(&mut self) -> bool {
        for task in self.tracked.values() {
            task.cancel();
        }
        !self.tracked.is_empty()
    }

    /// Advance timers and collect finished slot renders.
    ///
    /// Returns the outcome once the current pass ends.
    pub fn poll(&mut self, now: Instant) -> Option<PassOutcome> {
        if let Phase::Grace { until, .. } = &self.phase {
            if now < *until {
                return None;
            }
            let Phase::Grace { inputs, .. } = std::mem::replace(&mut self.phase, Phase::Idle)
            else {
                return None;
            };
            self.tracked.clear();
            self.start_pass(inputs);
        }

        let Phase::Rendering { pending, fault } = &mut self.phase else {
            return None;
        };
        if let Some(fault) = fault.take() {
            return Some(self.finish_with_fault(&fault));
        }

        let mut finished = Vec::new();
        let mut failure = None;
        for slot in pending.iter() {
            let Some(task) = self.tracked.get(slot) else {
                finished.push(*slot);
                continue;
            };
            match task.try_result() {
                None => {}
                Some(Ok(raster)) => {
                    if let Some(surface) = self.surfaces.get_mut(slot) {
                        surface.raster = Some(raster);
                    }
                    finished.push(*slot);
                }
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(fault) = failure {
            return Some(self.finish_with_fault(&fault));
        }

        // finished tasks stay tracked until the next pass replaces them
        pending.retain(|slot| !finished.contains(slot));
        if pending.is_empty() {
            self.phase = Phase::Idle;
            debug!("Render pass complete");
            return Some(PassOutcome::Completed);
        }
        None
    }

    fn finish_with_fault(&mut self, fault: &RenderFault) -> PassOutcome {
        self.teardown();
        self.phase = Phase::Idle;
        if fault.is_cancellation() {
            debug!("Render pass cancelled");
            PassOutcome::Cancelled
        } else {
            error!("Render failed: {fault}");
            self.error = Some(RENDER_ERROR_MESSAGE.to_string());
            PassOutcome::Failed(RENDER_ERROR_MESSAGE.to_string())
        }
    }

    fn start_pass(&mut self, inputs: RenderInputs) {
        let Some(document) = self.document.clone() else {
            self.phase = Phase::Idle;
            return;
        };
        let num_pages = document.num_pages();
        let (container_width, container_height) = inputs.container_size();
        let slots = inputs.slots(num_pages);
        let slot_width = match inputs.layout.view_mode {
            ViewMode::Single => container_width,
            ViewMode::Spread => container_width / 2.0,
        };
        let dpr = inputs.device_pixel_ratio();
        let zoom = &inputs.zoom;
        let translate = if zoom.is_custom() {
            zoom.offset()
        } else {
            (0.0, 0.0)
        };

        info!(
            "Rendering page {} ({}) into {container_width}x{container_height}",
            inputs.render_page,
            inputs.layout.view_mode.as_str()
        );

        let in_use: Vec<CanvasSlot> = slots.iter().map(|(slot, _)| *slot).collect();
        self.surfaces.retain(|slot, _| in_use.contains(slot));

        let mut pending = Vec::new();
        let mut blanks = Vec::new();
        let mut first_geometry = None;
        for (slot, page_number) in slots {
            let Some(page_number) = page_number else {
                blanks.push(slot);
                continue;
            };
            let page = match document.page(page_number) {
                Ok(page) => page,
                Err(fault) => {
                    self.last_inputs = Some(inputs);
                    self.phase = Phase::Rendering {
                        pending,
                        fault: Some(fault),
                    };
                    return;
                }
            };

            let native = page.viewport(1.0);
            let fit_scale = zoom.calculate_fit_scale(
                native.width,
                native.height,
                slot_width,
                container_height,
                zoom.fit_mode(),
            );
            let css_size = (native.width * fit_scale, native.height * fit_scale);
            let viewport = page.viewport(fit_scale * dpr);

            self.surfaces
                .entry(slot)
                .or_default()
                .prepare(page_number, css_size, translate);
            let task = page.render(viewport);
            if let Some(previous) = self.tracked.insert(slot, task) {
                previous.cancel();
            }
            pending.push(slot);

            if first_geometry.is_none() {
                self.display_scale = Some(fit_scale);
                first_geometry = Some(PageGeometry {
                    page_width: native.width,
                    page_height: native.height,
                    container_width: slot_width,
                    container_height,
                });
            }
        }

        // blank slots match the page beside them, or fill the slot box
        let blank_css = first_geometry
            .zip(self.display_scale)
            .map(|(g, scale)| (g.page_width * scale, g.page_height * scale))
            .unwrap_or((slot_width, container_height));
        for slot in blanks {
            let css_size = blank_css;
            let pixel_size = (
                (css_size.0 * dpr).round().max(1.0) as u32,
                (css_size.1 * dpr).round().max(1.0) as u32,
            );
            self.surfaces
                .entry(slot)
                .or_default()
                .fill_blank(css_size, pixel_size);
        }

        if first_geometry.is_some() {
            self.geometry = first_geometry;
        }
        self.last_inputs = Some(inputs);
        self.phase = Phase::Rendering {
            pending,
            fault: None,
        };
    }
}
