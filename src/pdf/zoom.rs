//! Zoom and pan state for page rendering
//!
//! Tracks the active fit policy, the user-chosen scale for custom zoom and
//! the pan offset applied on top of a custom-zoomed page.

/// Policy for deriving the display scale of a page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Whole page visible
    #[default]
    Page,
    /// Page width fills the container
    Width,
    /// Page height fills the container
    Height,
    /// User-chosen absolute scale
    Custom,
}

impl FitMode {
    /// Modes visited by [`ZoomState::cycle_fit_mode`], in order
    pub const CYCLE: [FitMode; 3] = [FitMode::Page, FitMode::Width, FitMode::Height];

    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Page => "page",
            FitMode::Width => "width",
            FitMode::Height => "height",
            FitMode::Custom => "custom",
        }
    }
}

/// Sizes used to bound a pan offset
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanBounds {
    pub container_width: f32,
    pub container_height: f32,
    /// Unscaled page width
    pub page_width: f32,
    /// Unscaled page height
    pub page_height: f32,
}

/// Zoom and pan state for one document session
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomState {
    /// Absolute scale, only meaningful in [`FitMode::Custom`]
    scale: f32,
    fit_mode: FitMode,
    min_scale: f32,
    max_scale: f32,
    /// Pan offset in display pixels, only meaningful in [`FitMode::Custom`]
    offset_x: f32,
    offset_y: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            fit_mode: FitMode::Page,
            min_scale: Self::MIN_SCALE,
            max_scale: Self::MAX_SCALE,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ZoomState {
    /// Multiplier per zoom step
    pub const ZOOM_STEP: f32 = 1.25;
    pub const MIN_SCALE: f32 = 0.1;
    pub const MAX_SCALE: f32 = 5.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn fit_mode(&self) -> FitMode {
        self.fit_mode
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn offset(&self) -> (f32, f32) {
        (self.offset_x, self.offset_y)
    }

    /// True while a user-chosen scale is active (pan and drag enabled)
    pub fn is_custom(&self) -> bool {
        self.fit_mode == FitMode::Custom
    }

    /// Scale that makes a page of the given size fit the container under `fit_mode`.
    ///
    /// [`FitMode::Custom`] returns the stored scale. Degenerate sizes that
    /// would produce a non-finite scale yield 1.0.
    pub fn calculate_fit_scale(
        &self,
        page_width: f32,
        page_height: f32,
        container_width: f32,
        container_height: f32,
        fit_mode: FitMode,
    ) -> f32 {
        let width_scale = container_width / page_width;
        let height_scale = container_height / page_height;
        let scale = match fit_mode {
            FitMode::Width => width_scale,
            FitMode::Height => height_scale,
            FitMode::Page => width_scale.min(height_scale),
            FitMode::Custom => self.scale,
        };
        if scale.is_finite() { scale } else { 1.0 }
    }

    /// Switch fit policy. Offsets reset; fit modes also reset the stored scale.
    pub fn set_fit_mode(&mut self, fit_mode: FitMode) {
        self.fit_mode = fit_mode;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
        if fit_mode != FitMode::Custom {
            self.scale = 1.0;
        }
    }

    /// Set an absolute scale, clamped to bounds, and switch to custom mode
    pub fn set_custom_scale(&mut self, scale: f32) {
        self.scale = self.clamp_scale(scale);
        self.fit_mode = FitMode::Custom;
    }

    /// Zoom in one step relative to what is currently shown.
    ///
    /// Outside custom mode the caller passes the scale the active fit mode
    /// produced; without it 1.0 is assumed.
    pub fn zoom_in(&mut self, current_display_scale: Option<f32>) {
        let base = self.zoom_base(current_display_scale);
        self.apply_zoom(base * Self::ZOOM_STEP);
    }

    /// Zoom out one step, see [`ZoomState::zoom_in`]
    pub fn zoom_out(&mut self, current_display_scale: Option<f32>) {
        let base = self.zoom_base(current_display_scale);
        self.apply_zoom(base / Self::ZOOM_STEP);
    }

    /// Back to whole-page fit with no pan
    pub fn reset_zoom(&mut self) {
        self.fit_mode = FitMode::Page;
        self.scale = 1.0;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Store a pan offset.
    ///
    /// In custom mode with `bounds` the offset is clamped so the page cannot
    /// be dragged past its edges; an axis where the scaled page fits inside
    /// the container is pinned to 0. Otherwise the offset is stored as is.
    pub fn set_offset(&mut self, dx: f32, dy: f32, bounds: Option<PanBounds>) {
        match bounds {
            Some(bounds) if self.is_custom() => {
                let scaled_width = bounds.page_width * self.scale;
                let scaled_height = bounds.page_height * self.scale;
                self.offset_x = clamp_axis(dx, scaled_width, bounds.container_width);
                self.offset_y = clamp_axis(dy, scaled_height, bounds.container_height);
            }
            _ => {
                self.offset_x = dx;
                self.offset_y = dy;
            }
        }
    }

    /// Advance page -> width -> height -> page.
    ///
    /// From custom mode this lands on width, not page. Existing users rely on
    /// that, although it looks like an indexing slip.
    pub fn cycle_fit_mode(&mut self) {
        let next = match Self::position_in_cycle(self.fit_mode) {
            Some(index) => FitMode::CYCLE[(index + 1) % FitMode::CYCLE.len()],
            None => FitMode::CYCLE[1],
        };
        self.set_fit_mode(next);
    }

    fn position_in_cycle(mode: FitMode) -> Option<usize> {
        FitMode::CYCLE.iter().position(|m| *m == mode)
    }

    fn zoom_base(&self, current_display_scale: Option<f32>) -> f32 {
        if self.is_custom() {
            self.scale
        } else {
            current_display_scale
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(1.0)
        }
    }

    fn apply_zoom(&mut self, scale: f32) {
        self.scale = self.clamp_scale(scale);
        self.fit_mode = FitMode::Custom;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Clamp to bounds, handling NaN/Inf
    fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_nan() {
            self.scale
        } else {
            scale.clamp(self.min_scale, self.max_scale)
        }
    }
}

fn clamp_axis(requested: f32, scaled_page: f32, container: f32) -> f32 {
    if scaled_page > container {
        let limit = (scaled_page - container) / 2.0;
        requested.clamp(-limit, limit)
    } else {
        0.0
    }
}
