//! Reader core: navigation, render scheduling, loading and chrome

pub mod controls;
pub mod loader;
pub mod navigation;
pub mod scheduler;
pub mod surface;
pub mod viewer;
pub mod visibility;

pub use controls::{ControlPosition, NavAction, NavControl, action_for, navigation_controls};
pub use loader::{
    DocumentLoader, LoadError, LoadState, LoadedDocument, PDF_MEDIA_TYPE, SelectedFile,
};
pub use navigation::{
    Navigator, PageLayout, RENDER_DEBOUNCE, SpreadPages, calculate_spread_pages,
    last_spread_start,
};
pub use scheduler::{
    PassOutcome, RENDER_ERROR_MESSAGE, RenderInputs, RenderScheduler, RequestOutcome,
    ViewportMetrics,
};
pub use surface::{CanvasSlot, Surface, compose_side_by_side};
pub use viewer::{TickReport, Viewer, ViewerConfig};
pub use visibility::{ActivitySource, UiVisibility};
