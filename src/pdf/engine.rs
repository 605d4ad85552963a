//! Decode engine contract
//!
//! The viewer core never decodes PDF data itself. It talks to an engine
//! through these traits: open bytes into a document, fetch a page, ask for
//! its viewport at a scale and start a cancellable render.

use std::sync::Arc;

use super::request::{RenderFault, RenderTask};

/// Page dimensions at a given scale, in CSS pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Viewport {
    /// Backing-store size in device pixels for `device_pixel_ratio`
    pub fn device_size(&self, device_pixel_ratio: f32) -> (u32, u32) {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        (
            (self.width * dpr).round().max(1.0) as u32,
            (self.height * dpr).round().max(1.0) as u32,
        )
    }
}

/// Failure reported by [`DecodeEngine::open`]; classified by message text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait DecodeEngine {
    fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn PdfDocument>, DecodeError>;
}

/// An opened document. Pages are numbered from 1.
pub trait PdfDocument: Send + Sync {
    fn num_pages(&self) -> usize;

    /// Title from document metadata, if any
    fn title(&self) -> Option<String> {
        None
    }

    fn page(&self, number: usize) -> Result<Box<dyn PdfPage>, RenderFault>;
}

pub trait PdfPage {
    fn number(&self) -> usize;

    fn viewport(&self, scale: f32) -> Viewport;

    /// Start rasterizing at `viewport.scale`. Completion is observed through
    /// the returned task.
    fn render(&self, viewport: Viewport) -> RenderTask;
}
