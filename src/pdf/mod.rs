//! PDF engine contract, render tasks and zoom state

mod engine;
mod request;
#[cfg(feature = "pdf")]
mod worker;
mod zoom;

pub use engine::{DecodeEngine, DecodeError, PdfDocument, PdfPage, Viewport};
pub use request::{RenderCompletion, RenderFault, RenderTask};
#[cfg(feature = "pdf")]
pub use worker::{DEFAULT_WORKERS, MupdfDocument, MupdfEngine};
pub use zoom::*;
