//! Cancellable render task handles
//!
//! A [`RenderTask`] is the consumer half of one in-flight raster operation;
//! the engine keeps the matching [`RenderCompletion`]. Cancelling is a flag,
//! not a join: the engine may still finish the work, but a cancelled task
//! only ever reports [`RenderFault::Cancelled`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flume::{Receiver, Sender, TryRecvError};
use image::RgbaImage;

/// Errors from rendering a single page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderFault {
    #[error("rendering cancelled")]
    Cancelled,

    #[error("page {page} out of range 1..={page_count}")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("render engine: {detail}")]
    Engine { detail: String },
}

impl RenderFault {
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine { detail: msg.into() }
    }

    /// Superseded work, not a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Consumer half of an asynchronous page render
#[derive(Debug)]
pub struct RenderTask {
    cancelled: Arc<AtomicBool>,
    result_rx: Receiver<Result<RgbaImage, RenderFault>>,
}

/// Producer half, held by whatever performs the render
#[derive(Debug)]
pub struct RenderCompletion {
    cancelled: Arc<AtomicBool>,
    result_tx: Sender<Result<RgbaImage, RenderFault>>,
}

impl RenderTask {
    /// Create a linked task/completion pair
    #[must_use]
    pub fn channel() -> (RenderTask, RenderCompletion) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (result_tx, result_rx) = flume::bounded(1);
        (
            RenderTask {
                cancelled: Arc::clone(&cancelled),
                result_rx,
            },
            RenderCompletion {
                cancelled,
                result_tx,
            },
        )
    }

    /// A task that has already failed
    #[must_use]
    pub fn failed(fault: RenderFault) -> Self {
        let (task, completion) = Self::channel();
        completion.complete(Err(fault));
        task
    }

    /// Fire-and-forget cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Non-blocking check for the outcome. `None` while still running.
    pub fn try_result(&self) -> Option<Result<RgbaImage, RenderFault>> {
        if self.is_cancelled() {
            return Some(Err(RenderFault::Cancelled));
        }
        match self.result_rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(RenderFault::engine(
                "render task dropped without a result",
            ))),
        }
    }
}

impl RenderCompletion {
    /// Producers check this before starting expensive work
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn complete(self, result: Result<RgbaImage, RenderFault>) {
        let result = if self.is_cancelled() {
            Err(RenderFault::Cancelled)
        } else {
            result
        };
        // Receiver gone means nobody is waiting anymore
        let _ = self.result_tx.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_until_completed() {
        let (task, completion) = RenderTask::channel();
        assert!(task.try_result().is_none());

        completion.complete(Ok(RgbaImage::new(2, 3)));
        let image = task.try_result().unwrap().unwrap();
        assert_eq!(image.dimensions(), (2, 3));
    }

    #[test]
    fn cancelled_task_reports_cancellation_even_after_completion() {
        let (task, completion) = RenderTask::channel();
        task.cancel();
        assert!(completion.is_cancelled());

        completion.complete(Ok(RgbaImage::new(1, 1)));
        assert_eq!(task.try_result(), Some(Err(RenderFault::Cancelled)));
    }

    #[test]
    fn dropped_completion_is_an_engine_fault() {
        let (task, completion) = RenderTask::channel();
        drop(completion);
        let fault = task.try_result().unwrap().unwrap_err();
        assert!(!fault.is_cancellation());
    }

    #[test]
    fn failed_task_surfaces_fault() {
        let task = RenderTask::failed(RenderFault::engine("boom"));
        assert_eq!(task.try_result(), Some(Err(RenderFault::engine("boom"))));
    }
}
