//! mupdf-backed decode engine - renders on worker thread(s)
//!
//! mupdf documents are not shareable across threads, so every worker opens
//! its own copy from the same bytes and pulls jobs from a shared queue.

use std::sync::Arc;

use flume::{Receiver, Sender};
use image::RgbaImage;
use log::{debug, error, info};
use mupdf::{Colorspace, Document, Matrix, MetadataName, Pixmap};

use super::engine::{DecodeEngine, DecodeError, PdfDocument, PdfPage, Viewport};
use super::request::{RenderCompletion, RenderFault, RenderTask};

const PDF_MAGIC: &str = "application/pdf";
pub const DEFAULT_WORKERS: usize = 2;

/// One queued raster job
struct RasterJob {
    page: usize,
    scale: f32,
    completion: RenderCompletion,
}

/// Opens documents with mupdf
#[derive(Debug, Clone)]
pub struct MupdfEngine {
    workers: usize,
}

impl Default for MupdfEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

impl MupdfEngine {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

impl DecodeEngine for MupdfEngine {
    fn open(&self, bytes: Vec<u8>) -> Result<Arc<dyn PdfDocument>, DecodeError> {
        let doc = Document::from_bytes(&bytes, PDF_MAGIC)
            .map_err(|e| DecodeError::new(format!("Invalid PDF structure: {e}")))?;

        if doc.needs_password().unwrap_or(false) {
            return Err(DecodeError::new("Encrypted document: password required"));
        }

        let page_count = doc
            .page_count()
            .map_err(|e| DecodeError::new(format!("Invalid PDF page tree: {e}")))?;
        if page_count <= 0 {
            return Err(DecodeError::new("Invalid PDF: document has no pages"));
        }

        let mut page_sizes = Vec::with_capacity(page_count as usize);
        for index in 0..page_count {
            let bounds = doc
                .load_page(index)
                .and_then(|page| page.bounds())
                .map_err(|e| DecodeError::new(format!("Invalid PDF page {}: {e}", index + 1)))?;
            page_sizes.push((bounds.x1 - bounds.x0, bounds.y1 - bounds.y0));
        }

        let title = doc
            .metadata(MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty());

        info!(
            "Opened PDF: {page_count} pages, title {title:?}, {} workers",
            self.workers
        );
        Ok(Arc::new(MupdfDocument::spawn(
            Arc::new(bytes),
            page_sizes,
            title,
            self.workers,
        )))
    }
}

/// Document handle shared with the viewer; dropping it stops the workers
pub struct MupdfDocument {
    page_sizes: Vec<(f32, f32)>,
    title: Option<String>,
    job_tx: Sender<RasterJob>,
}

impl MupdfDocument {
    fn spawn(
        bytes: Arc<Vec<u8>>,
        page_sizes: Vec<(f32, f32)>,
        title: Option<String>,
        workers: usize,
    ) -> Self {
        // MPMC queue: every worker pulls from the same receiver
        let (job_tx, job_rx) = flume::unbounded();
        for _ in 0..workers {
            let bytes = Arc::clone(&bytes);
            let rx = job_rx.clone();
            std::thread::spawn(move || raster_worker(&bytes, rx));
        }
        Self {
            page_sizes,
            title,
            job_tx,
        }
    }
}

impl PdfDocument for MupdfDocument {
    fn num_pages(&self) -> usize {
        self.page_sizes.len()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn page(&self, number: usize) -> Result<Box<dyn PdfPage>, RenderFault> {
        let size = number
            .checked_sub(1)
            .and_then(|index| self.page_sizes.get(index))
            .copied()
            .ok_or(RenderFault::PageOutOfRange {
                page: number,
                page_count: self.page_sizes.len(),
            })?;
        Ok(Box::new(MupdfPage {
            number,
            size,
            job_tx: self.job_tx.clone(),
        }))
    }
}

struct MupdfPage {
    number: usize,
    size: (f32, f32),
    job_tx: Sender<RasterJob>,
}

impl PdfPage for MupdfPage {
    fn number(&self) -> usize {
        self.number
    }

    fn viewport(&self, scale: f32) -> Viewport {
        Viewport {
            width: self.size.0 * scale,
            height: self.size.1 * scale,
            scale,
        }
    }

    fn render(&self, viewport: Viewport) -> RenderTask {
        let (task, completion) = RenderTask::channel();
        let job = RasterJob {
            page: self.number,
            scale: viewport.scale,
            completion,
        };
        if let Err(flume::SendError(job)) = self.job_tx.send(job) {
            job.completion
                .complete(Err(RenderFault::engine("render workers stopped")));
        }
        task
    }
}

/// Worker loop - runs until every document handle is dropped
#[expect(
    clippy::needless_pass_by_value,
    reason = "Receiver moved into thread, need ownership"
)]
fn raster_worker(bytes: &[u8], jobs: Receiver<RasterJob>) {
    let doc = match Document::from_bytes(bytes, PDF_MAGIC) {
        Ok(d) => d,
        Err(e) => {
            error!("Render worker could not open document: {e}");
            for job in jobs {
                job.completion
                    .complete(Err(RenderFault::engine(format!("document unavailable: {e}"))));
            }
            return;
        }
    };

    for job in jobs {
        if job.completion.is_cancelled() {
            debug!("Skipping cancelled render of page {}", job.page);
            job.completion.complete(Err(RenderFault::Cancelled));
            continue;
        }
        let result = render_page(&doc, job.page, job.scale);
        job.completion.complete(result);
    }
}

/// Rasterize one page (1-based) at `scale`
fn render_page(doc: &Document, page_num: usize, scale: f32) -> Result<RgbaImage, RenderFault> {
    let index = i32::try_from(page_num.saturating_sub(1))
        .map_err(|_| RenderFault::engine(format!("page index {page_num} too large")))?;
    let page = doc
        .load_page(index)
        .map_err(|e| RenderFault::engine(e.to_string()))?;

    let transform = Matrix::new_scale(scale, scale);
    let rgb = Colorspace::device_rgb();
    let pixmap = page
        .to_pixmap(&transform, &rgb, false, false)
        .map_err(|e| RenderFault::engine(e.to_string()))?;

    pixmap_to_rgba(&pixmap)
}

fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RgbaImage, RenderFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderFault::engine(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(height);
    if samples.len() < expected_min || row_bytes > stride {
        return Err(RenderFault::engine("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        for px in row.chunks_exact(n) {
            out.extend_from_slice(&px[..3]);
            out.push(if n > 3 { px[3] } else { 0xFF });
        }
    }

    RgbaImage::from_raw(pixmap.width(), pixmap.height(), out)
        .ok_or_else(|| RenderFault::engine("Pixmap buffer size mismatch"))
}
