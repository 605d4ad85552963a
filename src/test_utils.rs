//! In-memory decode engine for tests
//!
//! `FakeEngine` opens any bytes into a `FakeDocument` with fixed page sizes.
//! Renders either complete on the spot or wait for `complete_all`, and every
//! render call is recorded so tests can assert which pages were rasterized
//! at which scale.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use crate::pdf::{
    DecodeEngine, DecodeError, PdfDocument, PdfPage, RenderCompletion, RenderFault, RenderTask,
    Viewport,
};

/// When fake renders deliver their result
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompletionMode {
    #[default]
    Immediate,
    /// Held until [`FakeDocument::complete_all`]
    Manual,
}

#[derive(Default)]
struct RenderLog {
    calls: Vec<(usize, f32)>,
    held: Vec<(RenderCompletion, (u32, u32))>,
}

#[derive(Clone)]
pub struct FakeDocument {
    page_sizes: Vec<(f32, f32)>,
    title: Option<String>,
    mode: CompletionMode,
    failing: HashSet<usize>,
    missing: HashSet<usize>,
    log: Arc<Mutex<RenderLog>>,
}

impl FakeDocument {
    /// `num_pages` pages of the same size in points
    pub fn uniform(num_pages: usize, width: f32, height: f32) -> Self {
        Self::with_sizes(vec![(width, height); num_pages])
    }

    pub fn with_sizes(page_sizes: Vec<(f32, f32)>) -> Self {
        Self {
            page_sizes,
            title: None,
            mode: CompletionMode::Immediate,
            failing: HashSet::new(),
            missing: HashSet::new(),
            log: Arc::new(Mutex::new(RenderLog::default())),
        }
    }

    pub fn with_mode(mut self, mode: CompletionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Rendering this page fails with an engine fault
    pub fn failing_page(mut self, page: usize) -> Self {
        self.failing.insert(page);
        self
    }

    /// Fetching this page's handle fails
    pub fn missing_page(mut self, page: usize) -> Self {
        self.missing.insert(page);
        self
    }

    /// (page, scale) of every render started so far
    pub fn render_calls(&self) -> Vec<(usize, f32)> {
        self.log.lock().unwrap().calls.clone()
    }

    /// Deliver every held render
    pub fn complete_all(&self) {
        let held = std::mem::take(&mut self.log.lock().unwrap().held);
        for (completion, (width, height)) in held {
            completion.complete(Ok(RgbaImage::new(width, height)));
        }
    }

    pub fn held_count(&self) -> usize {
        self.log.lock().unwrap().held.len()
    }
}

impl PdfDocument for FakeDocument {
    fn num_pages(&self) -> usize {
        self.page_sizes.len()
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn page(&self, number: usize) -> Result<Box<dyn PdfPage>, RenderFault> {
        if self.missing.contains(&number) {
            return Err(RenderFault::engine(format!("page {number} is damaged")));
        }
        let size = number
            .checked_sub(1)
            .and_then(|i| self.page_sizes.get(i))
            .copied()
            .ok_or(RenderFault::PageOutOfRange {
                page: number,
                page_count: self.page_sizes.len(),
            })?;
        Ok(Box::new(FakePage {
            number,
            size,
            fails: self.failing.contains(&number),
            mode: self.mode,
            log: Arc::clone(&self.log),
        }))
    }
}

struct FakePage {
    number: usize,
    size: (f32, f32),
    fails: bool,
    mode: CompletionMode,
    log: Arc<Mutex<RenderLog>>,
}

impl PdfPage for FakePage {
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
        let mut log = self.log.lock().unwrap();
        log.calls.push((self.number, viewport.scale));
        if self.fails {
            return RenderTask::failed(RenderFault::engine("fake raster failure"));
        }

        let pixels = viewport.device_size(1.0);
        let (task, completion) = RenderTask::channel();
        match self.mode {
            CompletionMode::Immediate => {
                completion.complete(Ok(RgbaImage::new(pixels.0, pixels.1)));
            }
            CompletionMode::Manual => log.held.push((completion, pixels)),
        }
        task
    }
}

/// Engine that opens every input into clones of one [`FakeDocument`]
#[derive(Clone)]
pub struct FakeEngine {
    document: FakeDocument,
    open_error: Option<String>,
    opens: Arc<Mutex<usize>>,
}

impl FakeEngine {
    /// Letter-ish pages, renders complete immediately
    pub fn new(num_pages: usize) -> Self {
        Self::with_document(FakeDocument::uniform(num_pages, 600.0, 900.0))
    }

    pub fn with_document(document: FakeDocument) -> Self {
        Self {
            document,
            open_error: None,
            opens: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.document = self.document.with_title(title);
        self
    }

    /// Every open fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.open_error = Some(message.to_string());
        self
    }

    /// Shares render log and held renders with every opened handle
    pub fn document(&self) -> &FakeDocument {
        &self.document
    }

    pub fn open_count(&self) -> usize {
        *self.opens.lock().unwrap()
    }
}

impl DecodeEngine for FakeEngine {
    fn open(&self, _bytes: Vec<u8>) -> Result<Arc<dyn PdfDocument>, DecodeError> {
        *self.opens.lock().unwrap() += 1;
        if let Some(message) = &self.open_error {
            return Err(DecodeError::new(message.clone()));
        }
        Ok(Arc::new(self.document.clone()))
    }
}

pub mod test_helpers {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    use crate::reader::{PDF_MEDIA_TYPE, SelectedFile};

    /// A plain key press
    pub fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::empty(),
            kind: KeyEventKind::Press,
            state: KeyEventState::empty(),
        }
    }

    pub fn char_key(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    /// A small file declared as PDF
    pub fn pdf_file(name: &str) -> SelectedFile {
        SelectedFile::new(name, PDF_MEDIA_TYPE, b"%PDF-1.7\n%%EOF".to_vec())
    }
}
