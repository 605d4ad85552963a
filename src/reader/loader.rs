//! Document loading
//!
//! Validates the selected file, hands its bytes to the decode engine and
//! keeps the user-facing load state. Engine errors never escape: they are
//! classified into a fixed message stored in [`LoadState::error`].

use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};

use crate::pdf::{DecodeEngine, DecodeError, PdfDocument};

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Progress reported once the file bytes are in memory
const PROGRESS_BYTES_READ: u8 = 50;
const PROGRESS_DONE: u8 = 100;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadState {
    pub is_loading: bool,
    pub is_loaded: bool,
    pub error: Option<String>,
    /// 0..=100
    pub progress: u8,
}

impl LoadState {
    fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    fn failed(error: &LoadError) -> Self {
        Self {
            error: Some(error.user_message()),
            ..Self::default()
        }
    }

    fn loaded() -> Self {
        Self {
            is_loaded: true,
            progress: PROGRESS_DONE,
            ..Self::default()
        }
    }
}

/// A file chosen through a picker or dropped on the viewer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared media type
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk; the media type comes from the extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        let media_type = if is_pdf {
            PDF_MEDIA_TYPE
        } else {
            "application/octet-stream"
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type == PDF_MEDIA_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("Please select a PDF file")]
    InvalidFileType,

    #[error("Invalid PDF file")]
    InvalidPdf,

    #[error("Encrypted PDFs are not supported")]
    Encrypted,

    #[error("A network error occurred")]
    Network,

    #[error("Failed to load the PDF file")]
    Generic,
}

impl LoadError {
    /// Map an engine error onto a user-facing class by its message text
    pub fn classify(err: &DecodeError) -> Self {
        let message = err.message.to_lowercase();
        if message.contains("invalid pdf") {
            LoadError::InvalidPdf
        } else if message.contains("encrypted") || message.contains("password") {
            LoadError::Encrypted
        } else if message.contains("network") {
            LoadError::Network
        } else {
            LoadError::Generic
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// An opened document and what the viewer shows about it
#[derive(Clone)]
pub struct LoadedDocument {
    pub handle: Arc<dyn PdfDocument>,
    pub num_pages: usize,
    /// Metadata title, else the file name
    pub title: String,
}

impl std::fmt::Debug for LoadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedDocument")
            .field("num_pages", &self.num_pages)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

pub struct DocumentLoader {
    engine: Box<dyn DecodeEngine>,
    state: LoadState,
    document: Option<LoadedDocument>,
}

impl DocumentLoader {
    pub fn new(engine: Box<dyn DecodeEngine>) -> Self {
        Self {
            engine,
            state: LoadState::default(),
            document: None,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    pub fn load(&mut self, file: SelectedFile) -> Result<&LoadedDocument, LoadError> {
        self.load_with_progress(file, |_| {})
    }

    /// Replace the current document with `file`.
    ///
    /// `on_progress` sees every intermediate state. A file of the wrong type
    /// is rejected before the engine is touched and never enters loading.
    pub fn load_with_progress(
        &mut self,
        file: SelectedFile,
        mut on_progress: impl FnMut(&LoadState),
    ) -> Result<&LoadedDocument, LoadError> {
        self.document = None;

        if !file.is_pdf() {
            warn!(
                "Rejected {} with media type {:?}",
                file.name, file.media_type
            );
            return Err(self.fail(LoadError::InvalidFileType, &mut on_progress));
        }

        self.state = LoadState::loading();
        on_progress(&self.state);

        self.state.progress = PROGRESS_BYTES_READ;
        on_progress(&self.state);

        let handle = match self.engine.open(file.bytes) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to open {}: {e}", file.name);
                return Err(self.fail(LoadError::classify(&e), &mut on_progress));
            }
        };

        let title = handle
            .title()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(file.name);
        let num_pages = handle.num_pages();
        info!("Loaded \"{title}\" with {num_pages} pages");

        self.state = LoadState::loaded();
        on_progress(&self.state);
        Ok(self.document.insert(LoadedDocument {
            handle,
            num_pages,
            title,
        }))
    }

    /// Forget the document and reset the load state
    pub fn clear(&mut self) {
        self.document = None;
        self.state = LoadState::default();
    }

    fn fail(&mut self, error: LoadError, on_progress: &mut impl FnMut(&LoadState)) -> LoadError {
        self.state = LoadState::failed(&error);
        on_progress(&self.state);
        error
    }
}
