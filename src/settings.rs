//! Persisted view preferences
//!
//! Settings are stored as a single JSON object under one fixed key of a
//! [`KeyValueStore`]. Missing fields fall back to defaults, unknown fields are
//! carried through load/save round-trips untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const STORAGE_KEY: &str = "manga-pdf-viewer-settings";
const STORE_FILENAME: &str = "storage.json";
const APP_NAME: &str = "mangaview";

/// Page layout: one page at a time or two pages side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Single,
    Spread,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Single => ViewMode::Spread,
            ViewMode::Spread => ViewMode::Single,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Single => "Single",
            ViewMode::Spread => "Spread",
        }
    }
}

/// Logical page order. Manga is usually right-to-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadingDirection {
    #[default]
    Rtl,
    Ltr,
}

impl ReadingDirection {
    pub fn toggled(self) -> Self {
        match self {
            ReadingDirection::Rtl => ReadingDirection::Ltr,
            ReadingDirection::Ltr => ReadingDirection::Rtl,
        }
    }

    pub fn is_rtl(self) -> bool {
        self == ReadingDirection::Rtl
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    #[serde(default)]
    pub view_mode: ViewMode,

    #[serde(default)]
    pub reading_direction: ReadingDirection,

    #[serde(default)]
    pub theme: Theme,

    /// Page 1 is never paired with another page in spread mode
    #[serde(default = "default_true")]
    pub treat_first_page_as_cover: bool,

    /// Fields written by other versions, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            reading_direction: ReadingDirection::default(),
            theme: Theme::default(),
            treat_first_page_as_cover: true,
            extra: Map::new(),
        }
    }
}

/// Partial update applied by [`SettingsStore::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub view_mode: Option<ViewMode>,
    pub reading_direction: Option<ReadingDirection>,
    pub theme: Option<Theme>,
    pub treat_first_page_as_cover: Option<bool>,
}

impl ViewSettings {
    fn merged(&self, patch: SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(mode) = patch.view_mode {
            next.view_mode = mode;
        }
        if let Some(direction) = patch.reading_direction {
            next.reading_direction = direction;
        }
        if let Some(theme) = patch.theme {
            next.theme = theme;
        }
        if let Some(cover) = patch.treat_first_page_as_cover {
            next.treat_first_page_as_cover = cover;
        }
        next
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store, modelled on browser local storage
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store, used by tests and when no config directory exists
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.items.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a JSON object file, one entry per key
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the platform config directory, if there is one
    pub fn in_config_dir() -> Option<Self> {
        dirs::config_dir().map(|config| Self::new(config.join(APP_NAME).join(STORE_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let items = self.read_all()?;
        Ok(items.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // A corrupt file is replaced; an I/O failure keeps the file as it is
        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(StoreError::Format(e)) => {
                warn!("Discarding corrupt storage file {:?}: {e}", self.path);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        items.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&items)?)?;
        debug!("Saved storage to {:?}", self.path);
        Ok(())
    }
}

/// Owns the current [`ViewSettings`] and persists every mutation
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    settings: ViewSettings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Load settings from `store`, falling back to defaults
    pub fn load(store: S) -> Self {
        let settings = load_settings(&store);
        Self { store, settings }
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Merge `patch` into the current settings and persist the result.
    ///
    /// Persistence failures are logged; the in-memory state is updated anyway.
    pub fn update(&mut self, patch: SettingsPatch) -> &ViewSettings {
        self.settings = self.settings.merged(patch);
        self.persist();
        &self.settings
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> &ViewSettings {
        self.update(SettingsPatch {
            view_mode: Some(view_mode),
            ..SettingsPatch::default()
        })
    }

    pub fn set_reading_direction(&mut self, direction: ReadingDirection) -> &ViewSettings {
        self.update(SettingsPatch {
            reading_direction: Some(direction),
            ..SettingsPatch::default()
        })
    }

    pub fn set_theme(&mut self, theme: Theme) -> &ViewSettings {
        self.update(SettingsPatch {
            theme: Some(theme),
            ..SettingsPatch::default()
        })
    }

    pub fn set_treat_first_page_as_cover(&mut self, cover: bool) -> &ViewSettings {
        self.update(SettingsPatch {
            treat_first_page_as_cover: Some(cover),
            ..SettingsPatch::default()
        })
    }

    pub fn toggle_view_mode(&mut self) -> &ViewSettings {
        let next = self.settings.view_mode.toggled();
        self.set_view_mode(next)
    }

    pub fn toggle_reading_direction(&mut self) -> &ViewSettings {
        let next = self.settings.reading_direction.toggled();
        self.set_reading_direction(next)
    }

    pub fn toggle_treat_first_page_as_cover(&mut self) -> &ViewSettings {
        let next = !self.settings.treat_first_page_as_cover;
        self.set_treat_first_page_as_cover(next)
    }

    /// Restore and persist the default object verbatim
    pub fn reset_to_defaults(&mut self) -> &ViewSettings {
        info!("Resetting settings to defaults");
        self.settings = ViewSettings::default();
        self.persist();
        &self.settings
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.settings) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize settings: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set_item(STORAGE_KEY, &json) {
            warn!("Failed to save settings: {e}");
        }
    }
}

fn load_settings(store: &impl KeyValueStore) -> ViewSettings {
    let raw = match store.get_item(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No stored settings, using defaults");
            return ViewSettings::default();
        }
        Err(e) => {
            warn!("Failed to read settings: {e}");
            return ViewSettings::default();
        }
    };

    match serde_json::from_str::<ViewSettings>(&raw) {
        Ok(settings) => {
            debug!("Loaded settings: {settings:?}");
            settings
        }
        Err(e) => {
            warn!("Failed to parse stored settings, using defaults: {e}");
            ViewSettings::default()
        }
    }
}
