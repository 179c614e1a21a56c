//! JSON-based calendar configuration.
//!
//! Three external documents drive the calendar, all optional:
//! - `config.json` -- the [`CalendarConfig`] itself
//! - `layout.json` -- per-door geometry overrides ([`LayoutOverrides`])
//! - `chapters.json` -- optional per-day titles ([`ChapterTitles`])
//!
//! A missing or malformed document is never an error the caller sees: the
//! loaders log a warning and substitute built-in defaults, so a broken file
//! degrades to the stock calendar instead of a blank page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::store::STORAGE_KEY_PREFIX;

/// How door geometry is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Gap-based grid, left-to-right, top-down.
    Sequential,
    /// Free-form placement from overrides, with a simple flow fallback.
    Scattered,
}

/// Calendar configuration.
///
/// Immutable per session. All fields have defaults and unknown fields in the
/// document are ignored, so any subset may be provided. Document keys are
/// camelCase (`monthIndex`, `gridGapPercent`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    #[serde(default = "default_year")]
    pub year: i32,
    /// 0-based month (11 = December).
    #[serde(default = "default_month_index")]
    pub month_index: u32,
    #[serde(default = "default_start_day")]
    pub start_day: u32,
    #[serde(default = "default_end_day")]
    pub end_day: u32,
    #[serde(default = "default_layout_mode")]
    pub layout_mode: LayoutMode,
    #[serde(default = "default_cols")]
    pub cols: u32,
    /// Percent gutter between grid cells (sequential mode).
    #[serde(default = "default_grid_gap")]
    pub grid_gap_percent: f64,
    #[serde(default = "default_audio_path")]
    pub audio_path_prefix: String,
    #[serde(default = "default_file_prefix")]
    pub file_name_prefix: String,
    /// Extensions probed in order when resolving a door's audio file.
    #[serde(default = "default_extensions")]
    pub file_extensions: Vec<String>,
    /// Compare against the local wall clock (true) or UTC (false).
    #[serde(default = "default_true")]
    pub use_local_time: bool,
    /// Clear the persisted opened-state once at construction.
    #[serde(default)]
    pub reset_on_load: bool,
    /// Background display hints, carried for the embedding shell.
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub background_size: Option<String>,
    #[serde(default)]
    pub door_opacity: Option<f64>,
}

// Default functions
fn default_year() -> i32 {
    2025
}
fn default_month_index() -> u32 {
    11
}
fn default_start_day() -> u32 {
    1
}
fn default_end_day() -> u32 {
    24
}
fn default_layout_mode() -> LayoutMode {
    LayoutMode::Sequential
}
fn default_cols() -> u32 {
    6
}
fn default_grid_gap() -> f64 {
    2.0
}
fn default_audio_path() -> String {
    "/audio/".into()
}
fn default_file_prefix() -> String {
    "Kapitel".into()
}
fn default_extensions() -> Vec<String> {
    ["m4a", "mp3", "ogg", "wav"].map(String::from).to_vec()
}
fn default_true() -> bool {
    true
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            month_index: default_month_index(),
            start_day: default_start_day(),
            end_day: default_end_day(),
            layout_mode: default_layout_mode(),
            cols: default_cols(),
            grid_gap_percent: default_grid_gap(),
            audio_path_prefix: default_audio_path(),
            file_name_prefix: default_file_prefix(),
            file_extensions: default_extensions(),
            use_local_time: true,
            reset_on_load: false,
            background_image: Some("assets/bg.jpg".into()),
            background_size: Some("cover".into()),
            door_opacity: Some(0.72),
        }
    }
}

impl CalendarConfig {
    /// Parse from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        parse_json(json)
    }

    /// Load from disk, substituting defaults when the file is missing or
    /// malformed. Never fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        load_json_or_default(path.as_ref(), "calendar config")
    }

    /// Number of doors to render. Always >= 1 after [`Self::normalized`].
    pub fn total_days(&self) -> u32 {
        self.end_day
            .saturating_sub(self.start_day)
            .saturating_add(1)
    }

    /// Key under which this calendar's opened-set is persisted.
    ///
    /// Pure function of `(year, month_index)`, so calendars for different
    /// years or months never collide.
    pub fn storage_key(&self) -> String {
        format!("{}{}_{}", STORAGE_KEY_PREFIX, self.year, self.month_index)
    }

    /// Clamp degenerate values so downstream arithmetic never divides by
    /// zero or iterates an inverted range: `cols >= 1`, `gap >= 0`,
    /// `1 <= start_day <= end_day`.
    pub fn normalized(&self) -> Self {
        let mut cfg = self.clone();
        cfg.cols = cfg.cols.max(1);
        cfg.grid_gap_percent = cfg.grid_gap_percent.max(0.0);
        cfg.start_day = cfg.start_day.max(1);
        cfg.end_day = cfg.end_day.max(cfg.start_day);
        cfg
    }
}

/// Manual geometry for a single door, in percent-of-stage units.
///
/// Any subset of fields may be present; absent fields fall back to the
/// computed value for that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DoorOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl DoorOverride {
    /// Size-only override, positioned by the layout engine.
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

/// Per-door layout overrides, keyed by day number.
///
/// Document shape: `{ "door": { "<day>": { top?, left?, width?, height? } } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOverrides {
    #[serde(default)]
    pub door: BTreeMap<String, DoorOverride>,
}

impl Default for LayoutOverrides {
    /// The stock layout: a handful of doors enlarged, positions computed.
    fn default() -> Self {
        let mut door = BTreeMap::new();
        door.insert("1".to_string(), DoorOverride::sized(14.0, 18.0));
        door.insert("5".to_string(), DoorOverride::sized(16.0, 20.0));
        door.insert("7".to_string(), DoorOverride::sized(18.0, 22.0));
        door.insert("13".to_string(), DoorOverride::sized(16.0, 20.0));
        door.insert("24".to_string(), DoorOverride::sized(20.0, 24.0));
        Self { door }
    }
}

impl LayoutOverrides {
    /// An override set with no entries (every door fully computed).
    pub fn empty() -> Self {
        Self {
            door: BTreeMap::new(),
        }
    }

    /// Parse from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        parse_json(json)
    }

    /// Load from disk, substituting the stock layout when the file is
    /// missing or malformed. Never fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        load_json_or_default(path.as_ref(), "layout overrides")
    }

    pub fn get(&self, day: u32) -> Option<&DoorOverride> {
        self.door.get(&day.to_string())
    }

    pub fn insert(&mut self, day: u32, geometry: DoorOverride) {
        self.door.insert(day.to_string(), geometry);
    }
}

/// Optional chapter titles, keyed by day number.
///
/// Document shape: `{ "<day>": "<title>" }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterTitles(BTreeMap<String, String>);

impl ChapterTitles {
    /// Load from disk, substituting an empty collection when the file is
    /// missing or malformed. Never fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        load_json_or_default(path.as_ref(), "chapter titles")
    }

    /// Parse from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        parse_json(json)
    }

    pub fn get(&self, day: u32) -> Option<&str> {
        self.0.get(&day.to_string()).map(String::as_str)
    }

    pub fn insert(&mut self, day: u32, title: impl Into<String>) {
        self.0.insert(day.to_string(), title.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_json<T: DeserializeOwned>(json: &str) -> Result<T, ConfigError> {
    serde_json::from_str(json).map_err(|err| ConfigError::ParseFailed {
        message: err.to_string(),
    })
}

fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "no {what} document, using defaults");
            return T::default();
        }
    };
    match parse_json(&content) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "malformed {what} document, using defaults");
            T::default()
        }
    }
}
