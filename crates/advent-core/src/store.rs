//! Opened-state store.
//!
//! The one piece of persisted state: the set of day numbers whose doors have
//! been revealed, keyed per calendar as `advent_opened_<year>_<month>`. The
//! serialized form is a JSON array of day-number strings -- a set, not a
//! sequence; round-trips preserve membership, never order.
//!
//! Reads are deliberately forgiving: a missing key, corrupt JSON, or an
//! entry outside the calendar range degrades to "not opened" with a log
//! line, never a crash. Writes surface failures as typed errors, but callers
//! keep the in-memory opened state regardless (a later reload may then show
//! the door closed again -- an accepted limitation).

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::CalendarConfig;
use crate::error::StorageError;

/// Prefix shared by every persisted opened-set key. [`OpenedStore::reset`]
/// removes all keys carrying it, historical calendars included.
pub const STORAGE_KEY_PREFIX: &str = "advent_opened_";

/// Durable string key/value store the opened-set lives in.
///
/// The production backend is [`FileBackend`]; tests use [`MemoryBackend`].
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Returns `~/.config/advent-calendar[-dev]/` based on ADVENT_ENV.
///
/// Set ADVENT_ENV=dev to use a separate development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ADVENT_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("advent-calendar-dev")
    } else {
        base_dir.join("advent-calendar")
    };

    std::fs::create_dir_all(&dir).map_err(|err| StorageError::Backend(err.to_string()))?;
    Ok(dir)
}

/// One file per key inside a data directory, `<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open the default per-user backend under [`data_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn open() -> Result<Self, StorageError> {
        Ok(Self { dir: data_dir()? })
    }

    /// Backend rooted at a custom directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path_for(key), value).map_err(|err| StorageError::WriteFailed {
            key: key.to_string(),
            message: err.to_string(),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Backend(err.to_string())),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|err| StorageError::Backend(err.to_string()))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StorageError::Backend(err.to_string()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-memory backend for tests and ephemeral embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: std::collections::BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key, e.g. a historical calendar's opened-set.
    pub fn seed(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// The persisted set of opened day numbers for one calendar.
#[derive(Debug, Clone)]
pub struct OpenedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> OpenedStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Load the opened-set for this calendar's key.
    ///
    /// A missing key or corrupt value yields an empty set. Entries that are
    /// not day numbers within `[start_day, end_day]` are dropped with a
    /// warning -- the store enforces the range invariant the callers of the
    /// original never did.
    pub fn load(&self, config: &CalendarConfig) -> BTreeSet<u32> {
        let key = config.storage_key();
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeSet::new(),
            Err(err) => {
                tracing::warn!(%key, %err, "failed to read opened-set, treating as empty");
                return BTreeSet::new();
            }
        };

        let entries: Vec<String> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(%key, %err, "corrupt opened-set, treating as empty");
                return BTreeSet::new();
            }
        };

        let cfg = config.normalized();
        let mut set = BTreeSet::new();
        for entry in entries {
            match entry.parse::<u32>() {
                Ok(day) if (cfg.start_day..=cfg.end_day).contains(&day) => {
                    set.insert(day);
                }
                _ => {
                    tracing::warn!(%key, %entry, "dropping persisted entry outside calendar range");
                }
            }
        }
        set
    }

    /// Persist the full set for this calendar's key.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&mut self, config: &CalendarConfig, set: &BTreeSet<u32>) -> Result<(), StorageError> {
        let key = config.storage_key();
        let entries: Vec<String> = set.iter().map(u32::to_string).collect();
        let raw = serde_json::to_string(&entries).map_err(|err| StorageError::WriteFailed {
            key: key.clone(),
            message: err.to_string(),
        })?;
        self.backend.set(&key, &raw)
    }

    /// Add `day` to the opened-set (idempotent union).
    ///
    /// Returns `Ok(true)` only when the day was newly inserted; a repeat
    /// open is `Ok(false)` and performs no write.
    ///
    /// # Errors
    ///
    /// Rejects days outside the calendar range; propagates write failures.
    pub fn mark_opened(&mut self, config: &CalendarConfig, day: u32) -> Result<bool, StorageError> {
        let cfg = config.normalized();
        if !(cfg.start_day..=cfg.end_day).contains(&day) {
            return Err(StorageError::DayOutOfRange {
                day,
                start: cfg.start_day,
                end: cfg.end_day,
            });
        }
        let mut set = self.load(config);
        if !set.insert(day) {
            return Ok(false);
        }
        self.save(config, &set)?;
        Ok(true)
    }

    /// Remove only this calendar's key, leaving historical calendars alone.
    ///
    /// # Errors
    ///
    /// Propagates backend removal failures.
    pub fn clear(&mut self, config: &CalendarConfig) -> Result<(), StorageError> {
        self.backend.remove(&config.storage_key())
    }

    /// Remove every key carrying [`STORAGE_KEY_PREFIX`] plus the exact
    /// current key, deduplicated. Historical calendars are cleared too.
    ///
    /// Returns the list of removed keys.
    ///
    /// # Errors
    ///
    /// Propagates backend enumeration or removal failures.
    pub fn reset(&mut self, config: &CalendarConfig) -> Result<Vec<String>, StorageError> {
        let mut to_remove: Vec<String> = self
            .backend
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(STORAGE_KEY_PREFIX))
            .collect();
        let current = config.storage_key();
        if !to_remove.contains(&current) {
            to_remove.push(current);
        }
        for key in &to_remove {
            self.backend.remove(key)?;
        }
        Ok(to_remove)
    }
}
