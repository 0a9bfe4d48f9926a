//! Durable lookup history backed by a single JSON file
//!
//! The file holds a JSON array of entries, oldest first:
//!
//! ```json
//! [ { "timestamp": "2026-01-05T09:30:00.000000+00:00", "vin": "...", "data": { ... } } ]
//! ```
//!
//! Every mutation rewrites the whole array. Writes go to a temporary file in
//! the same directory which is then renamed over the old one, so an interrupted
//! write leaves either the old or the new content on disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::data::VehicleRecord;

/// Default history file name, relative to the working directory
pub const DEFAULT_HISTORY_FILE: &str = "autolookup_history.json";

/// Errors from history mutations
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file could not be written; the previous file is intact
    #[error("failed to save history to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A 1-based entry number outside the history
    #[error("no history entry #{index} (history has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One successful lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the lookup completed, ISO-8601
    #[serde(default, deserialize_with = "lenient::text")]
    pub timestamp: String,
    /// VIN the lookup was for; older files may lack it
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub vin: Option<String>,
    #[serde(default, deserialize_with = "lenient::record")]
    pub data: VehicleRecord,
}

impl HistoryEntry {
    /// Creates an entry stamped with the current local time
    ///
    /// The VIN is taken from the record's `vin` field.
    pub fn new(data: VehicleRecord) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            vin: data.vin().map(str::to_string),
            data,
        }
    }

    /// Timestamp as `YYYY-MM-DD HH:MM:SS`, or as stored if it cannot be parsed
    pub fn display_timestamp(&self) -> String {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
            return parsed.format("%Y-%m-%d %H:%M:%S").to_string();
        }
        self.timestamp.clone()
    }
}

/// All past lookups in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Removes the entry with the given 1-based number
    pub fn remove(&mut self, index: usize) -> Result<HistoryEntry, HistoryError> {
        if index == 0 || index > self.entries.len() {
            return Err(HistoryError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index - 1))
    }
}

impl From<Vec<HistoryEntry>> for History {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        Self { entries }
    }
}

/// A top-level array element that may or may not be a usable entry
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Entry(HistoryEntry),
    Malformed(IgnoredAny),
}

/// Reads and writes the history file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted history
    ///
    /// Never fails: a missing, empty, unreadable or corrupted file yields an
    /// empty history. Corruption and read failures are logged at error level.
    /// Array elements that are not entry objects are skipped.
    pub fn load(&self) -> History {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "history file not found; a new one will be created on first save");
                return History::new();
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read history file");
                return History::new();
            }
        };

        if content.trim().is_empty() {
            warn!(path = %self.path.display(), "history file is empty");
            return History::new();
        }

        let stored: Vec<StoredEntry> = match serde_json::from_str(&content) {
            Ok(stored) => stored,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "history file is corrupted; starting with an empty history");
                return History::new();
            }
        };

        let total = stored.len();
        let entries: Vec<HistoryEntry> = stored
            .into_iter()
            .filter_map(|slot| match slot {
                StoredEntry::Entry(entry) => Some(entry),
                StoredEntry::Malformed(_) => None,
            })
            .collect();

        if entries.len() < total {
            warn!(
                skipped = total - entries.len(),
                "ignored malformed entries in history file"
            );
        }

        History::from(entries)
    }

    /// Replaces the persisted history with `history`
    ///
    /// On failure the previous file is left untouched and the error is logged
    /// once here; callers should only report it.
    pub fn persist(&self, history: &History) -> Result<(), HistoryError> {
        match self.write_atomically(history) {
            Ok(()) => {
                info!(entries = history.len(), "history saved");
                Ok(())
            }
            Err(source) => {
                error!(path = %self.path.display(), error = %source, "failed to persist history");
                Err(HistoryError::Persist {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn write_atomically(&self, history: &History) -> io::Result<()> {
        let json = serde_json::to_string_pretty(history)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Records a successful lookup at the end of the history
    pub fn append(&self, record: VehicleRecord) -> Result<(), HistoryError> {
        let mut history = self.load();
        self.append_to(&mut history, record)
    }

    /// Like [`HistoryStore::append`], against a history the caller already
    /// loaded
    ///
    /// `history` only keeps the new entry if it was saved, so it always
    /// matches the file.
    pub fn append_to(&self, history: &mut History, record: VehicleRecord) -> Result<(), HistoryError> {
        history.push(HistoryEntry::new(record));
        if let Err(e) = self.persist(history) {
            history.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Removes and returns the entry with the given 1-based number
    ///
    /// An out-of-range number changes nothing on disk.
    pub fn delete_at(&self, index: usize) -> Result<HistoryEntry, HistoryError> {
        let mut history = self.load();
        self.delete_from(&mut history, index)
    }

    /// Like [`HistoryStore::delete_at`], against a history the caller already
    /// loaded; `history` is left unchanged unless the removal was saved
    pub fn delete_from(&self, history: &mut History, index: usize) -> Result<HistoryEntry, HistoryError> {
        let mut updated = history.clone();
        let removed = updated.remove(index)?;
        self.persist(&updated)?;
        *history = updated;
        info!(index, vin = removed.vin.as_deref().unwrap_or("N/A"), "deleted history entry");
        Ok(removed)
    }

    /// Discards every entry
    pub fn clear(&self) -> Result<(), HistoryError> {
        self.persist(&History::new())?;
        info!("all history cleared");
        Ok(())
    }
}

/// Field deserializers that accept whatever older or hand-edited files contain
mod lenient {
    use super::*;

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Data {
        Record(VehicleRecord),
        Other(IgnoredAny),
    }

    pub fn record<'de, D: Deserializer<'de>>(deserializer: D) -> Result<VehicleRecord, D::Error> {
        Ok(match Data::deserialize(deserializer)? {
            Data::Record(record) => record,
            Data::Other(_) => VehicleRecord::new(),
        })
    }
}
