//! Local lookup history and the cache view derived from it
//!
//! The history file is the single source of truth: the history screen lists
//! it and cache lookups scan it from newest to oldest.

pub mod history;
mod lookup;

pub use history::{History, HistoryEntry, HistoryError, HistoryStore, DEFAULT_HISTORY_FILE};
