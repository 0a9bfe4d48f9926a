//! vincli library
//!
//! VIN lookups with a retry-wrapped HTTP client, a JSON lookup history that
//! doubles as a cache, batch processing, comparison and document exports. The
//! binary wraps this in a ratatui terminal UI.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod export;
pub mod logging;
pub mod retry;
pub mod service;
pub mod ui;
