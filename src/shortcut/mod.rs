//! Tracker API integration: wire models and the thin HTTP client.

pub mod client;
pub mod models;

pub use client::{EpicSource, ShortcutClient};
