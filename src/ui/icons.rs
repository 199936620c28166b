//! Shared UI icons and emojis.
//!
//! Emoji constants used across the board rendering, with plain-text
//! fallbacks for terminals without emoji support.

use console::Emoji;

// Status indicators
pub static FOUND: Emoji<'_, '_> = Emoji("▶️  ", "[>]");
pub static MISSING: Emoji<'_, '_> = Emoji("❌ ", "[x]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!]");

// Board furniture
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "");
pub static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "");
