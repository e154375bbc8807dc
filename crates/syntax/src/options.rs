//! Per-scan options.

use serde::{Deserialize, Serialize};

/// Options that change how a single scan behaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
	/// Treat `illegal` matches as plain text instead of abandoning
	/// classification for the rest of the input.
	pub ignore_illegals: bool,
}
