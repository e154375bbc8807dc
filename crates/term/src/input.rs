//! Reading the text to scan.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, bail};
use sheen_language::InputLimits;

/// Reads `path`, or stdin when `None`, refusing inputs over the byte limit.
pub fn read(path: Option<&Path>, limits: &InputLimits) -> anyhow::Result<String> {
	match path {
		Some(path) => {
			let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
			read_limited(file, limits.max_bytes).with_context(|| format!("failed to read {}", path.display()))
		}
		None => read_limited(io::stdin().lock(), limits.max_bytes).context("failed to read stdin"),
	}
}

pub fn read_limited(reader: impl Read, max_bytes: u64) -> anyhow::Result<String> {
	let mut bytes = Vec::new();
	reader.take(max_bytes.saturating_add(1)).read_to_end(&mut bytes)?;
	if bytes.len() as u64 > max_bytes {
		bail!("input exceeds {max_bytes} bytes; raise [input] max_bytes to scan it");
	}
	String::from_utf8(bytes).context("input is not valid UTF-8")
}
