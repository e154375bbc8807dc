//! User configuration.
//!
//! Read from TOML, by default `$XDG_CONFIG_HOME/sheen/config.toml`. Every
//! section and field is optional; a missing file is the same as an empty one.
//!
//! ```toml
//! [scan]
//! ignore_illegals = false
//!
//! [detect]
//! languages = ["python"]
//! min_relevance = 2
//!
//! [input]
//! max_bytes = 1048576
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sheen_syntax::ScanOptions;
use thiserror::Error;

use crate::registry::DetectOptions;

/// Inputs larger than this are refused unless configured otherwise.
pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: io::Error,
	},

	/// Error parsing TOML or an unknown key.
	#[error("invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub scan: ScanOptions,
	pub detect: DetectOptions,
	pub input: InputLimits,
}

/// Limits applied to text before it is scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputLimits {
	pub max_bytes: u64,
}

impl Default for InputLimits {
	fn default() -> Self {
		Self {
			max_bytes: DEFAULT_MAX_BYTES,
		}
	}
}

impl Config {
	pub fn parse(text: &str) -> Result<Self> {
		Ok(toml::from_str(text)?)
	}

	/// Loads `path`, failing if it cannot be read.
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::parse(&text)?;
		tracing::debug!(path = %path.display(), "loaded configuration");
		Ok(config)
	}

	/// Loads `path`, falling back to defaults when it does not exist.
	pub fn load_or_default(path: &Path) -> Result<Self> {
		match Self::load(path) {
			Err(ConfigError::Io { error, .. }) if error.kind() == io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "no configuration file; using defaults");
				Ok(Self::default())
			}
			other => other,
		}
	}

	/// Loads the configuration from [`Config::default_path`].
	pub fn load_default() -> Result<Self> {
		match Self::default_path() {
			Some(path) => Self::load_or_default(&path),
			None => Ok(Self::default()),
		}
	}

	/// `$XDG_CONFIG_HOME/sheen/config.toml`, or the platform equivalent.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("sheen").join("config.toml"))
	}
}
