// Libraries report through tracing; stdout and stderr belong to the binary.
#![deny(clippy::print_stderr, clippy::print_stdout)]

//! Grammars and language selection for the sheen scanner.
//!
//! # Architecture
//!
//! * [`common`]: modes shared between grammars (strings, escapes, comments, titles)
//! * [`python`]: the Python grammar
//! * [`registry`]: grammars by name and alias, parallel detection by relevance
//! * [`config`]: TOML configuration for scanning, detection and input limits

pub mod common;
pub mod config;
pub mod python;
pub mod registry;

pub use config::{Config, ConfigError, InputLimits};
pub use registry::{DetectOptions, Detection, Highlighted, LanguageId, Registry, RegistryError};
