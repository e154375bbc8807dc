use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::Format;

#[derive(Parser, Debug)]
#[command(name = "sheen")]
#[command(about = "Classify source text into highlight scopes")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to $XDG_CONFIG_HOME/sheen/config.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Print the token stream of a file
	Highlight {
		/// File to scan (reads stdin if omitted)
		file: Option<PathBuf>,

		/// Language name or alias (detected if omitted)
		#[arg(long, short = 'l')]
		language: Option<String>,

		/// Output format
		#[arg(long, short = 'f', value_enum, default_value_t = Format::Json)]
		format: Format,
	},
	/// Print the most likely language of a file and its relevance
	Detect {
		/// File to scan (reads stdin if omitted)
		file: Option<PathBuf>,

		/// Only consider these languages (comma-separated)
		#[arg(long, value_delimiter = ',')]
		only: Option<Vec<String>>,
	},
	/// List registered languages and their aliases
	Languages,
}
