//! `sheen`: classify source text into highlight scopes from the command line.

mod cli;
mod input;
mod output;

use std::io::{self, BufWriter, Write};

use anyhow::{Context, bail};
use clap::Parser;
use cli::{Cli, Command};
use sheen_language::{Config, DetectOptions, Registry};
use sheen_syntax::Token;
use tracing::{debug, info, warn};

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = match &cli.config {
		Some(path) => Config::load(path)?,
		None => Config::load_default()?,
	};
	let registry = Registry::builtin().context("failed to build bundled grammars")?;

	let mut out = BufWriter::new(io::stdout().lock());
	run(cli.command, &config, &registry, &mut out)?;
	out.flush()?;
	Ok(())
}

fn run(command: Command, config: &Config, registry: &Registry, out: &mut impl Write) -> anyhow::Result<()> {
	match command {
		Command::Highlight { file, language, format } => {
			let text = input::read(file.as_deref(), &config.input)?;
			let name = match language {
				Some(name) => name,
				None => match registry.detect(&text, &config.detect) {
					Some(detection) => {
						let grammar = registry.get(detection.language).context("detected language is not registered")?;
						info!(language = grammar.name(), relevance = detection.relevance, "detected language");
						grammar.name().to_string()
					}
					None => {
						warn!("no language detected, emitting plain text");
						if !text.is_empty() {
							output::write_tokens(out, &text, &[Token::new(None, 0..text.len())], format)?;
						}
						return Ok(());
					}
				},
			};

			let highlighted = registry.highlight(&name, &text, config.scan)?;
			if highlighted.report.illegal {
				warn!(language = %name, "illegal lexeme, remainder emitted unscoped");
			}
			debug!(relevance = highlighted.report.relevance, "scan finished");
			output::write_tokens(out, &text, &highlighted.tokens, format)?;
		}
		Command::Detect { file, only } => {
			let text = input::read(file.as_deref(), &config.input)?;
			let options = match only {
				Some(languages) => DetectOptions {
					languages,
					..config.detect.clone()
				},
				None => config.detect.clone(),
			};
			let Some(detection) = registry.detect(&text, &options) else {
				bail!("no language detected");
			};
			output::write_detection(out, registry, &detection)?;
		}
		Command::Languages => output::write_languages(out, registry)?,
	}
	Ok(())
}

/// Logs go to stderr. `SHEEN_LOG` wins over `RUST_LOG`; without either the
/// level is `warn`, or `debug` with `--verbose`.
fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("SHEEN_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("debug")
			} else {
				EnvFilter::new("warn")
			}
		});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}
