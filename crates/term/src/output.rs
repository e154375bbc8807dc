//! Rendering scan results as data.
//!
//! Output goes to stdout one record per line so it can be piped into other
//! tools; diagnostics go through tracing to stderr.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;
use sheen_language::{Detection, Registry};
use sheen_syntax::Token;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
	/// One JSON object per token
	#[default]
	Json,
	/// Aligned columns: start, end, scope, quoted text
	Table,
}

#[derive(Debug, Serialize)]
struct Record<'a> {
	scope: Option<&'a str>,
	start: usize,
	end: usize,
	text: &'a str,
}

pub fn write_tokens(out: &mut impl Write, text: &str, tokens: &[Token<'_>], format: Format) -> io::Result<()> {
	for token in tokens {
		let record = Record {
			scope: token.scope,
			start: token.span.start,
			end: token.span.end,
			text: token.text(text),
		};
		match format {
			Format::Json => {
				serde_json::to_writer(&mut *out, &record)?;
				writeln!(out)?;
			}
			Format::Table => writeln!(out, "{:>6} {:>6}  {:<12} {:?}", record.start, record.end, record.scope.unwrap_or("-"), record.text)?,
		}
	}
	Ok(())
}

/// Writes `name<TAB>relevance` for the winner and the runner-up.
pub fn write_detection(out: &mut impl Write, registry: &Registry, detection: &Detection) -> io::Result<()> {
	let ranked = std::iter::once((detection.language, detection.relevance)).chain(detection.second_best);
	for (language, relevance) in ranked {
		if let Some(grammar) = registry.get(language) {
			writeln!(out, "{}\t{relevance}", grammar.name())?;
		}
	}
	Ok(())
}

/// Writes `name<TAB>alias, alias` per registered language.
pub fn write_languages(out: &mut impl Write, registry: &Registry) -> io::Result<()> {
	for (_, grammar) in registry.languages() {
		writeln!(out, "{}\t{}", grammar.name(), grammar.aliases().join(", "))?;
	}
	Ok(())
}
