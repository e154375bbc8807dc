//! Single compiled patterns.
//!
//! Every pattern is compiled in multi-line mode, so `^` and `$` anchor at
//! line boundaries, and searches start at an offset into the full text so
//! anchors and look-behind see the real surrounding context.

use std::fmt;
use std::ops::Range;

use fancy_regex::Regex;

/// A compiled regular expression together with its source text.
#[derive(Clone)]
pub struct Pattern {
	source: Box<str>,
	regex: Regex,
}

impl Pattern {
	/// Compiles `source`, optionally ignoring case.
	pub fn new(source: &str, case_insensitive: bool) -> Result<Self, fancy_regex::Error> {
		Ok(Self {
			regex: compile(source, case_insensitive)?,
			source: source.into(),
		})
	}

	/// Returns the pattern text as written in the grammar.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Number of capture groups in the pattern, not counting the implicit whole-match group.
	pub fn group_count(&self) -> usize {
		self.regex.captures_len().saturating_sub(1)
	}

	/// Finds the earliest match starting at or after `pos`.
	pub fn find_at(&self, text: &str, pos: usize) -> Option<Range<usize>> {
		match self.regex.find_from_pos(text, pos) {
			Ok(found) => found.map(|m| m.start()..m.end()),
			Err(error) => {
				tracing::warn!(pattern = %self.source, pos, %error, "pattern search failed; treating as no match");
				None
			}
		}
	}

	/// Returns the end of a match that begins exactly at `pos`, if any.
	pub fn match_at(&self, text: &str, pos: usize) -> Option<usize> {
		self.find_at(text, pos).filter(|m| m.start == pos).map(|m| m.end)
	}
}

impl fmt::Debug for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "/{}/", self.source)
	}
}

/// Compiles `source` with the flags every grammar pattern shares.
pub(crate) fn compile(source: &str, case_insensitive: bool) -> Result<Regex, fancy_regex::Error> {
	let flags = if case_insensitive { "(?mi)" } else { "(?m)" };
	Regex::new(&format!("{flags}(?:{source})"))
}

/// Returns the byte offset of the character following `pos`, or `None` at end of text.
pub(crate) fn next_char_boundary(text: &str, pos: usize) -> Option<usize> {
	text.get(pos..)?.chars().next().map(|c| pos + c.len_utf8())
}
