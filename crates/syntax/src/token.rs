//! Scanner output types.

use std::ops::Range;

use serde::Serialize;

/// A classified span of the source text.
///
/// `scope` is the innermost label in effect: a keyword class for classified
/// identifiers, otherwise the scope of the nearest enclosing mode that has
/// one. Plain text outside any scoped mode has no scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token<'g> {
	pub scope: Option<&'g str>,
	/// Byte range into the scanned text.
	pub span: Range<usize>,
}

impl<'g> Token<'g> {
	pub fn new(scope: Option<&'g str>, span: Range<usize>) -> Self {
		Self { scope, span }
	}

	/// Returns the token's text within `source`.
	///
	/// # Panics
	///
	/// Panics if `source` is not the text this token was produced from.
	pub fn text<'s>(&self, source: &'s str) -> &'s str {
		&source[self.span.clone()]
	}

	pub fn len(&self) -> usize {
		self.span.len()
	}

	pub fn is_empty(&self) -> bool {
		self.span.is_empty()
	}
}

/// Summary of a finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
	/// Accumulated detection score.
	pub relevance: u32,
	/// An `illegal` pattern matched and the remainder was emitted unscoped.
	pub illegal: bool,
}

impl ScanReport {
	/// Score to use when ranking grammars: an illegal scan says the text is
	/// not in this language at all.
	pub fn detection_score(&self) -> u32 {
		if self.illegal { 0 } else { self.relevance }
	}
}
