//! Error types for grammar construction.

use std::fmt;

use thiserror::Error;

use crate::mode::ModeId;

/// Which field of a mode a pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRole {
	Begin,
	End,
	Illegal,
	KeywordPattern,
}

impl fmt::Display for PatternRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Begin => "begin",
			Self::End => "end",
			Self::Illegal => "illegal",
			Self::KeywordPattern => "keyword pattern",
		})
	}
}

/// Errors raised while building a [`Grammar`](crate::Grammar).
///
/// These are definition errors: they are fatal for the grammar being built
/// and leave every other grammar untouched. Scanning itself never fails.
#[derive(Debug, Error)]
pub enum GrammarError {
	/// A pattern did not compile.
	#[error("grammar {grammar:?}: invalid {role} pattern /{pattern}/ in mode {mode}: {source}")]
	InvalidPattern {
		grammar: String,
		mode: ModeId,
		role: PatternRole,
		pattern: String,
		#[source]
		source: Box<fancy_regex::Error>,
	},

	/// A combined matcher built from individually valid patterns did not compile.
	#[error("grammar {grammar:?}: failed to combine patterns of mode {mode}: {source}")]
	Combine {
		grammar: String,
		mode: ModeId,
		#[source]
		source: Box<fancy_regex::Error>,
	},

	/// [`GrammarBuilder::build`](crate::GrammarBuilder::build) was called without a root mode.
	#[error("grammar {0:?} has no root mode")]
	MissingRoot(String),

	/// A [`ModeRef`](crate::ModeRef) names a mode that is not in the builder's arena.
	#[error("grammar {grammar:?}: mode {mode} refers to unknown mode {missing}")]
	UnknownMode { grammar: String, mode: ModeId, missing: ModeId },

	/// The root mode only ends at end of input; it may not declare an `end`,
	/// `variants` or `ends_with_parent`.
	#[error("grammar {0:?}: root mode may not declare end, variants or ends_with_parent")]
	InvalidRoot(String),

	/// A keyword entry of the form `word|weight` had a non-numeric weight.
	#[error("invalid keyword entry {entry:?}: relevance must be a non-negative integer")]
	InvalidKeyword { entry: String },
}

/// Result type for grammar construction.
pub type Result<T> = std::result::Result<T, GrammarError>;
