//! Relevance scoring for language detection.

use std::borrow::Cow;

use rustc_hash::FxHashMap;

/// A keyword stops scoring after this many hits, so one identifier repeated
/// all over a file cannot dominate detection.
pub const MAX_KEYWORD_HITS: u32 = 7;

/// Running detection score of one scan.
///
/// The score only ever grows. It is a heuristic for picking a grammar among
/// candidates and has no influence on the token stream.
#[derive(Debug, Default, Clone)]
pub struct Relevance<'s> {
	score: u32,
	keyword_hits: FxHashMap<Cow<'s, str>, u32>,
}

impl<'s> Relevance<'s> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current score.
	pub fn score(&self) -> u32 {
		self.score
	}

	/// Records a mode beginning with the given weight.
	pub fn add_mode(&mut self, weight: u32) {
		self.score = self.score.saturating_add(weight);
	}

	/// Records a classified keyword. Returns whether it was scored.
	///
	/// Hits are counted per `word` as given; callers pass the folded form
	/// when lookup ignores case.
	pub fn add_keyword(&mut self, word: impl Into<Cow<'s, str>>, weight: u32) -> bool {
		let hits = self.keyword_hits.entry(word.into()).or_insert(0);
		*hits += 1;
		if *hits > MAX_KEYWORD_HITS {
			return false;
		}
		self.score = self.score.saturating_add(weight);
		true
	}
}
