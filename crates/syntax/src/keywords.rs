//! Keyword classification.
//!
//! A [`KeywordTable`] maps identifier text to a class (`keyword`, `built_in`,
//! `literal`, ...) and a relevance weight. Lookup is a single hash probe.

use rustc_hash::FxHashMap;

use crate::error::{GrammarError, Result};

/// Words too common across languages to say anything about which language
/// a snippet is written in. They default to zero relevance.
pub const COMMON_KEYWORDS: &[&str] = &["of", "and", "for", "in", "not", "or", "if", "then", "parent", "list", "value"];

/// Result of classifying an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
	/// Class name, used as the token scope.
	pub class: &'a str,
	/// Score contributed when the word is seen.
	pub relevance: u32,
}

impl Classification<'_> {
	/// Hidden classes (leading `_`) are scored but emitted as plain text.
	pub fn is_hidden(&self) -> bool {
		self.class.starts_with('_')
	}
}

#[derive(Debug, Clone, Copy)]
struct Entry {
	class: u16,
	relevance: u32,
}

/// Identifier text to `{class, relevance}` mapping.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
	entries: FxHashMap<Box<str>, Entry>,
	classes: Vec<Box<str>>,
	case_insensitive: bool,
}

impl KeywordTable {
	pub fn builder() -> KeywordTableBuilder {
		KeywordTableBuilder::default()
	}

	/// Classifies `word`, or returns `None` when it is not in the table.
	pub fn classify(&self, word: &str) -> Option<Classification<'_>> {
		let entry = if self.case_insensitive {
			self.entries.get(word.to_lowercase().as_str())
		} else {
			self.entries.get(word)
		}?;
		Some(Classification {
			class: &self.classes[entry.class as usize],
			relevance: entry.relevance,
		})
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn is_case_insensitive(&self) -> bool {
		self.case_insensitive
	}

	/// Returns a copy whose keys are lowercased and whose lookups fold case.
	pub(crate) fn folded(&self) -> Self {
		let mut entries = FxHashMap::default();
		for (word, entry) in &self.entries {
			entries.insert(word.to_lowercase().into_boxed_str(), *entry);
		}
		Self {
			entries,
			classes: self.classes.clone(),
			case_insensitive: true,
		}
	}
}

/// Builder for [`KeywordTable`].
///
/// Words are given as `"word"` or `"word|weight"`; a later entry for the same
/// word replaces an earlier one. Case folding is decided at [`build`] time, so
/// the order of `class` and `case_insensitive` calls does not matter.
///
/// [`build`]: KeywordTableBuilder::build
#[derive(Debug, Default)]
pub struct KeywordTableBuilder {
	words: Vec<(Box<str>, Entry)>,
	classes: Vec<Box<str>>,
	case_insensitive: bool,
	error: Option<GrammarError>,
}

impl KeywordTableBuilder {
	/// Adds `words` under `class`.
	pub fn class<I, S>(mut self, class: &str, words: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let class_idx = match self.classes.iter().position(|c| &**c == class) {
			Some(idx) => idx,
			None => {
				self.classes.push(class.into());
				self.classes.len() - 1
			}
		} as u16;

		for raw in words {
			let raw = raw.as_ref();
			let (word, relevance) = match raw.split_once('|') {
				Some((word, weight)) => match weight.parse::<u32>() {
					Ok(weight) => (word, weight),
					Err(_) => {
						self.error.get_or_insert(GrammarError::InvalidKeyword { entry: raw.to_string() });
						continue;
					}
				},
				None => (raw, default_relevance(raw)),
			};
			if word.is_empty() {
				continue;
			}
			self.words.push((
				word.into(),
				Entry {
					class: class_idx,
					relevance,
				},
			));
		}
		self
	}

	/// Folds case on lookup.
	pub fn case_insensitive(mut self, yes: bool) -> Self {
		self.case_insensitive = yes;
		self
	}

	pub fn build(self) -> Result<KeywordTable> {
		if let Some(error) = self.error {
			return Err(error);
		}
		let mut entries = FxHashMap::default();
		for (word, entry) in self.words {
			let word = if self.case_insensitive { word.to_lowercase().into_boxed_str() } else { word };
			entries.insert(word, entry);
		}
		Ok(KeywordTable {
			entries,
			classes: self.classes,
			case_insensitive: self.case_insensitive,
		})
	}
}

fn default_relevance(word: &str) -> u32 {
	if COMMON_KEYWORDS.contains(&word.to_lowercase().as_str()) { 0 } else { 1 }
}
