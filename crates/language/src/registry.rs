//! Grammar registry and language detection.
//!
//! Grammars are registered once and addressed by [`LanguageId`]; lookups by
//! name accept the grammar name or any alias, ignoring ASCII case. Detection
//! scans the text with every candidate grammar in parallel and ranks them by
//! relevance.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sheen_syntax::{Grammar, GrammarError, ScanOptions, ScanReport, Token};
use thiserror::Error;

use crate::python;

/// Unique identifier for a registered language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LanguageId(pub u32);

impl LanguageId {
	pub const INVALID: LanguageId = LanguageId(u32::MAX);

	#[inline]
	pub fn is_valid(self) -> bool {
		self != Self::INVALID
	}

	#[inline]
	pub fn idx(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for LanguageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("unknown language: {0}")]
	UnknownLanguage(String),

	#[error(transparent)]
	Grammar(#[from] GrammarError),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Which grammars detection considers and how sure it must be.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectOptions {
	/// Names or aliases to choose from. Empty means every grammar that
	/// takes part in detection.
	pub languages: Vec<String>,
	/// A best score below this is no detection at all.
	pub min_relevance: u32,
}

/// Outcome of [`Registry::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
	pub language: LanguageId,
	pub relevance: u32,
	/// Runner-up and its score, if there were at least two candidates.
	pub second_best: Option<(LanguageId, u32)>,
}

/// Tokens of one text together with the scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlighted<'g> {
	pub language: LanguageId,
	pub tokens: Vec<Token<'g>>,
	pub report: ScanReport,
}

/// Registered grammars.
#[derive(Debug, Default)]
pub struct Registry {
	grammars: Vec<Arc<Grammar>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry holding every bundled grammar.
	pub fn builtin() -> Result<Self> {
		let mut registry = Self::new();
		registry.register(Arc::new(python::grammar()?));
		tracing::debug!(languages = registry.len(), "loaded builtin grammars");
		Ok(registry)
	}

	/// Registers a grammar.
	pub fn register(&mut self, grammar: Arc<Grammar>) -> LanguageId {
		let id = LanguageId(self.grammars.len() as u32);
		if let Some(existing) = self.language_for_name(grammar.name()) {
			tracing::warn!(name = grammar.name(), %existing, "language name already registered; lookups keep the earlier grammar");
		}
		self.grammars.push(grammar);
		id
	}

	/// Gets a grammar by ID.
	pub fn get(&self, id: LanguageId) -> Option<&Arc<Grammar>> {
		self.grammars.get(id.idx())
	}

	/// Finds a language by name or alias.
	pub fn language_for_name(&self, name: &str) -> Option<LanguageId> {
		self.grammars
			.iter()
			.position(|grammar| grammar.answers_to(name))
			.map(|idx| LanguageId(idx as u32))
	}

	/// Gets a grammar by name or alias.
	pub fn grammar(&self, name: &str) -> Result<&Arc<Grammar>> {
		self.language_for_name(name)
			.and_then(|id| self.get(id))
			.ok_or_else(|| RegistryError::UnknownLanguage(name.to_string()))
	}

	/// Returns all registered languages in registration order.
	pub fn languages(&self) -> impl Iterator<Item = (LanguageId, &Arc<Grammar>)> {
		self.grammars
			.iter()
			.enumerate()
			.map(|(idx, grammar)| (LanguageId(idx as u32), grammar))
	}

	pub fn len(&self) -> usize {
		self.grammars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.grammars.is_empty()
	}

	/// Scans `text` with the named grammar and collects every token.
	pub fn highlight(&self, name: &str, text: &str, options: ScanOptions) -> Result<Highlighted<'_>> {
		let language = self
			.language_for_name(name)
			.ok_or_else(|| RegistryError::UnknownLanguage(name.to_string()))?;
		let grammar = &self.grammars[language.idx()];

		let mut scan = grammar.scan_with(text, options);
		let tokens: Vec<_> = scan.by_ref().collect();
		let report = scan.report();
		tracing::debug!(language = grammar.name(), tokens = tokens.len(), relevance = report.relevance, illegal = report.illegal, "highlighted");
		Ok(Highlighted { language, tokens, report })
	}

	/// Picks the grammar that best explains `text`.
	///
	/// Every candidate scans the text independently; illegal scans score 0.
	/// Ties go to the grammar registered first. Returns `None` when there
	/// are no candidates or the best score is 0 or below
	/// [`DetectOptions::min_relevance`].
	pub fn detect(&self, text: &str, options: &DetectOptions) -> Option<Detection> {
		let candidates = self.candidates(options);
		let mut scores: Vec<(LanguageId, u32)> = candidates
			.par_iter()
			.map(|&id| (id, self.grammars[id.idx()].relevance(text).detection_score()))
			.collect();
		scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

		for &(id, score) in &scores {
			tracing::debug!(language = self.grammars[id.idx()].name(), score, "detection candidate");
		}

		let &(language, relevance) = scores.first()?;
		if relevance == 0 || relevance < options.min_relevance {
			return None;
		}
		Some(Detection {
			language,
			relevance,
			second_best: scores.get(1).copied(),
		})
	}

	fn candidates(&self, options: &DetectOptions) -> Vec<LanguageId> {
		if options.languages.is_empty() {
			return self
				.languages()
				.filter(|(_, grammar)| grammar.auto_detect())
				.map(|(id, _)| id)
				.collect();
		}

		let mut ids: Vec<LanguageId> = options
			.languages
			.iter()
			.filter_map(|name| {
				let id = self.language_for_name(name);
				if id.is_none() {
					tracing::warn!(name = name.as_str(), "ignoring unknown language in detection set");
				}
				id
			})
			.collect();
		ids.sort_unstable();
		ids.dedup();
		ids
	}
}
