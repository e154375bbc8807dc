//! Grammars: building and the compiled, shareable form.

use crate::compile::{self, Mode, ModeIdx};
use crate::error::{GrammarError, Result};
use crate::mode::{ModeDef, ModeId};
use crate::options::ScanOptions;
use crate::pattern::Pattern;
use crate::scan::Scanner;
use crate::token::ScanReport;

/// Mutable arena of mode definitions for one grammar.
///
/// Modes are added first and wired together afterwards, which is how cyclic
/// grammars are written:
///
/// ```
/// use sheen_syntax::{GrammarBuilder, ModeDef};
///
/// let mut builder = GrammarBuilder::new("interp");
/// let subst = builder.add(ModeDef {
/// 	scope: Some("subst".into()),
/// 	begin: Some(r"\{".into()),
/// 	end: Some(r"\}".into()),
/// 	..ModeDef::default()
/// });
/// let string = builder.add(ModeDef {
/// 	scope: Some("string".into()),
/// 	begin: Some("\"".into()),
/// 	end: Some("\"".into()),
/// 	contains: vec![subst.into()],
/// 	..ModeDef::default()
/// });
/// builder.mode_mut(subst).contains = vec![string.into()];
/// builder.set_root(ModeDef {
/// 	contains: vec![string.into()],
/// 	..ModeDef::default()
/// });
/// assert!(builder.build().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
	name: String,
	aliases: Vec<String>,
	case_insensitive: bool,
	auto_detect: bool,
	modes: Vec<ModeDef>,
	root: Option<ModeId>,
}

impl GrammarBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			aliases: Vec::new(),
			case_insensitive: false,
			auto_detect: true,
			modes: Vec::new(),
			root: None,
		}
	}

	/// Sets alternative names the grammar can be selected by.
	pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.aliases = aliases.into_iter().map(Into::into).collect();
		self
	}

	/// Compiles every pattern ignoring case and folds keyword lookups.
	pub fn with_case_insensitive(mut self, yes: bool) -> Self {
		self.case_insensitive = yes;
		self
	}

	/// Whether detection should consider this grammar. Defaults to true.
	pub fn with_auto_detect(mut self, yes: bool) -> Self {
		self.auto_detect = yes;
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Adds a mode to the arena.
	pub fn add(&mut self, def: ModeDef) -> ModeId {
		let id = ModeId(self.modes.len() as u32);
		self.modes.push(def);
		id
	}

	/// Returns a previously added mode for further wiring.
	///
	/// # Panics
	///
	/// Panics if `id` was not returned by this builder.
	pub fn mode_mut(&mut self, id: ModeId) -> &mut ModeDef {
		&mut self.modes[id.idx()]
	}

	/// Returns a previously added mode, or `None` for a foreign id.
	pub fn mode(&self, id: ModeId) -> Option<&ModeDef> {
		self.modes.get(id.idx())
	}

	/// Adds the root mode. Its `illegal` pattern is the grammar's top-level
	/// illegal pattern and its keywords classify top-level identifiers.
	pub fn set_root(&mut self, def: ModeDef) -> ModeId {
		let id = self.add(def);
		self.root = Some(id);
		id
	}

	/// Validates and compiles the grammar.
	pub fn build(self) -> Result<Grammar> {
		let root = self.root.ok_or_else(|| GrammarError::MissingRoot(self.name.clone()))?;
		let compiled = compile::compile(&self.name, &self.modes, root, self.case_insensitive)?;
		Ok(Grammar {
			name: self.name,
			aliases: self.aliases,
			case_insensitive: self.case_insensitive,
			auto_detect: self.auto_detect,
			illegal: compiled.illegal,
			modes: compiled.modes,
			root: compiled.root,
		})
	}
}

/// A compiled grammar.
///
/// Immutable after construction and safe to share between threads; each
/// scan keeps its mutable state in its own [`Scanner`].
#[derive(Debug)]
pub struct Grammar {
	name: String,
	aliases: Vec<String>,
	case_insensitive: bool,
	auto_detect: bool,
	illegal: Option<Pattern>,
	modes: Vec<Mode>,
	root: ModeIdx,
}

impl Grammar {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn aliases(&self) -> &[String] {
		&self.aliases
	}

	/// Returns true if `name` is this grammar's name or one of its aliases,
	/// ignoring ASCII case.
	pub fn answers_to(&self, name: &str) -> bool {
		self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
	}

	pub fn is_case_insensitive(&self) -> bool {
		self.case_insensitive
	}

	pub fn auto_detect(&self) -> bool {
		self.auto_detect
	}

	/// Top-level illegal pattern, if any.
	pub fn illegal(&self) -> Option<&str> {
		self.illegal.as_ref().map(Pattern::as_str)
	}

	/// Number of compiled modes, variants expanded.
	pub fn mode_count(&self) -> usize {
		self.modes.len()
	}

	/// Starts a scan of `text` with default options.
	pub fn scan<'g, 's>(&'g self, text: &'s str) -> Scanner<'g, 's> {
		Scanner::new(self, text, ScanOptions::default())
	}

	pub fn scan_with<'g, 's>(&'g self, text: &'s str, options: ScanOptions) -> Scanner<'g, 's> {
		Scanner::new(self, text, options)
	}

	/// Scans `text` only for its detection report.
	pub fn relevance(&self, text: &str) -> ScanReport {
		self.scan(text).finish()
	}

	pub(crate) fn root(&self) -> ModeIdx {
		self.root
	}

	#[inline]
	pub(crate) fn mode(&self, idx: ModeIdx) -> &Mode {
		&self.modes[idx.idx()]
	}
}
