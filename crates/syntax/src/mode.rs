//! Authoring model for grammar modes.
//!
//! Modes are stored in an arena owned by [`GrammarBuilder`](crate::GrammarBuilder)
//! and refer to each other through [`ModeId`] handles. Because references are
//! plain ids, a mode can be shared by several parents, and cycles (a string
//! containing an interpolation containing the same string) are expressed
//! without ever materialising an infinite tree.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::keywords::KeywordTable;

/// Handle to a mode definition inside a [`GrammarBuilder`](crate::GrammarBuilder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(pub(crate) u32);

impl ModeId {
	#[inline]
	pub(crate) fn idx(self) -> usize {
		self.0 as usize
	}
}

impl fmt::Display for ModeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A child reference inside [`ModeDef::contains`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeRef {
	/// Another mode in the same builder.
	Id(ModeId),
	/// The mode that owns this `contains` list (after variant expansion).
	SelfRef,
}

impl From<ModeId> for ModeRef {
	fn from(id: ModeId) -> Self {
		Self::Id(id)
	}
}

/// A mode definition as written by a grammar author.
///
/// Unset optional fields take the defaults documented on each field. A
/// variant is merged over its base definition: every optional field the
/// variant sets wins, non-empty `contains` replaces the base list, and boolean
/// flags set on either side stay set.
#[derive(Debug, Clone, Default)]
pub struct ModeDef {
	/// Label attached to tokens emitted while this mode is on top of the stack.
	pub scope: Option<Cow<'static, str>>,
	/// Pattern that opens the mode. Defaults to an empty match.
	pub begin: Option<Cow<'static, str>>,
	/// Space separated words that open the mode when they appear as whole
	/// words not preceded by `.`. Implies a `keyword` table with those words
	/// when no table is given, and a relevance of 0 when none is given.
	pub begin_keywords: Option<Cow<'static, str>>,
	/// Pattern that closes the mode. Without an `end` (and without
	/// `ends_with_parent`) the mode closes right after `begin`.
	pub end: Option<Cow<'static, str>>,
	/// Pattern that, when found before the mode ends, aborts classification.
	pub illegal: Option<Cow<'static, str>>,
	/// Child modes, tried in order at every position.
	pub contains: Vec<ModeRef>,
	/// Alternative definitions sharing this mode's role, tried in order.
	pub variants: Vec<ModeDef>,
	/// Identifier classification applied to the mode's own text.
	pub keywords: Option<Arc<KeywordTable>>,
	/// Pattern delimiting identifier-shaped runs for keyword lookup. Defaults to `\w+`.
	pub keyword_pattern: Option<Cow<'static, str>>,
	/// Score added when the mode begins. Defaults to 1.
	pub relevance: Option<u32>,
	/// Mode opened automatically when this one ends.
	pub starts: Option<ModeId>,
	/// The begin delimiter belongs to the parent's text.
	pub exclude_begin: bool,
	/// The end delimiter belongs to the parent's text.
	pub exclude_end: bool,
	/// The begin delimiter is not consumed and is rescanned inside the mode.
	pub return_begin: bool,
	/// The end delimiter is not consumed and is rescanned by the parent.
	pub return_end: bool,
	/// The mode also ends wherever its parent would end.
	pub ends_with_parent: bool,
	/// Ending this mode ends its parent as well.
	pub ends_parent: bool,
	/// Structural only: the text stays with the parent and scores nothing.
	pub skip: bool,
}

impl ModeDef {
	/// Returns `variant` merged over `self`.
	pub(crate) fn merged(&self, variant: &ModeDef) -> ModeDef {
		ModeDef {
			scope: variant.scope.clone().or_else(|| self.scope.clone()),
			begin: variant.begin.clone().or_else(|| self.begin.clone()),
			begin_keywords: variant.begin_keywords.clone().or_else(|| self.begin_keywords.clone()),
			end: variant.end.clone().or_else(|| self.end.clone()),
			illegal: variant.illegal.clone().or_else(|| self.illegal.clone()),
			contains: if variant.contains.is_empty() {
				self.contains.clone()
			} else {
				variant.contains.clone()
			},
			variants: Vec::new(),
			keywords: variant.keywords.clone().or_else(|| self.keywords.clone()),
			keyword_pattern: variant.keyword_pattern.clone().or_else(|| self.keyword_pattern.clone()),
			relevance: variant.relevance.or(self.relevance),
			starts: variant.starts.or(self.starts),
			exclude_begin: variant.exclude_begin || self.exclude_begin,
			exclude_end: variant.exclude_end || self.exclude_end,
			return_begin: variant.return_begin || self.return_begin,
			return_end: variant.return_end || self.return_end,
			ends_with_parent: variant.ends_with_parent || self.ends_with_parent,
			ends_parent: variant.ends_parent || self.ends_parent,
			skip: variant.skip || self.skip,
		}
	}

	/// Child ids referenced by this definition and its variants.
	pub(crate) fn references(&self) -> impl Iterator<Item = ModeId> + '_ {
		let own = self.contains.iter().filter_map(|r| match r {
			ModeRef::Id(id) => Some(*id),
			ModeRef::SelfRef => None,
		});
		let nested = self.variants.iter().flat_map(|v| {
			v.contains
				.iter()
				.filter_map(|r| match r {
					ModeRef::Id(id) => Some(*id),
					ModeRef::SelfRef => None,
				})
				.chain(v.starts)
		});
		own.chain(self.starts).chain(nested)
	}
}
