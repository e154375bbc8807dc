//! Grammar compilation.
//!
//! Turns the builder's arena of [`ModeDef`]s into the flat list of compiled
//! [`Mode`]s a scan runs on. Compilation is a worklist over
//! `(definition, variant, terminators)` keys:
//!
//! * each variant of a referenced mode becomes its own compiled mode, cached
//!   per definition so every parent sees the same expansion;
//! * modes that end with their parent are compiled once per distinct
//!   terminator set, which is the deduplicated union of their own end and
//!   the parent's terminators, so self-similar nesting reaches a fixed point;
//! * `SelfRef` and cyclic references resolve to already staged entries.

use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::error::{GrammarError, PatternRole, Result};
use crate::keywords::KeywordTable;
use crate::matcher::{Rule, RuleSource, TerminatorMatcher, alternation};
use crate::mode::{ModeDef, ModeId, ModeRef};
use crate::pattern::Pattern;

/// Begin pattern of modes that do not declare one: matches anywhere.
const IMPLICIT_BEGIN: &str = r"\B|\b";
/// End pattern of modes that declare neither `end` nor `ends_with_parent`:
/// closes right after `begin`.
const IMPLICIT_END: &str = r"\B|\b";
const DEFAULT_KEYWORD_PATTERN: &str = r"\w+";

/// Index of a compiled mode inside a [`Grammar`](crate::Grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ModeIdx(pub(crate) u32);

impl ModeIdx {
	#[inline]
	pub(crate) fn idx(self) -> usize {
		self.0 as usize
	}
}

bitflags! {
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub(crate) struct ModeFlags: u8 {
		const EXCLUDE_BEGIN = 1 << 0;
		const EXCLUDE_END = 1 << 1;
		const RETURN_BEGIN = 1 << 2;
		const RETURN_END = 1 << 3;
		const ENDS_WITH_PARENT = 1 << 4;
		const ENDS_PARENT = 1 << 5;
		const SKIP = 1 << 6;
	}
}

impl ModeFlags {
	fn from_def(def: &ModeDef) -> Self {
		let mut flags = Self::empty();
		flags.set(Self::EXCLUDE_BEGIN, def.exclude_begin);
		flags.set(Self::EXCLUDE_END, def.exclude_end);
		flags.set(Self::RETURN_BEGIN, def.return_begin);
		flags.set(Self::RETURN_END, def.return_end);
		flags.set(Self::ENDS_WITH_PARENT, def.ends_with_parent);
		flags.set(Self::ENDS_PARENT, def.ends_parent);
		flags.set(Self::SKIP, def.skip);
		flags
	}
}

/// Post-match check a begin match must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BeginGuard {
	Always,
	/// Reject when the match directly follows a `.`, i.e. member access.
	NotAfterDot,
}

impl BeginGuard {
	pub(crate) fn allows(self, text: &str, start: usize) -> bool {
		match self {
			Self::Always => true,
			Self::NotAfterDot => !text[..start].ends_with('.'),
		}
	}
}

/// A compiled, immutable mode.
#[derive(Debug)]
pub(crate) struct Mode {
	/// Definition this mode was compiled from.
	pub(crate) def: ModeId,
	pub(crate) scope: Option<Box<str>>,
	/// Own end pattern, checked when resolving which open mode an end match closes.
	pub(crate) end: Option<Pattern>,
	pub(crate) guard: BeginGuard,
	pub(crate) keywords: Option<Arc<KeywordTable>>,
	pub(crate) keyword_pattern: Arc<Pattern>,
	pub(crate) relevance: u32,
	pub(crate) flags: ModeFlags,
	pub(crate) starts: Option<ModeIdx>,
	pub(crate) matcher: TerminatorMatcher,
}

impl Mode {
	#[inline]
	pub(crate) fn has(&self, flag: ModeFlags) -> bool {
		self.flags.contains(flag)
	}
}

type Key = (ModeId, Option<u32>, Vec<Arc<str>>);

struct Begin {
	source: String,
	groups: usize,
}

struct Staged {
	def: ModeId,
	resolved: ModeDef,
	/// `None` for the root.
	begin: Option<Begin>,
	guard: BeginGuard,
	end: Option<Pattern>,
	terminators: Vec<Arc<str>>,
	parent_terminators: Vec<Arc<str>>,
}

struct Linked {
	children: Vec<ModeIdx>,
	starts: Option<ModeIdx>,
}

pub(crate) struct Compiled {
	pub(crate) modes: Vec<Mode>,
	pub(crate) root: ModeIdx,
	pub(crate) illegal: Option<Pattern>,
}

/// Compiles every mode reachable from `root`.
pub(crate) fn compile(grammar: &str, defs: &[ModeDef], root: ModeId, case_insensitive: bool) -> Result<Compiled> {
	let mut compiler = Compiler {
		grammar,
		defs,
		case_insensitive,
		staged: Vec::new(),
		memo: FxHashMap::default(),
		group_counts: FxHashMap::default(),
		keyword_patterns: FxHashMap::default(),
		folded_tables: FxHashMap::default(),
	};
	compiler.validate(root)?;

	let root_idx = compiler.stage_root(root);
	let mut links = Vec::new();
	while links.len() < compiler.staged.len() {
		let linked = compiler.link(ModeIdx(links.len() as u32))?;
		links.push(linked);
	}

	let illegal = compiler.staged[root_idx.idx()]
		.resolved
		.illegal
		.as_deref()
		.map(|source| compiler.pattern(root, PatternRole::Illegal, source))
		.transpose()?;

	let rule_sets = links
		.iter()
		.enumerate()
		.map(|(i, linked)| compiler.rules(i, &linked.children))
		.collect::<Result<Vec<_>>>()?;

	let staged = std::mem::take(&mut compiler.staged);
	let mut modes = Vec::with_capacity(staged.len());
	for ((staged, linked), rules) in staged.into_iter().zip(links).zip(rule_sets) {
		modes.push(compiler.finish(staged, linked.starts, rules)?);
	}

	tracing::debug!(grammar, modes = modes.len(), "compiled grammar");
	Ok(Compiled {
		modes,
		root: root_idx,
		illegal,
	})
}

struct Compiler<'b> {
	grammar: &'b str,
	defs: &'b [ModeDef],
	case_insensitive: bool,
	staged: Vec<Staged>,
	memo: FxHashMap<Key, ModeIdx>,
	group_counts: FxHashMap<Arc<str>, usize>,
	keyword_patterns: FxHashMap<String, Arc<Pattern>>,
	folded_tables: FxHashMap<*const KeywordTable, Arc<KeywordTable>>,
}

impl Compiler<'_> {
	fn validate(&self, root: ModeId) -> Result<()> {
		let Some(root_def) = self.defs.get(root.idx()) else {
			return Err(GrammarError::MissingRoot(self.grammar.to_string()));
		};
		if root_def.end.is_some() || !root_def.variants.is_empty() || root_def.ends_with_parent {
			return Err(GrammarError::InvalidRoot(self.grammar.to_string()));
		}
		for (i, def) in self.defs.iter().enumerate() {
			if let Some(missing) = def.references().find(|id| id.idx() >= self.defs.len()) {
				return Err(GrammarError::UnknownMode {
					grammar: self.grammar.to_string(),
					mode: ModeId(i as u32),
					missing,
				});
			}
		}
		Ok(())
	}

	fn pattern(&self, mode: ModeId, role: PatternRole, source: &str) -> Result<Pattern> {
		Pattern::new(source, self.case_insensitive).map_err(|error| GrammarError::InvalidPattern {
			grammar: self.grammar.to_string(),
			mode,
			role,
			pattern: source.to_string(),
			source: Box::new(error),
		})
	}

	fn stage_root(&mut self, root: ModeId) -> ModeIdx {
		let resolved = self.defs[root.idx()].clone();
		let idx = ModeIdx(self.staged.len() as u32);
		self.memo.insert((root, Some(u32::MAX), Vec::new()), idx);
		self.staged.push(Staged {
			def: root,
			resolved,
			begin: None,
			guard: BeginGuard::Always,
			end: None,
			terminators: Vec::new(),
			parent_terminators: Vec::new(),
		});
		idx
	}

	fn stage(&mut self, id: ModeId, variant: Option<usize>, parent_terminators: &[Arc<str>]) -> Result<ModeIdx> {
		let base = &self.defs[id.idx()];
		let mut resolved = match variant {
			Some(v) => base.merged(&base.variants[v]),
			None => base.clone(),
		};

		let own_end: Option<Arc<str>> = match (&resolved.end, resolved.ends_with_parent) {
			(Some(end), _) => Some(Arc::from(end.as_ref())),
			(None, false) => Some(Arc::from(IMPLICIT_END)),
			(None, true) => None,
		};
		let mut terminators: Vec<Arc<str>> = own_end.iter().cloned().collect();
		if resolved.ends_with_parent {
			for term in parent_terminators {
				if !terminators.contains(term) {
					terminators.push(term.clone());
				}
			}
		}

		let key_terminators = if resolved.ends_with_parent { terminators.clone() } else { Vec::new() };
		let key = (id, variant.map(|v| v as u32), key_terminators);
		if let Some(&idx) = self.memo.get(&key) {
			return Ok(idx);
		}

		let (begin_source, guard) = match &resolved.begin_keywords {
			Some(words) => {
				let alternatives: Vec<_> = words.split_whitespace().map(fancy_regex::escape).collect();
				if resolved.keywords.is_none() {
					let table = KeywordTable::builder().class("keyword", words.split_whitespace()).build()?;
					resolved.keywords = Some(Arc::new(table));
				}
				resolved.relevance.get_or_insert(0);
				(format!(r"\b(?:{})(?!\.)(?=\b|\s)", alternatives.join("|")), BeginGuard::NotAfterDot)
			}
			None => (resolved.begin.as_deref().unwrap_or(IMPLICIT_BEGIN).to_string(), BeginGuard::Always),
		};
		let begin = self.pattern(id, PatternRole::Begin, &begin_source)?;

		let end = match &own_end {
			Some(source) => {
				let end = self.pattern(id, PatternRole::End, source)?;
				self.group_counts.insert(source.clone(), end.group_count());
				Some(end)
			}
			None => None,
		};

		let idx = ModeIdx(self.staged.len() as u32);
		self.memo.insert(key, idx);
		self.staged.push(Staged {
			def: id,
			resolved,
			begin: Some(Begin {
				groups: begin.group_count(),
				source: begin_source,
			}),
			guard,
			end,
			terminators,
			parent_terminators: parent_terminators.to_vec(),
		});
		Ok(idx)
	}

	/// Stages the children and `starts` mode of an already staged mode.
	fn link(&mut self, idx: ModeIdx) -> Result<Linked> {
		let staged = &self.staged[idx.idx()];
		let contains = staged.resolved.contains.clone();
		let starts = staged.resolved.starts;
		let terminators = staged.terminators.clone();
		let parent_terminators = staged.parent_terminators.clone();

		let mut children = Vec::with_capacity(contains.len());
		for child in contains {
			match child {
				ModeRef::SelfRef => children.push(idx),
				ModeRef::Id(id) => {
					let variants = self.defs[id.idx()].variants.len();
					if variants == 0 {
						children.push(self.stage(id, None, &terminators)?);
					} else {
						for v in 0..variants {
							children.push(self.stage(id, Some(v), &terminators)?);
						}
					}
				}
			}
		}

		let starts = match starts {
			Some(id) => Some(self.stage(id, None, &parent_terminators)?),
			None => None,
		};
		Ok(Linked { children, starts })
	}

	fn rules(&self, idx: usize, children: &[ModeIdx]) -> Result<Vec<RuleSource>> {
		let staged = &self.staged[idx];
		let mut rules = Vec::with_capacity(children.len() + 2);

		if let Some(illegal) = &staged.resolved.illegal {
			let pattern = self.pattern(staged.def, PatternRole::Illegal, illegal)?;
			rules.push(RuleSource {
				rule: Rule::Illegal,
				source: illegal.to_string(),
				groups: pattern.group_count(),
			});
		}

		if !staged.terminators.is_empty() {
			let parts: Vec<(&str, usize)> = staged
				.terminators
				.iter()
				.map(|t| (t.as_ref(), self.group_counts.get(t).copied().unwrap_or(0)))
				.collect();
			let groups = parts.iter().map(|(_, g)| g).sum();
			let (source, _) = alternation(parts, false);
			rules.push(RuleSource {
				rule: Rule::End,
				source,
				groups,
			});
		}

		for &child in children {
			if let Some(begin) = &self.staged[child.idx()].begin {
				rules.push(RuleSource {
					rule: Rule::Begin(child),
					source: begin.source.clone(),
					groups: begin.groups,
				});
			}
		}
		Ok(rules)
	}

	fn keyword_pattern(&mut self, mode: ModeId, source: &str) -> Result<Arc<Pattern>> {
		if let Some(pattern) = self.keyword_patterns.get(source) {
			return Ok(pattern.clone());
		}
		let pattern = Arc::new(self.pattern(mode, PatternRole::KeywordPattern, source)?);
		self.keyword_patterns.insert(source.to_string(), pattern.clone());
		Ok(pattern)
	}

	fn keyword_table(&mut self, table: Arc<KeywordTable>) -> Arc<KeywordTable> {
		if !self.case_insensitive || table.is_case_insensitive() {
			return table;
		}
		self.folded_tables
			.entry(Arc::as_ptr(&table))
			.or_insert_with(|| Arc::new(table.folded()))
			.clone()
	}

	fn finish(&mut self, staged: Staged, starts: Option<ModeIdx>, rules: Vec<RuleSource>) -> Result<Mode> {
		let Staged {
			def, resolved, guard, end, ..
		} = staged;
		let keyword_pattern = self.keyword_pattern(def, resolved.keyword_pattern.as_deref().unwrap_or(DEFAULT_KEYWORD_PATTERN))?;
		let keywords = resolved.keywords.clone().map(|table| self.keyword_table(table));
		let matcher = TerminatorMatcher::new(rules, self.case_insensitive).map_err(|error| GrammarError::Combine {
			grammar: self.grammar.to_string(),
			mode: def,
			source: Box::new(error),
		})?;

		Ok(Mode {
			def,
			scope: resolved.scope.as_deref().map(Box::from),
			end,
			guard,
			keywords,
			keyword_pattern,
			relevance: resolved.relevance.unwrap_or(1),
			flags: ModeFlags::from_def(&resolved),
			starts,
			matcher,
		})
	}
}
