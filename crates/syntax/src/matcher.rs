//! Combined per-mode terminator matching.
//!
//! Every compiled mode owns one [`TerminatorMatcher`]: a single alternation
//! over its own `illegal` pattern, its end terminators and the `begin`
//! pattern of each child, in that priority order. Each alternative is wrapped
//! in a capture group so the winner of a search can be identified, and
//! numeric backreferences inside alternatives are renumbered to stay
//! pointed at their own groups.
//!
//! The full alternation is compiled when the grammar is built. When a begin
//! match is rejected after the fact, scanning resumes at the same position
//! with only the later alternatives; those suffix matchers are compiled on
//! first use and cached.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::OnceLock;

use fancy_regex::Regex;

use crate::compile::ModeIdx;
use crate::pattern::{compile, next_char_boundary};

/// What an alternative of a [`TerminatorMatcher`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rule {
	Illegal,
	End,
	Begin(ModeIdx),
}

/// One alternative before combination.
#[derive(Debug, Clone)]
pub(crate) struct RuleSource {
	pub(crate) rule: Rule,
	pub(crate) source: String,
	/// Capture groups inside `source`.
	pub(crate) groups: usize,
}

/// A successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuleMatch {
	pub(crate) rule: Rule,
	/// Position of the winning rule in priority order.
	pub(crate) index: usize,
	pub(crate) range: Range<usize>,
}

#[derive(Debug)]
struct Combined {
	regex: Regex,
	/// Capture group index wrapping each alternative.
	group_of: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct TerminatorMatcher {
	rules: Vec<RuleSource>,
	case_insensitive: bool,
	full: Option<Combined>,
	/// `suffixes[k - 1]` matches rules `k..`.
	suffixes: Box<[OnceLock<Option<Combined>>]>,
}

impl TerminatorMatcher {
	pub(crate) fn new(rules: Vec<RuleSource>, case_insensitive: bool) -> Result<Self, fancy_regex::Error> {
		let full = if rules.is_empty() {
			None
		} else {
			Some(combine(&rules, case_insensitive)?)
		};
		let suffixes = (1..rules.len()).map(|_| OnceLock::new()).collect();
		Ok(Self {
			rules,
			case_insensitive,
			full,
			suffixes,
		})
	}

	pub(crate) fn rule_count(&self) -> usize {
		self.rules.len()
	}

	/// Finds the nearest rule match at or after `pos`.
	///
	/// With `resume_from`, a match of rules `resume_from..` exactly at `pos`
	/// is preferred; failing that, the full alternation is searched from the
	/// next character, since everything at `pos` has already been rejected.
	pub(crate) fn find(&self, text: &str, pos: usize, resume_from: Option<usize>) -> Option<RuleMatch> {
		match resume_from {
			Some(first) if first > 0 => {
				if let Some(found) = self.search(first, text, pos)
					&& found.range.start == pos
				{
					return Some(found);
				}
				let next = next_char_boundary(text, pos)?;
				self.search(0, text, next)
			}
			_ => self.search(0, text, pos),
		}
	}

	fn search(&self, first: usize, text: &str, pos: usize) -> Option<RuleMatch> {
		let combined = if first == 0 {
			self.full.as_ref()?
		} else {
			self.suffixes
				.get(first - 1)?
				.get_or_init(|| match combine(&self.rules[first..], self.case_insensitive) {
					Ok(combined) => Some(combined),
					Err(error) => {
						tracing::warn!(first, %error, "failed to compile resumed matcher");
						None
					}
				})
				.as_ref()?
		};

		let captures = match combined.regex.captures_from_pos(text, pos) {
			Ok(captures) => captures?,
			Err(error) => {
				tracing::warn!(pos, %error, "terminator search failed; treating as no match");
				return None;
			}
		};
		let (offset, group) = combined
			.group_of
			.iter()
			.enumerate()
			.find_map(|(offset, &group)| captures.get(group).map(|m| (offset, m)))?;
		let index = first + offset;
		Some(RuleMatch {
			rule: self.rules[index].rule,
			index,
			range: group.start()..group.end(),
		})
	}
}

fn combine(rules: &[RuleSource], case_insensitive: bool) -> Result<Combined, fancy_regex::Error> {
	let (source, group_of) = alternation(rules.iter().map(|r| (r.source.as_str(), r.groups)), true);
	Ok(Combined {
		regex: compile(&source, case_insensitive)?,
		group_of,
	})
}

/// Joins `parts` into one alternation.
///
/// With `capture`, each part is wrapped in a capture group and the returned
/// vector holds that group's index per part; otherwise parts are wrapped in
/// non-capturing groups and the vector is empty. Backreferences are shifted
/// by the number of groups that precede each part.
pub(crate) fn alternation<'a>(parts: impl IntoIterator<Item = (&'a str, usize)>, capture: bool) -> (String, Vec<usize>) {
	let mut out = String::new();
	let mut group_of = Vec::new();
	let mut groups = 0usize;
	for (i, (source, inner)) in parts.into_iter().enumerate() {
		if i > 0 {
			out.push('|');
		}
		if capture {
			groups += 1;
			group_of.push(groups);
			out.push('(');
		} else {
			out.push_str("(?:");
		}
		out.push_str(&shift_backreferences(source, groups));
		out.push(')');
		groups += inner;
	}
	(out, group_of)
}

/// Adds `offset` to every numeric backreference outside character classes.
pub(crate) fn shift_backreferences(source: &str, offset: usize) -> Cow<'_, str> {
	if offset == 0 || !source.contains('\\') {
		return Cow::Borrowed(source);
	}

	let mut out = String::with_capacity(source.len() + 4);
	let mut chars = source.chars().peekable();
	let mut in_class = false;
	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				let Some(&next) = chars.peek() else {
					out.push(c);
					break;
				};
				if !in_class && matches!(next, '1'..='9') {
					let mut number = 0usize;
					while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
						number = number * 10 + digit as usize;
						chars.next();
					}
					let _ = write!(out, "\\{}", number + offset);
				} else {
					out.push(c);
					out.push(next);
					chars.next();
				}
			}
			'[' if !in_class => {
				in_class = true;
				out.push(c);
			}
			']' if in_class => {
				in_class = false;
				out.push(c);
			}
			_ => out.push(c),
		}
	}
	Cow::Owned(out)
}
