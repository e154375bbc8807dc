//! The mode stack machine.
//!
//! A [`Scanner`] keeps a stack of open modes with the root at the bottom. At
//! every step it searches the top mode's combined matcher from the cursor and
//! acts on the nearest hit:
//!
//! * `illegal`: classification is abandoned; everything not yet emitted is
//!   yielded as one unscoped token and the scan closes.
//! * end: the text up to (or including) the delimiter is emitted in the
//!   ending mode and the mode is popped, along with any parents it ends.
//! * child begin: pending text is emitted in the current mode and the child
//!   is pushed.
//! * nothing: the rest of the input is emitted in the current mode and the
//!   scan closes, implicitly closing every open mode.
//!
//! Text is never copied. The scanner tracks `flushed`, the offset up to which
//! tokens have been produced, and every emission covers `flushed..upto`, so
//! the token stream always reconstructs the input exactly.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::Range;

use smallvec::{SmallVec, smallvec};

use crate::compile::{Mode, ModeFlags, ModeIdx};
use crate::grammar::Grammar;
use crate::keywords::KeywordTable;
use crate::matcher::{Rule, RuleMatch};
use crate::options::ScanOptions;
use crate::pattern::{Pattern, next_char_boundary};
use crate::relevance::Relevance;
use crate::token::{ScanReport, Token};

/// Steps without cursor progress after which a scan is considered stuck.
const MAX_STALLED_STEPS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	Scanning,
	Closed,
}

#[derive(Debug, Clone, Copy)]
struct LastMatch {
	begin: bool,
	at: usize,
}

/// A single scan of one text with one grammar.
///
/// Yields tokens lazily in source order. The scan cannot be restarted; the
/// detection score is available from [`Scanner::report`] at any time and is
/// final once the iterator is exhausted.
#[derive(Debug)]
pub struct Scanner<'g, 's> {
	grammar: &'g Grammar,
	text: &'s str,
	options: ScanOptions,
	stack: SmallVec<[ModeIdx; 8]>,
	cursor: usize,
	flushed: usize,
	/// Rule index to resume from after a rejected begin match.
	resume: Option<usize>,
	last: Option<LastMatch>,
	stalled: u32,
	state: State,
	queue: VecDeque<Token<'g>>,
	relevance: Relevance<'s>,
	illegal: bool,
}

impl<'g, 's> Scanner<'g, 's> {
	pub(crate) fn new(grammar: &'g Grammar, text: &'s str, options: ScanOptions) -> Self {
		Self {
			grammar,
			text,
			options,
			stack: smallvec![grammar.root()],
			cursor: 0,
			flushed: 0,
			resume: None,
			last: None,
			stalled: 0,
			state: State::Scanning,
			queue: VecDeque::new(),
			relevance: Relevance::new(),
			illegal: false,
		}
	}

	/// Detection report so far.
	pub fn report(&self) -> ScanReport {
		ScanReport {
			relevance: self.relevance.score(),
			illegal: self.illegal,
		}
	}

	/// Drains the remaining tokens and returns the final report.
	pub fn finish(mut self) -> ScanReport {
		self.by_ref().for_each(drop);
		self.report()
	}

	/// Number of open modes, root included.
	pub fn depth(&self) -> usize {
		self.stack.len()
	}

	pub fn is_closed(&self) -> bool {
		self.state == State::Closed
	}

	fn top(&self) -> &'g Mode {
		let grammar = self.grammar;
		grammar.mode(self.stack[self.stack.len() - 1])
	}

	/// Scope of the nearest open mode that has one.
	fn scope(&self) -> Option<&'g str> {
		let grammar = self.grammar;
		self.stack
			.iter()
			.rev()
			.map(|&idx| grammar.mode(idx))
			.find(|mode| mode.scope.is_some() && !mode.has(ModeFlags::SKIP))
			.and_then(|mode| mode.scope.as_deref())
	}

	fn step(&mut self) {
		let before = self.cursor;
		let mode = self.top();
		let resume = self.resume.take();

		let Some(RuleMatch { rule, index, range }) = mode.matcher.find(self.text, self.cursor, resume) else {
			self.close();
			return;
		};

		// A zero-width end right where a begin just matched would reopen the
		// same mode forever; let the character through as text instead.
		if range.is_empty() && rule == Rule::End && self.last.is_some_and(|last| last.begin && last.at == range.start) {
			self.consume_char(range.start);
			return;
		}
		self.last = Some(LastMatch {
			begin: matches!(rule, Rule::Begin(_)),
			at: range.start,
		});

		match rule {
			Rule::Begin(child) => self.begin(child, index, range),
			Rule::Illegal if !self.options.ignore_illegals => self.abort(range),
			Rule::Illegal => self.consume_text(range),
			Rule::End => {
				if !self.end(range.clone()) {
					self.consume_text(range);
				}
			}
		}

		if self.state == State::Scanning && self.cursor <= before {
			self.stalled += 1;
			if self.stalled > MAX_STALLED_STEPS {
				tracing::warn!(grammar = self.grammar.name(), at = self.cursor, "scan made no progress; remainder left unscoped");
				self.abandon();
			}
		} else {
			self.stalled = 0;
		}
	}

	fn begin(&mut self, child: ModeIdx, index: usize, range: Range<usize>) {
		let grammar = self.grammar;
		let mode = grammar.mode(child);

		if !mode.guard.allows(self.text, range.start) {
			if index + 1 >= self.top().matcher.rule_count() {
				self.consume_char(range.start);
			} else {
				self.cursor = range.start;
				self.resume = Some(index + 1);
			}
			return;
		}

		if mode.has(ModeFlags::SKIP) {
			self.cursor = range.end;
		} else {
			if mode.has(ModeFlags::EXCLUDE_BEGIN) {
				self.flush(range.end);
				self.cursor = range.end;
			} else {
				self.flush(range.start);
				self.cursor = if mode.has(ModeFlags::RETURN_BEGIN) { range.start } else { range.end };
			}
			self.relevance.add_mode(mode.relevance);
		}

		tracing::trace!(mode = %mode.def, at = range.start, depth = self.stack.len(), "begin");
		self.stack.push(child);
	}

	/// Handles an end match. Returns false when no open mode actually ends
	/// at `range`, in which case the lexeme is ordinary text.
	fn end(&mut self, range: Range<usize>) -> bool {
		let Some(depth) = self.ending_depth(range.start) else {
			return false;
		};
		let grammar = self.grammar;
		let origin = self.top();

		if origin.has(ModeFlags::SKIP) {
			self.cursor = range.end;
		} else if origin.has(ModeFlags::RETURN_END) {
			self.flush(range.start);
			self.cursor = range.start;
		} else if origin.has(ModeFlags::EXCLUDE_END) {
			self.flush(range.start);
			self.cursor = range.end;
		} else {
			self.flush(range.end);
			self.cursor = range.end;
		}

		let ended = grammar.mode(self.stack[depth]);
		tracing::trace!(mode = %ended.def, at = range.start, closed = self.stack.len() - depth, "end");
		self.stack.truncate(depth);

		if let Some(next) = ended.starts {
			let started = grammar.mode(next);
			if !started.has(ModeFlags::SKIP) {
				self.relevance.add_mode(started.relevance);
			}
			self.stack.push(next);
		}
		true
	}

	/// Stack index of the outermost mode closed by an end match at `pos`.
	fn ending_depth(&self, pos: usize) -> Option<usize> {
		let grammar = self.grammar;
		let mut depth = self.stack.len() - 1;
		while depth > 0 {
			let mode = grammar.mode(self.stack[depth]);
			if mode.end.as_ref().is_some_and(|end| end.match_at(self.text, pos).is_some()) {
				while depth > 1 && grammar.mode(self.stack[depth]).has(ModeFlags::ENDS_PARENT) {
					depth -= 1;
				}
				return Some(depth);
			}
			if !mode.has(ModeFlags::ENDS_WITH_PARENT) {
				return None;
			}
			depth -= 1;
		}
		None
	}

	/// Keeps a lexeme as plain text of the current mode.
	fn consume_text(&mut self, range: Range<usize>) {
		if range.is_empty() {
			self.consume_char(range.start);
		} else {
			self.cursor = range.end;
		}
	}

	fn consume_char(&mut self, pos: usize) {
		match next_char_boundary(self.text, pos) {
			Some(next) => self.cursor = next,
			None => self.close(),
		}
	}

	fn abort(&mut self, range: Range<usize>) {
		let at = range.start;
		tracing::debug!(
			grammar = self.grammar.name(),
			at,
			lexeme = &self.text[range],
			"illegal lexeme; remainder left unscoped"
		);
		self.illegal = true;
		self.abandon();
	}

	/// Emits everything not yet emitted as unscoped text and closes.
	fn abandon(&mut self) {
		let len = self.text.len();
		if self.flushed < len {
			self.queue.push_back(Token::new(None, self.flushed..len));
		}
		self.flushed = len;
		self.cursor = len;
		self.state = State::Closed;
	}

	fn close(&mut self) {
		self.flush(self.text.len());
		self.cursor = self.text.len();
		self.state = State::Closed;
	}

	/// Emits `flushed..upto` as text of the top mode.
	fn flush(&mut self, upto: usize) {
		if upto <= self.flushed {
			return;
		}
		let span = self.flushed..upto;
		self.flushed = upto;

		let mode = self.top();
		let scope = self.scope();
		match &mode.keywords {
			Some(table) => self.classify(table, &mode.keyword_pattern, span, scope),
			None => self.queue.push_back(Token::new(scope, span)),
		}
	}

	/// Splits `span` into keyword tokens and plain runs.
	fn classify(&mut self, table: &'g KeywordTable, pattern: &'g Pattern, span: Range<usize>, scope: Option<&'g str>) {
		let text: &'s str = self.text;
		let base = span.start;
		let slice = &text[span];
		let mut plain = 0;
		let mut at = 0;

		while let Some(found) = pattern.find_at(slice, at) {
			if found.is_empty() {
				match next_char_boundary(slice, found.start) {
					Some(next) => {
						at = next;
						continue;
					}
					None => break,
				}
			}

			let word = &slice[found.clone()];
			if let Some(class) = table.classify(word) {
				let key = if table.is_case_insensitive() { Cow::Owned(word.to_lowercase()) } else { Cow::Borrowed(word) };
				self.relevance.add_keyword(key, class.relevance);
				if !class.is_hidden() {
					if plain < found.start {
						self.queue.push_back(Token::new(scope, base + plain..base + found.start));
					}
					self.queue.push_back(Token::new(Some(class.class), base + found.start..base + found.end));
					plain = found.end;
				}
			}
			at = found.end;
		}

		if plain < slice.len() {
			self.queue.push_back(Token::new(scope, base + plain..base + slice.len()));
		}
	}
}

impl<'g> Iterator for Scanner<'g, '_> {
	type Item = Token<'g>;

	fn next(&mut self) -> Option<Token<'g>> {
		loop {
			if let Some(token) = self.queue.pop_front() {
				return Some(token);
			}
			if self.state == State::Closed {
				return None;
			}
			self.step();
		}
	}
}

impl FusedIterator for Scanner<'_, '_> {}

#[cfg(test)]
mod tests;
