use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::keywords::KeywordTable;
use crate::mode::{ModeDef, ModeRef};
use crate::options::ScanOptions;
use crate::{Grammar, GrammarBuilder};

fn mode(scope: &'static str, begin: &'static str, end: &'static str) -> ModeDef {
	ModeDef {
		scope: Some(scope.into()),
		begin: Some(begin.into()),
		end: Some(end.into()),
		..ModeDef::default()
	}
}

fn grammar(build: impl FnOnce(&mut GrammarBuilder) -> ModeDef) -> Grammar {
	let mut builder = GrammarBuilder::new("test");
	let root = build(&mut builder);
	builder.set_root(root);
	builder.build().unwrap()
}

/// A small language: keywords, quoted strings with escapes, line comments
/// and nested parentheses.
fn toy() -> Grammar {
	grammar(|b| {
		let escape = b.add(ModeDef {
			begin: Some(r"\\[\s\S]".into()),
			relevance: Some(0),
			..ModeDef::default()
		});
		let string = b.add(ModeDef {
			illegal: Some(r"\n".into()),
			contains: vec![escape.into()],
			..mode("string", "'", "'")
		});
		let comment = b.add(mode("comment", "#", "$"));
		let paren = b.add(ModeDef {
			contains: vec![string.into(), ModeRef::SelfRef],
			..mode("paren", r"\(", r"\)")
		});
		let keywords = KeywordTable::builder()
			.class("keyword", ["def", "class", "return"])
			.class("literal", ["None", "True"])
			.class("built_in", ["print"])
			.build()
			.unwrap();
		ModeDef {
			keywords: Some(Arc::new(keywords)),
			illegal: Some("=>".into()),
			contains: vec![string.into(), comment.into(), paren.into()],
			..ModeDef::default()
		}
	})
}

fn raw<'g, 's>(grammar: &'g Grammar, source: &'s str) -> Vec<(Option<&'g str>, &'s str)> {
	grammar.scan(source).map(|t| (t.scope, t.text(source))).collect()
}

/// Tokens with adjacent runs of the same scope joined.
fn lex<'g, 's>(grammar: &'g Grammar, source: &'s str) -> Vec<(Option<&'g str>, &'s str)> {
	let mut out: Vec<(Option<&'g str>, std::ops::Range<usize>)> = Vec::new();
	for token in grammar.scan(source) {
		match out.last_mut() {
			Some((scope, span)) if *scope == token.scope => span.end = token.span.end,
			_ => out.push((token.scope, token.span)),
		}
	}
	out.into_iter().map(|(scope, span)| (scope, &source[span])).collect()
}

fn concat(grammar: &Grammar, source: &str, options: ScanOptions) -> String {
	grammar.scan_with(source, options).map(|t| t.text(source)).collect()
}

#[test]
fn keywords_strings_and_comments() {
	let g = toy();
	let source = r"def f(): return 'a\'b' # done";
	assert_eq!(
		lex(&g, source),
		vec![
			(Some("keyword"), "def"),
			(None, " f"),
			(Some("paren"), "()"),
			(None, ": "),
			(Some("keyword"), "return"),
			(None, " "),
			(Some("string"), r"'a\'b'"),
			(None, " "),
			(Some("comment"), "# done"),
		]
	);
}

#[test]
fn relevance_counts_modes_and_keywords() {
	let g = toy();
	// def + return, paren, string (escape is worth 0), comment.
	let report = g.relevance(r"def f(): return 'a\'b' # done");
	assert_eq!(report.relevance, 5);
	assert!(!report.illegal);
}

#[test]
fn empty_input_yields_nothing() {
	let g = toy();
	let mut scan = g.scan("");
	assert_eq!(scan.next(), None);
	assert!(scan.is_closed());
	assert_eq!(scan.report().relevance, 0);
}

#[test]
fn unterminated_mode_runs_to_end_of_input() {
	let g = toy();
	assert_eq!(lex(&g, "x = 'abc"), vec![(None, "x = "), (Some("string"), "'abc")]);
}

#[test]
fn illegal_abandons_classification() {
	let g = toy();
	let source = "def x => 'y'";
	assert_eq!(raw(&g, source), vec![(None, source)]);

	let report = g.relevance(source);
	assert!(report.illegal);
	assert_eq!(report.detection_score(), 0);
}

#[test]
fn illegal_inside_child_mode() {
	let g = toy();
	let source = "return 'ab\ncd'";
	assert_eq!(lex(&g, source), vec![(Some("keyword"), "return"), (None, " 'ab\ncd'")]);
}

#[test]
fn ignore_illegals_keeps_scanning() {
	let g = toy();
	let source = "x => 'y'";
	let options = ScanOptions { ignore_illegals: true };
	let tokens: Vec<_> = g.scan_with(source, options).map(|t| (t.scope, t.text(source))).collect();
	assert_eq!(tokens, vec![(None, "x => "), (Some("string"), "'y'")]);

	let mut scan = g.scan_with(source, options);
	scan.by_ref().for_each(drop);
	assert!(!scan.report().illegal);
}

#[test]
fn illegal_wins_ties_with_end() {
	let g = grammar(|b| {
		let tag = b.add(ModeDef {
			illegal: Some(">".into()),
			..mode("tag", "<", ">")
		});
		ModeDef {
			contains: vec![tag.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(raw(&g, "<a>"), vec![(None, "<a>")]);
}

#[test]
fn end_wins_ties_with_child_begin() {
	let g = grammar(|b| {
		let inner = b.add(mode("inner", r"\]\]", "x"));
		let block = b.add(ModeDef {
			contains: vec![inner.into()],
			..mode("block", r"\[", r"\]")
		});
		ModeDef {
			contains: vec![block.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(lex(&g, "[x]]"), vec![(Some("block"), "[x]"), (None, "]")]);
}

#[test]
fn self_reference_nests() {
	let g = toy();
	let mut scan = g.scan("(((x)))");
	let mut deepest = 0;
	while scan.next().is_some() {
		deepest = deepest.max(scan.depth());
	}
	assert_eq!(deepest, 4);
	assert_eq!(scan.depth(), 1);
}

#[test]
fn nested_child_inherits_scope_of_enclosing_mode() {
	let g = toy();
	assert_eq!(
		lex(&g, "print('x', (y))"),
		vec![
			(Some("built_in"), "print"),
			(Some("paren"), "("),
			(Some("string"), "'x'"),
			(Some("paren"), ", (y))"),
		]
	);
}

#[test]
fn exclude_begin_and_end_leave_delimiters_outside() {
	let g = grammar(|b| {
		let attr = b.add(ModeDef {
			exclude_begin: true,
			exclude_end: true,
			..mode("attr", r"\[", r"\]")
		});
		ModeDef {
			contains: vec![attr.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(lex(&g, "x[y]z"), vec![(None, "x["), (Some("attr"), "y"), (None, "]z")]);
}

#[test]
fn return_end_hands_the_delimiter_back() {
	let g = grammar(|b| {
		let ty = b.add(ModeDef {
			return_end: true,
			..mode("type", ":", r"\)")
		});
		let params = b.add(ModeDef {
			contains: vec![ty.into()],
			..mode("params", r"\(", r"\)")
		});
		ModeDef {
			contains: vec![params.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(
		lex(&g, "(x: int)!"),
		vec![(Some("params"), "(x"), (Some("type"), ": int"), (Some("params"), ")"), (None, "!")]
	);
}

#[test]
fn return_begin_rescans_the_lexeme_inside_the_child() {
	let g = grammar(|b| {
		let name = b.add(mode("title", "[a-z]+", r"\B|\b"));
		let call = b.add(ModeDef {
			return_begin: true,
			contains: vec![name.into()],
			..mode("call", r"\w+\(", r"\)")
		});
		ModeDef {
			contains: vec![call.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(lex(&g, "f(1)"), vec![(Some("title"), "f"), (Some("call"), "(1)")]);
}

#[test]
fn ends_parent_closes_the_enclosing_mode() {
	let g = grammar(|b| {
		let value = b.add(ModeDef {
			ends_parent: true,
			..mode("value", ":", ",")
		});
		let object = b.add(ModeDef {
			contains: vec![value.into()],
			..mode("object", r"\{", r"\}")
		});
		ModeDef {
			contains: vec![object.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(lex(&g, "{a:1,b}"), vec![(Some("object"), "{a"), (Some("value"), ":1,"), (None, "b}")]);
}

#[test]
fn ends_with_parent_closes_on_parent_end() {
	let g = grammar(|b| {
		let attr = b.add(ModeDef {
			scope: Some("attr".into()),
			begin: Some(r"\w+=".into()),
			ends_with_parent: true,
			..ModeDef::default()
		});
		let tag = b.add(ModeDef {
			contains: vec![attr.into()],
			..mode("tag", "<", ">")
		});
		ModeDef {
			contains: vec![tag.into()],
			..ModeDef::default()
		}
	});
	let mut scan = g.scan("<a b=c>d");
	let tokens: Vec<_> = scan.by_ref().map(|t| t.scope).collect();
	assert_eq!(tokens.last(), Some(&None));
	assert_eq!(scan.depth(), 1);
	assert_eq!(lex(&g, "<a b=c>d"), vec![(Some("tag"), "<a "), (Some("attr"), "b=c>"), (None, "d")]);
}

#[test]
fn starts_opens_a_follow_up_mode() {
	let g = grammar(|b| {
		let value = b.add(ModeDef {
			scope: Some("value".into()),
			end: Some("$".into()),
			..ModeDef::default()
		});
		let label = b.add(ModeDef {
			starts: Some(value),
			..mode("label", r"\w+:", r"\B|\b")
		});
		ModeDef {
			contains: vec![label.into()],
			..ModeDef::default()
		}
	});
	let source = "key: val\nx";
	assert_eq!(lex(&g, source), vec![(Some("label"), "key:"), (Some("value"), " val"), (None, "\nx")]);
	assert_eq!(g.relevance(source).relevance, 2);
}

#[test]
fn skip_mode_stays_in_parent_token() {
	let g = grammar(|b| {
		let doubled = b.add(ModeDef {
			begin: Some("''".into()),
			skip: true,
			..ModeDef::default()
		});
		let string = b.add(ModeDef {
			contains: vec![doubled.into()],
			..mode("string", "'", "'(?!')")
		});
		ModeDef {
			contains: vec![string.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(raw(&g, "'a''b' c"), vec![(Some("string"), "'a''b'"), (None, " c")]);
}

#[test]
fn begin_keywords_skip_member_access() {
	let g = grammar(|b| {
		let function = b.add(ModeDef {
			scope: Some("function".into()),
			begin_keywords: Some("def".into()),
			end: Some(":".into()),
			..ModeDef::default()
		});
		ModeDef {
			contains: vec![function.into()],
			..ModeDef::default()
		}
	});
	let source = "a.def b\ndef c:";
	assert_eq!(
		lex(&g, source),
		vec![(None, "a.def b\n"), (Some("keyword"), "def"), (Some("function"), " c:")]
	);
	// Only the keyword scores; begin_keywords modes default to 0.
	assert_eq!(g.relevance(source).relevance, 1);
}

#[test]
fn rejected_begin_resumes_with_later_rules() {
	let g = grammar(|b| {
		let function = b.add(ModeDef {
			scope: Some("function".into()),
			begin_keywords: Some("def".into()),
			end: Some(":".into()),
			..ModeDef::default()
		});
		let ident = b.add(mode("ident", r"\w+", r"\B|\b"));
		ModeDef {
			contains: vec![function.into(), ident.into()],
			..ModeDef::default()
		}
	});
	assert_eq!(lex(&g, "x.def"), vec![(Some("ident"), "x"), (None, "."), (Some("ident"), "def")]);
}

#[test]
fn zero_width_modes_terminate() {
	let g = grammar(|b| {
		let marker = b.add(mode("marker", "(?=a)", "(?=a)"));
		ModeDef {
			contains: vec![marker.into()],
			..ModeDef::default()
		}
	});
	let tokens = raw(&g, "aa");
	assert!(tokens.iter().all(|(scope, _)| *scope == Some("marker")));
	assert_eq!(tokens.iter().map(|(_, text)| *text).collect::<String>(), "aa");
}

#[test]
fn keyword_hits_are_capped() {
	let g = grammar(|_| ModeDef {
		keywords: Some(Arc::new(KeywordTable::builder().class("keyword", ["x|3"]).build().unwrap())),
		..ModeDef::default()
	});
	let source = vec!["x"; 10].join(" ");
	assert_eq!(g.relevance(&source).relevance, 21);
}

#[test]
fn hidden_keywords_score_but_stay_plain() {
	let g = grammar(|_| ModeDef {
		keywords: Some(Arc::new(
			KeywordTable::builder()
				.class("_hidden", ["secret|5"])
				.class("keyword", ["open"])
				.build()
				.unwrap(),
		)),
		..ModeDef::default()
	});
	let source = "open secret";
	assert_eq!(lex(&g, source), vec![(Some("keyword"), "open"), (None, " secret")]);
	assert_eq!(g.relevance(source).relevance, 6);
}

#[test]
fn keywords_fold_case_in_case_insensitive_grammars() {
	let mut builder = GrammarBuilder::new("sql").with_case_insensitive(true);
	builder.set_root(ModeDef {
		keywords: Some(Arc::new(KeywordTable::builder().class("keyword", ["select"]).build().unwrap())),
		..ModeDef::default()
	});
	let g = builder.build().unwrap();
	assert_eq!(lex(&g, "SELECT x"), vec![(Some("keyword"), "SELECT"), (None, " x")]);
}

#[test]
fn keyword_cap_ignores_case_in_case_insensitive_grammars() {
	let mut builder = GrammarBuilder::new("sql").with_case_insensitive(true);
	builder.set_root(ModeDef {
		keywords: Some(Arc::new(KeywordTable::builder().class("keyword", ["select|3"]).build().unwrap())),
		..ModeDef::default()
	});
	let g = builder.build().unwrap();
	let source = ["SELECT", "select", "Select"].repeat(4).join(" ");
	assert_eq!(g.relevance(&source).relevance, 21);
}

#[test]
fn first_matching_child_in_contains_order_wins() {
	let build = |swapped: bool| {
		grammar(|b| {
			let short = b.add(ModeDef {
				scope: Some("a".into()),
				begin: Some("ab".into()),
				..ModeDef::default()
			});
			let long = b.add(ModeDef {
				scope: Some("b".into()),
				begin: Some("abc".into()),
				..ModeDef::default()
			});
			let contains = if swapped { vec![long.into(), short.into()] } else { vec![short.into(), long.into()] };
			ModeDef {
				contains,
				..ModeDef::default()
			}
		})
	};
	let in_order = build(false);
	let swapped = build(true);
	assert_eq!(raw(&in_order, "abcd"), vec![(Some("a"), "ab"), (None, "cd")]);
	assert_eq!(raw(&swapped, "abcd"), vec![(Some("b"), "abc"), (None, "d")]);
}

#[test]
fn multibyte_text_stays_on_char_boundaries() {
	let g = toy();
	let source = "é => ü 'ß\\é' #🦀";
	assert_eq!(concat(&g, source, ScanOptions { ignore_illegals: true }), source);
	assert_eq!(concat(&g, source, ScanOptions::default()), source);
}

proptest! {
	#[test]
	fn token_stream_reconstructs_input(source in "[a-zé '\\\\#()=>\n.]{0,64}", ignore_illegals in any::<bool>()) {
		let g = toy();
		let options = ScanOptions { ignore_illegals };
		let tokens: Vec<_> = g.scan_with(&source, options).collect();

		let mut at = 0;
		for token in &tokens {
			prop_assert_eq!(token.span.start, at);
			prop_assert!(!token.is_empty());
			at = token.span.end;
		}
		prop_assert_eq!(at, source.len());
	}

	#[test]
	fn scans_are_deterministic(source in "[a-z '\\\\#()=>\n]{0,64}") {
		let g = toy();
		let first: Vec<_> = g.scan(&source).collect();
		let second: Vec<_> = g.scan(&source).collect();
		prop_assert_eq!(first, second);
		prop_assert_eq!(g.relevance(&source), g.relevance(&source));
	}
}
