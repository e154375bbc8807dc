use std::sync::LazyLock;

use pretty_assertions::assert_eq;
use rstest::rstest;
use sheen_syntax::Grammar;

use super::*;

static PYTHON: LazyLock<Grammar> = LazyLock::new(|| grammar().unwrap());

fn raw(source: &str) -> Vec<(Option<&'static str>, &str)> {
	PYTHON.scan(source).map(|t| (t.scope, t.text(source))).collect()
}

fn lex(source: &str) -> Vec<(Option<&'static str>, &str)> {
	let mut out: Vec<(Option<&'static str>, std::ops::Range<usize>)> = Vec::new();
	for token in PYTHON.scan(source) {
		match out.last_mut() {
			Some((scope, span)) if *scope == token.scope => span.end = token.span.end,
			_ => out.push((token.scope, token.span)),
		}
	}
	out.into_iter().map(|(scope, span)| (scope, &source[span])).collect()
}

#[test]
fn grammar_builds_with_aliases() {
	assert_eq!(PYTHON.name(), "python");
	assert!(PYTHON.answers_to("py"));
	assert!(PYTHON.answers_to("IPython"));
	assert_eq!(PYTHON.illegal(), Some(r"(</|->|\?)|=>"));
}

#[test]
fn function_header_with_annotations() {
	let source = "def f(x: int) -> str:";
	assert_eq!(
		lex(source),
		vec![
			(Some("keyword"), "def"),
			(Some("function"), " "),
			(Some("title"), "f"),
			(Some("function"), "("),
			(Some("params"), "x: "),
			(Some("built_in"), "int"),
			(Some("function"), ") -> "),
			(Some("built_in"), "str"),
			(Some("function"), ":"),
		]
	);
	// def, params, annotation, int, return type, str.
	assert_eq!(PYTHON.relevance(source).relevance, 24);
}

#[test]
fn nested_format_substitutions() {
	let source = r#"f"{x:{y}}""#;
	assert_eq!(
		raw(source),
		vec![
			(Some("string"), "f\""),
			(Some("subst"), "{x:"),
			(Some("subst"), "{y}"),
			(Some("subst"), "}"),
			(Some("string"), "\""),
		]
	);

	let mut scan = PYTHON.scan(source);
	let mut deepest = 0;
	while scan.next().is_some() {
		deepest = deepest.max(scan.depth());
	}
	assert_eq!(deepest, 4);
}

#[test]
fn strings_nest_through_their_own_substitutions() {
	let source = r#"f"{f'{f"{x}"}'}" y"#;
	let tokens = raw(source);
	assert_eq!(tokens.iter().map(|(_, text)| *text).collect::<String>(), source);
	assert!(tokens.contains(&(Some("subst"), "{x}")));
	assert_eq!(tokens.last(), Some(&(None, " y")));

	let mut scan = PYTHON.scan(source);
	let mut deepest = 0;
	while scan.next().is_some() {
		deepest = deepest.max(scan.depth());
	}
	// root, then string and subst three times over.
	assert_eq!(deepest, 7);
	assert!(!scan.finish().illegal);
}

#[test]
fn doubled_braces_are_literal() {
	let source = r#"f"{{x}}""#;
	assert_eq!(lex(source), vec![(Some("string"), source)]);
}

#[test]
fn illegal_inside_substitution() {
	let source = r#"f"{x#}""#;
	assert_eq!(raw(source), vec![(Some("string"), "f\""), (None, r#"{x#}""#)]);
	assert!(PYTHON.relevance(source).illegal);
}

#[rstest]
#[case::imaginary_with_separators("1_000_000j")]
#[case::binary("0b_1010")]
#[case::octal("0o777")]
#[case::hex("0xDEAD_beef")]
#[case::point_float("3.14")]
#[case::leading_point(".5")]
#[case::exponent("1e10")]
#[case::long("10l")]
#[case::imaginary("2j")]
#[case::everything("1_0.5_0e+1_0j")]
fn numbers_are_single_tokens(#[case] source: &str) {
	assert_eq!(raw(source), vec![(Some("number"), source)]);
}

#[test]
fn unterminated_triple_quoted_string() {
	let source = "'''abc\ndef x():\n    pass";
	assert_eq!(raw(source), vec![(Some("string"), source)]);
	assert!(!PYTHON.relevance(source).illegal);
}

#[rstest]
#[case("'single'")]
#[case("\"double\"")]
#[case("b'bytes'")]
#[case("rb\"raw bytes\"")]
#[case("u'unicode'")]
#[case("\"\"\"doc\nstring\"\"\"")]
#[case(r"'it\'s'")]
fn string_prefixes(#[case] source: &str) {
	assert_eq!(lex(source), vec![(Some("string"), source)]);
}

#[test]
fn decorated_method() {
	let source = "@property\ndef x(self): pass";
	assert_eq!(
		lex(source),
		vec![
			(Some("meta"), "@property"),
			(None, "\n"),
			(Some("keyword"), "def"),
			(Some("function"), " "),
			(Some("title"), "x"),
			(Some("function"), "("),
			(Some("params"), "self"),
			(Some("function"), "):"),
			(None, " "),
			(Some("keyword"), "pass"),
		]
	);
}

#[test]
fn type_comment_wins_over_plain_comment() {
	let source = "x = []  # type: List[int]";
	assert_eq!(
		lex(source),
		vec![
			(None, "x = []  "),
			(Some("comment"), "# type: "),
			(Some("built_in"), "List"),
			(Some("type"), "[int]"),
		]
	);
}

#[test]
fn interactive_prompt() {
	let source = ">>> print(\"hi\")";
	assert_eq!(
		lex(source),
		vec![(Some("meta"), ">>> "), (None, "print("), (Some("string"), "\"hi\""), (None, ")")]
	);
}

#[test]
fn arrow_outside_a_header_is_illegal() {
	let source = "x -> y";
	assert_eq!(raw(source), vec![(None, source)]);
	assert_eq!(PYTHON.relevance(source).detection_score(), 0);
}

#[test]
fn keywords_classify_at_top_level() {
	let source = "return None";
	assert_eq!(lex(source), vec![(Some("keyword"), "return"), (None, " "), (Some("literal"), "None")]);
}

#[test]
fn nonlocal_is_a_strong_signal() {
	assert_eq!(PYTHON.relevance("nonlocal").relevance, 10);
}
