//! Python.
//!
//! Covers Python 3 with the Python 2 leftovers that still show up in the
//! wild (`u''` strings, `L` long suffixes), interactive prompts, f-strings
//! with nested substitutions, type annotations and `# type:` comments.

use std::sync::Arc;

use sheen_syntax::{Grammar, GrammarBuilder, KeywordTable, ModeDef, ModeRef, Result};

use crate::common::Common;

pub const NAME: &str = "python";
pub const ALIASES: &[&str] = &["py", "gyp", "ipython"];

const RESERVED_WORDS: &[&str] = &[
	"and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
	"if", "import", "in", "is", "lambda", "nonlocal|10", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

const BUILT_INS: &[&str] = &[
	"__import__",
	"abs",
	"all",
	"any",
	"ascii",
	"bin",
	"bool",
	"breakpoint",
	"bytearray",
	"bytes",
	"callable",
	"chr",
	"classmethod",
	"compile",
	"complex",
	"delattr",
	"dict",
	"dir",
	"divmod",
	"enumerate",
	"eval",
	"exec",
	"filter",
	"float",
	"format",
	"frozenset",
	"getattr",
	"globals",
	"hasattr",
	"hash",
	"help",
	"hex",
	"id",
	"input",
	"int",
	"isinstance",
	"issubclass",
	"iter",
	"len",
	"list",
	"locals",
	"map",
	"max",
	"memoryview",
	"min",
	"next",
	"object",
	"oct",
	"open",
	"ord",
	"pow",
	"print",
	"property",
	"range",
	"repr",
	"reversed",
	"round",
	"set",
	"setattr",
	"slice",
	"sorted",
	"staticmethod",
	"str",
	"sum",
	"super",
	"tuple",
	"type",
	"vars",
	"zip",
	"Dict",
	"List",
	"Any",
	"Union",
	"Optional",
	"Tuple",
	"Set",
	"TypeVar",
	"Generic",
	"Protocol",
	"Callable",
	"Type",
	"NoReturn",
	"ClassVar",
	"Final",
];

const LITERALS: &[&str] = &["__debug__", "Ellipsis", "False", "None", "NotImplemented", "True"];

/// String prefixes without interpolation.
const PLAIN_PREFIX: &str = "([uU]|[bB]|[rR]|[bB][rR]|[rR][bB])?";
/// String prefixes of f-strings.
const FORMAT_PREFIX: &str = "([fF][rR]|[rR][fF]|[fF])";

const DIGIT_PART: &str = "[0-9](_?[0-9])*";

/// Capitalised identifiers in annotations are taken to be types.
const TYPE_NAME_RE: &str = r"\b[A-Z][a-zA-Z0-9_]*\b";

/// Keyword, built-in and literal classes.
pub fn keywords() -> Result<KeywordTable> {
	KeywordTable::builder()
		.class("keyword", RESERVED_WORDS)
		.class("built_in", BUILT_INS)
		.class("literal", LITERALS)
		.build()
}

/// Builds the Python grammar.
pub fn grammar() -> Result<Grammar> {
	let keywords = Arc::new(keywords()?);
	let mut b = GrammarBuilder::new(NAME).with_aliases(ALIASES.iter().copied());
	let common = Common::register(&mut b);

	let prompt = b.add(ModeDef {
		scope: Some("meta".into()),
		begin: Some(r"^(>>>|\.{3}) ".into()),
		..ModeDef::default()
	});
	let literal_bracket = b.add(ModeDef {
		begin: Some(r"\{\{".into()),
		relevance: Some(0),
		..ModeDef::default()
	});
	// Contents are wired once strings and numbers exist.
	let subst = b.add(ModeDef {
		scope: Some("subst".into()),
		begin: Some(r"\{".into()),
		end: Some(r"\}".into()),
		keywords: Some(keywords.clone()),
		illegal: Some("#".into()),
		..ModeDef::default()
	});

	let escape = common.backslash_escape;
	let string = b.add(ModeDef {
		scope: Some("string".into()),
		contains: vec![escape.into()],
		variants: vec![
			string_variant(format!("{PLAIN_PREFIX}'''"), "'''", vec![escape.into(), prompt.into()], Some(10)),
			string_variant(format!("{PLAIN_PREFIX}\"\"\""), "\"\"\"", vec![escape.into(), prompt.into()], Some(10)),
			string_variant(
				format!("{FORMAT_PREFIX}'''"),
				"'''",
				vec![escape.into(), prompt.into(), literal_bracket.into(), subst.into()],
				None,
			),
			string_variant(
				format!("{FORMAT_PREFIX}\"\"\""),
				"\"\"\"",
				vec![escape.into(), prompt.into(), literal_bracket.into(), subst.into()],
				None,
			),
			string_variant("([uU]|[rR])'".into(), "'", Vec::new(), Some(10)),
			string_variant("([uU]|[rR])\"".into(), "\"", Vec::new(), Some(10)),
			string_variant("([bB]|[bB][rR]|[rR][bB])'".into(), "'", Vec::new(), None),
			string_variant("([bB]|[bB][rR]|[rR][bB])\"".into(), "\"", Vec::new(), None),
			string_variant(
				format!("{FORMAT_PREFIX}'"),
				"'",
				vec![escape.into(), literal_bracket.into(), subst.into()],
				None,
			),
			string_variant(
				format!("{FORMAT_PREFIX}\""),
				"\"",
				vec![escape.into(), literal_bracket.into(), subst.into()],
				None,
			),
			crate::common::apos_string(escape),
			crate::common::quote_string(escape),
		],
		..ModeDef::default()
	});

	let number = b.add(number());
	b.mode_mut(subst).contains = vec![string.into(), number.into(), prompt.into(), ModeRef::SelfRef];

	let type_name = b.add(ModeDef {
		scope: Some("built_in".into()),
		begin: Some(TYPE_NAME_RE.into()),
		..ModeDef::default()
	});
	let separator = b.add(ModeDef {
		begin: Some(r"\s*,\s*".into()),
		relevance: Some(0),
		..ModeDef::default()
	});
	let type_hint = b.add(ModeDef {
		scope: Some("type".into()),
		begin: Some(r"\[".into()),
		end: Some(r"\]".into()),
		contains: vec![ModeRef::SelfRef, type_name.into(), separator.into(), number.into(), string.into()],
		relevance: Some(10),
		..ModeDef::default()
	});
	let annotation = b.add(ModeDef {
		begin: Some(r":\s*".into()),
		end: Some(r"(?=(,|\)))".into()),
		keywords: Some(keywords.clone()),
		contains: vec![type_name.into(), type_hint.into()],
		relevance: Some(10),
		..ModeDef::default()
	});
	let params = b.add(ModeDef {
		scope: Some("params".into()),
		variants: vec![
			ModeDef {
				begin: Some(r"\(\s*\)".into()),
				skip: true,
				..ModeDef::default()
			},
			ModeDef {
				begin: Some(r"\(".into()),
				end: Some(r"\)".into()),
				exclude_begin: true,
				exclude_end: true,
				keywords: Some(keywords.clone()),
				contains: vec![
					ModeRef::SelfRef,
					prompt.into(),
					number.into(),
					string.into(),
					common.hash_comment.into(),
					annotation.into(),
				],
				..ModeDef::default()
			},
		],
		..ModeDef::default()
	});
	let return_type = b.add(ModeDef {
		begin: Some("->".into()),
		ends_with_parent: true,
		keywords: Some(keywords.clone()),
		contains: vec![type_name.into(), type_hint.into()],
		relevance: Some(10),
		..ModeDef::default()
	});
	let header = b.add(ModeDef {
		variants: vec![
			ModeDef {
				scope: Some("function".into()),
				begin_keywords: Some("def".into()),
				..ModeDef::default()
			},
			ModeDef {
				scope: Some("class".into()),
				begin_keywords: Some("class".into()),
				..ModeDef::default()
			},
		],
		end: Some(":".into()),
		illegal: Some(r"[${=;\n,]".into()),
		contains: vec![common.underscore_title.into(), params.into(), return_type.into()],
		..ModeDef::default()
	});
	let decorator = b.add(ModeDef {
		scope: Some("meta".into()),
		begin: Some(r"^[\t ]*@".into()),
		end: Some("(?=#)|$".into()),
		contains: vec![number.into(), params.into(), string.into()],
		..ModeDef::default()
	});
	let call = b.add(ModeDef {
		begin: Some(r"\b(print|exec)\(".into()),
		..ModeDef::default()
	});
	let type_comment = b.add(ModeDef {
		scope: Some("comment".into()),
		begin: Some(r"#\s*type:\s*".into()),
		end: Some("$".into()),
		contains: vec![type_name.into(), type_hint.into()],
		relevance: Some(10),
		..ModeDef::default()
	});
	let self_word = b.add(ModeDef {
		begin: Some(r"\bself\b".into()),
		..ModeDef::default()
	});
	let if_word = b.add(ModeDef {
		begin_keywords: Some("if".into()),
		relevance: Some(0),
		..ModeDef::default()
	});

	b.set_root(ModeDef {
		keywords: Some(keywords),
		illegal: Some(r"(</|->|\?)|=>".into()),
		contains: vec![
			prompt.into(),
			number.into(),
			self_word.into(),
			if_word.into(),
			string.into(),
			// Before plain comments, which would otherwise always win.
			type_comment.into(),
			common.hash_comment.into(),
			header.into(),
			decorator.into(),
			call.into(),
		],
		..ModeDef::default()
	});
	b.build()
}

fn string_variant(begin: String, end: &'static str, contains: Vec<ModeRef>, relevance: Option<u32>) -> ModeDef {
	ModeDef {
		begin: Some(begin.into()),
		end: Some(end.into()),
		contains,
		relevance,
		..ModeDef::default()
	}
}

/// Numeric literals: floats with exponent or point, integers in every base,
/// imaginary `j` and Python 2 `L` suffixes, with `_` separators.
fn number() -> ModeDef {
	let point_float = format!(r"(\b({DIGIT_PART}))?\.({DIGIT_PART})|\b({DIGIT_PART})\.");
	let begins = [
		// No leading \b: `.5` starts with a point.
		format!(r"(\b({DIGIT_PART})|({point_float}))[eE][+-]?({DIGIT_PART})[jJ]?\b"),
		// No trailing \b: `1.` ends with a point.
		format!("({point_float})[jJ]?"),
		r"\b([1-9](_?[0-9])*|0+(_?0)*)[lLjJ]?\b".to_string(),
		r"\b0[bB](_?[01])+[lL]?\b".to_string(),
		r"\b0[oO](_?[0-7])+[lL]?\b".to_string(),
		r"\b0[xX](_?[0-9a-fA-F])+[lL]?\b".to_string(),
		format!(r"\b({DIGIT_PART})[jJ]\b"),
	];
	ModeDef {
		scope: Some("number".into()),
		relevance: Some(0),
		variants: begins
			.into_iter()
			.map(|begin| ModeDef {
				begin: Some(begin.into()),
				..ModeDef::default()
			})
			.collect(),
		..ModeDef::default()
	}
}

#[cfg(test)]
mod tests;
