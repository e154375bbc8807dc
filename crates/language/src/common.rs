//! Modes shared between grammars.
//!
//! Each helper returns a [`ModeDef`] so it can be used either as a standalone
//! mode (added to a builder) or as one entry of another mode's `variants`.
//! [`Common::register`] adds the usual set to a builder in one go.

use sheen_syntax::{GrammarBuilder, ModeDef, ModeId};

/// Identifier allowing a leading underscore.
pub const UNDERSCORE_IDENT_RE: &str = r"[a-zA-Z_]\w*";

/// Tags picked out of comments.
const DOCTAG_RE: &str = "(TODO|FIXME|NOTE|BUG|OPTIMIZE|HACK|XXX):";

/// Three English-looking words in a row: strong evidence that a comment
/// really is a comment and not a misread operator.
const PROSE_RE: &str =
	r"[ ]+((?:I|a|is|so|us|[tT][oO]|at|if|in|it|on|[A-Za-z]+['](d|ve|re|ll|t|s|n)|[A-Za-z]+[-][a-z]+|[A-Za-z][a-z]{2,})[.]?[:]?([.][ ]|[ ])){3}";

/// `\x` escape of any character, worth nothing on its own.
pub fn backslash_escape() -> ModeDef {
	ModeDef {
		begin: Some(r"\\[\s\S]".into()),
		relevance: Some(0),
		..ModeDef::default()
	}
}

/// Single-line `'...'` string with backslash escapes.
pub fn apos_string(escape: ModeId) -> ModeDef {
	ModeDef {
		scope: Some("string".into()),
		begin: Some("'".into()),
		end: Some("'".into()),
		illegal: Some(r"\n".into()),
		contains: vec![escape.into()],
		..ModeDef::default()
	}
}

/// Single-line `"..."` string with backslash escapes.
pub fn quote_string(escape: ModeId) -> ModeDef {
	ModeDef {
		scope: Some("string".into()),
		begin: Some("\"".into()),
		end: Some("\"".into()),
		illegal: Some(r"\n".into()),
		contains: vec![escape.into()],
		..ModeDef::default()
	}
}

/// A comment from `begin` to `end` that highlights doc tags.
///
/// Adds the comment's children to `builder`; the comment itself is returned
/// for the caller to add or embed.
pub fn comment(builder: &mut GrammarBuilder, begin: &'static str, end: &'static str) -> ModeDef {
	let doctag = builder.add(ModeDef {
		scope: Some("doctag".into()),
		begin: Some(format!("[ ]*(?={DOCTAG_RE})").into()),
		end: Some(DOCTAG_RE.into()),
		exclude_begin: true,
		relevance: Some(0),
		..ModeDef::default()
	});
	let prose = builder.add(ModeDef {
		begin: Some(PROSE_RE.into()),
		..ModeDef::default()
	});
	ModeDef {
		scope: Some("comment".into()),
		begin: Some(begin.into()),
		end: Some(end.into()),
		contains: vec![doctag.into(), prose.into()],
		..ModeDef::default()
	}
}

/// A plain identifier labelled `title`, e.g. a function name after `def`.
pub fn underscore_title() -> ModeDef {
	ModeDef {
		scope: Some("title".into()),
		begin: Some(UNDERSCORE_IDENT_RE.into()),
		relevance: Some(0),
		..ModeDef::default()
	}
}

/// Handles of the shared modes inside one builder.
#[derive(Debug, Clone, Copy)]
pub struct Common {
	pub backslash_escape: ModeId,
	pub apos_string: ModeId,
	pub quote_string: ModeId,
	pub hash_comment: ModeId,
	pub underscore_title: ModeId,
}

impl Common {
	pub fn register(builder: &mut GrammarBuilder) -> Self {
		let backslash_escape = builder.add(self::backslash_escape());
		let apos_string = builder.add(self::apos_string(backslash_escape));
		let quote_string = builder.add(self::quote_string(backslash_escape));
		let hash_comment = self::comment(builder, "#", "$");
		let hash_comment = builder.add(hash_comment);
		let underscore_title = builder.add(self::underscore_title());
		Self {
			backslash_escape,
			apos_string,
			quote_string,
			hash_comment,
			underscore_title,
		}
	}
}
