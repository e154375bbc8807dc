//! Mode-stack syntax scanner.
//!
//! Grammars are trees (really graphs) of matching rules called modes. A mode
//! has a `begin` pattern, an optional `end`, an optional `illegal` pattern, an
//! ordered list of child modes it may contain and an optional keyword table.
//! This crate compiles such definitions once into an immutable [`Grammar`] and
//! runs them over source text, producing a lossless stream of [`Token`]s.
//!
//! # Architecture
//!
//! * [`mode`]: authoring model; modes live in an arena and refer to each other by [`ModeId`]
//! * [`pattern`]: single compiled regular expression with offset-relative matching
//! * `matcher`: one tagged alternation per compiled mode (own illegal, ends, child begins)
//! * `compile`: variant expansion, terminator resolution, matcher construction
//! * [`keywords`]: identifier classification with per-entry relevance
//! * [`relevance`]: running detection score
//! * [`scan`]: the mode stack machine, exposed as an iterator of tokens
//!
//! # Example
//!
//! ```
//! use sheen_syntax::{GrammarBuilder, ModeDef};
//!
//! let mut builder = GrammarBuilder::new("demo");
//! let string = builder.add(ModeDef {
//! 	scope: Some("string".into()),
//! 	begin: Some("\"".into()),
//! 	end: Some("\"".into()),
//! 	..ModeDef::default()
//! });
//! builder.set_root(ModeDef {
//! 	contains: vec![string.into()],
//! 	..ModeDef::default()
//! });
//! let grammar = builder.build().unwrap();
//!
//! let source = r#"say "hi""#;
//! let tokens: Vec<_> = grammar.scan(source).collect();
//! assert_eq!(tokens[1].scope, Some("string"));
//! assert_eq!(tokens[1].text(source), "\"hi\"");
//! ```

mod compile;
pub mod error;
pub mod grammar;
pub mod keywords;
mod matcher;
pub mod mode;
pub mod options;
pub mod pattern;
pub mod relevance;
pub mod scan;
pub mod token;

pub use error::{GrammarError, PatternRole, Result};
pub use grammar::{Grammar, GrammarBuilder};
pub use keywords::{Classification, KeywordTable, KeywordTableBuilder};
pub use mode::{ModeDef, ModeId, ModeRef};
pub use options::ScanOptions;
pub use pattern::Pattern;
pub use relevance::Relevance;
pub use scan::Scanner;
pub use token::{ScanReport, Token};
