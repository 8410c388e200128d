//! Structural extraction of classes and methods from JavaScript sources
//!
//! Three passes over the text: the lexer claims comments, literals and
//! keywords; the bracket matcher pairs brackets outside those spans; the
//! structural parser walks the merged stream once to build a `ModuleEntry`.

pub mod brackets;
pub mod error;
pub mod event;
pub mod lexer;
pub mod parser;

#[cfg(test)]
pub mod tests;

pub use brackets::match_brackets;
pub use error::{ParseError, ParseResult};
pub use event::{Bracket, BracketPair, Event, EventKind, Keyword};
pub use lexer::lex;
pub use parser::{is_source_file, parse_module, resolve_import};
