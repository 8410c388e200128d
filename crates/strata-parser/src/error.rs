//! Per-file parse failures

use crate::event::Bracket;
use thiserror::Error;

/// Any of these makes one file unparseable at one version. The caller skips
/// the file and keeps its previously recorded facts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: unterminated {what}")]
    Lex { what: &'static str, line: usize, offset: usize },

    #[error(
        "line {line}: unexpected '{}' (innermost open bracket: {})",
        .found.close_char(),
        .expected.map_or_else(|| "none".to_string(), |b| format!("'{}'", b.open_char()))
    )]
    BracketMismatch {
        expected: Option<Bracket>,
        found: Bracket,
        line: usize,
        offset: usize,
    },

    #[error("line {line}: '{}' is never closed", .bracket.open_char())]
    UnmatchedOpen { bracket: Bracket, line: usize, offset: usize },

    #[error("line {line}: malformed class declaration: {reason}")]
    MalformedClass { line: usize, reason: String },

    #[error("line {line}: malformed method in class {class}: {reason}")]
    MalformedMethod { class: String, line: usize, reason: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Lex { line, .. }
            | ParseError::BracketMismatch { line, .. }
            | ParseError::UnmatchedOpen { line, .. }
            | ParseError::MalformedClass { line, .. }
            | ParseError::MalformedMethod { line, .. } => *line,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
