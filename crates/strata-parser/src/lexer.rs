//! First pass: claim comments, literals and keywords
//!
//! A small state machine walks the source once. It remembers the class of the
//! last significant token to decide whether a `/` starts a regex literal or is
//! a division operator. That decision is a heuristic: it only has to be good
//! enough to keep brackets inside literals away from the bracket matcher.

use crate::error::{ParseError, ParseResult};
use crate::event::{line_at, Event, EventKind, Keyword};

/// Class of the last significant token seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Significant {
    /// Start of input.
    Nothing,
    /// Something a division could follow: identifier, number, literal, `)`, `]`, `}`.
    Operand,
    /// Punctuation or an operator keyword; a `/` here opens a regex.
    Operator,
}

/// Keywords after which an expression (and so a regex literal) may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return", "yield", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case",
    "do", "else", "await",
];

/// Scan `source` into an offset-ordered, non-overlapping event stream.
pub fn lex(source: &str) -> ParseResult<Vec<Event>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    last: Significant,
    events: Vec<Event>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            last: Significant::Nothing,
            events: Vec::new(),
        }
    }

    fn run(mut self) -> ParseResult<Vec<Event>> {
        while let Some(&byte) = self.bytes.get(self.pos) {
            let start = self.pos;
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' => match self.peek(1) {
                    Some(b'/') => {
                        let end = self.line_comment_end(start);
                        self.emit(start, end, EventKind::Comment);
                    }
                    Some(b'*') => {
                        let end = self.block_comment_end(start)?;
                        self.emit(start, end, EventKind::Comment);
                    }
                    _ => {
                        let regex_end = if self.last == Significant::Operand {
                            None
                        } else {
                            self.regex_end(start)
                        };
                        match regex_end {
                            Some(end) => {
                                self.emit(start, end, EventKind::RegexLiteral);
                                self.last = Significant::Operand;
                            }
                            None => {
                                self.pos += 1;
                                self.last = Significant::Operator;
                            }
                        }
                    }
                },
                b'\'' | b'"' => {
                    let end = self.string_end(start)?;
                    self.emit(start, end, EventKind::StringLiteral);
                    self.last = Significant::Operand;
                }
                b'`' => {
                    let end = self.template_end(start)?;
                    self.emit(start, end, EventKind::TemplateLiteral);
                    self.last = Significant::Operand;
                }
                b')' | b']' | b'}' => {
                    self.pos += 1;
                    self.last = Significant::Operand;
                }
                b'0'..=b'9' => {
                    self.pos = self.word_end(start);
                    self.last = Significant::Operand;
                }
                b if is_identifier_start(b) => self.word(start),
                _ => {
                    self.pos += 1;
                    self.last = Significant::Operator;
                }
            }
        }
        Ok(self.events)
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn emit(&mut self, start: usize, end: usize, kind: EventKind) {
        self.events.push(Event::new(start, end - start, kind));
        self.pos = end;
    }

    fn error(&self, what: &'static str, offset: usize) -> ParseError {
        ParseError::Lex {
            what,
            line: line_at(self.source, offset),
            offset,
        }
    }

    fn word_end(&self, start: usize) -> usize {
        let mut end = start;
        while end < self.bytes.len() && is_identifier_part(self.bytes[end]) {
            end += 1;
        }
        end
    }

    fn word(&mut self, start: usize) {
        let end = self.word_end(start);
        let word = &self.source[start..end];
        self.pos = end;
        if let Some(keyword) = Keyword::from_word(word) {
            if self.is_keyword_position(start, end) {
                self.events.push(Event::new(start, end - start, EventKind::Keyword(keyword)));
                self.last = Significant::Operator;
                return;
            }
        }
        self.last = if EXPRESSION_KEYWORDS.contains(&word) {
            Significant::Operator
        } else {
            Significant::Operand
        };
    }

    /// `obj.class`, `#class` and `{ class: x }` use the word as a property name.
    fn is_keyword_position(&self, start: usize, end: usize) -> bool {
        let before = self.bytes[..start]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace());
        if matches!(before, Some(b'.') | Some(b'#')) {
            return false;
        }
        let after = self.bytes[end..].iter().find(|b| !b.is_ascii_whitespace());
        after != Some(&b':')
    }

    fn line_comment_end(&self, start: usize) -> usize {
        self.bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.bytes.len(), |i| start + i)
    }

    fn block_comment_end(&self, start: usize) -> ParseResult<usize> {
        self.source[start + 2..]
            .find("*/")
            .map(|i| start + 2 + i + 2)
            .ok_or_else(|| self.error("block comment", start))
    }

    fn string_end(&self, start: usize) -> ParseResult<usize> {
        let quote = self.bytes[start];
        let mut pos = start + 1;
        loop {
            match self.bytes.get(pos) {
                None | Some(b'\n') => return Err(self.error("string literal", start)),
                Some(b'\\') => {
                    pos += 2;
                    if self.bytes.get(pos - 1) == Some(&b'\r') && self.bytes.get(pos) == Some(&b'\n') {
                        pos += 1;
                    }
                }
                Some(&b) if b == quote => return Ok(pos + 1),
                Some(_) => pos += 1,
            }
        }
    }

    fn template_end(&self, start: usize) -> ParseResult<usize> {
        let mut pos = start + 1;
        loop {
            match self.bytes.get(pos) {
                None => return Err(self.error("template literal", start)),
                Some(b'\\') => pos += 2,
                Some(b'`') => return Ok(pos + 1),
                Some(b'$') if self.bytes.get(pos + 1) == Some(&b'{') => {
                    pos = self.substitution_end(pos + 2)?;
                }
                Some(_) => pos += 1,
            }
        }
    }

    /// End of a `${ ... }` substitution whose body starts at `start`.
    fn substitution_end(&self, start: usize) -> ParseResult<usize> {
        let mut depth = 0usize;
        let mut pos = start;
        loop {
            match self.bytes.get(pos) {
                None => return Err(self.error("template substitution", start)),
                Some(b'{') => {
                    depth += 1;
                    pos += 1;
                }
                Some(b'}') if depth == 0 => return Ok(pos + 1),
                Some(b'}') => {
                    depth -= 1;
                    pos += 1;
                }
                Some(b'\'') | Some(b'"') => pos = self.string_end(pos)?,
                Some(b'`') => pos = self.template_end(pos)?,
                Some(b'/') if self.bytes.get(pos + 1) == Some(&b'/') => pos = self.line_comment_end(pos),
                Some(b'/') if self.bytes.get(pos + 1) == Some(&b'*') => pos = self.block_comment_end(pos)?,
                Some(_) => pos += 1,
            }
        }
    }

    /// End of a regex literal starting at `start`, or `None` if the slash is a division.
    fn regex_end(&self, start: usize) -> Option<usize> {
        let mut pos = start + 1;
        let mut in_class = false;
        loop {
            match *self.bytes.get(pos)? {
                b'\n' | b'\r' => return None,
                b'\\' => pos += 1,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => break,
                _ => {}
            }
            pos += 1;
        }
        if pos == start + 1 {
            return None;
        }
        let end = self.word_end(pos + 1);
        let next = self.bytes[end..].iter().find(|b| !matches!(b, b' ' | b'\t'));
        match next {
            Some(&b) if is_identifier_part(b) || b == b'\\' => None,
            _ => Some(end),
        }
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_identifier_part(byte: u8) -> bool {
    is_identifier_start(byte) || byte.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(EventKind, &str)> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|e| (e.kind, e.text(source)))
            .collect()
    }

    #[test]
    fn test_claims_comments_and_strings() {
        let source = "// { comment\nlet a = \"}\"; /* ( */ let b = 'x';";
        let events = kinds(source);
        assert_eq!(
            events,
            vec![
                (EventKind::Comment, "// { comment"),
                (EventKind::StringLiteral, "\"}\""),
                (EventKind::Comment, "/* ( */"),
                (EventKind::StringLiteral, "'x'"),
            ]
        );
    }

    #[test]
    fn test_regex_versus_division() {
        let events = kinds("let r = /[/}]+/g.test(s); let d = a / b / c;");
        assert_eq!(events, vec![(EventKind::RegexLiteral, "/[/}]+/g")]);

        let events = kinds("function f() { return /\\)/; }");
        assert_eq!(events, vec![(EventKind::RegexLiteral, "/\\)/")]);

        assert!(kinds("x = (a) / 2 / (b);").is_empty());
    }

    #[test]
    fn test_template_with_substitutions() {
        let source = "const t = `a ${ {b: '}'}.b } ${`nested ${c}`} z`;";
        let events = kinds(source);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, EventKind::TemplateLiteral);
        assert!(events[0].1.ends_with("z`"));
    }

    #[test]
    fn test_keywords_outside_identifiers() {
        let source = "import x from './x'; class Foo {} const className = obj.class; o = { class: 1 };";
        let keywords: Vec<_> = kinds(source)
            .into_iter()
            .filter_map(|(kind, text)| match kind {
                EventKind::Keyword(k) => Some((k, text)),
                _ => None,
            })
            .collect();
        assert_eq!(keywords, vec![(Keyword::Import, "import"), (Keyword::Class, "class")]);
    }

    #[test]
    fn test_unterminated_literals_fail() {
        assert!(matches!(lex("let s = 'open\n';"), Err(ParseError::Lex { what: "string literal", line: 1, .. })));
        assert!(matches!(lex("\n/* never closed"), Err(ParseError::Lex { what: "block comment", line: 2, .. })));
        assert!(matches!(lex("`abc"), Err(ParseError::Lex { what: "template literal", .. })));
    }
}
