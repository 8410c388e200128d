//! Positioned events shared by the lexer, bracket matcher and structural parser

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Import,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "class" => Some(Keyword::Class),
            "import" => Some(Keyword::Import),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Import => "import",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bracket {
    Curly,
    Paren,
    Square,
}

impl Bracket {
    pub fn from_open(byte: u8) -> Option<Self> {
        match byte {
            b'{' => Some(Bracket::Curly),
            b'(' => Some(Bracket::Paren),
            b'[' => Some(Bracket::Square),
            _ => None,
        }
    }

    pub fn from_close(byte: u8) -> Option<Self> {
        match byte {
            b'}' => Some(Bracket::Curly),
            b')' => Some(Bracket::Paren),
            b']' => Some(Bracket::Square),
            _ => None,
        }
    }

    pub fn open_char(&self) -> char {
        match self {
            Bracket::Curly => '{',
            Bracket::Paren => '(',
            Bracket::Square => '[',
        }
    }

    pub fn close_char(&self) -> char {
        match self {
            Bracket::Curly => '}',
            Bracket::Paren => ')',
            Bracket::Square => ']',
        }
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.open_char(), self.close_char())
    }
}

/// A matched bracket pair. The event's span runs from opener to closer inclusive,
/// so `offset` is the opener's position and `end() - 1` the closer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    pub bracket: Bracket,
    /// Line of the opener (1-based).
    pub line: usize,
    /// Line of the closer (1-based).
    pub close_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Comment,
    StringLiteral,
    TemplateLiteral,
    RegexLiteral,
    Keyword(Keyword),
    Bracket(BracketPair),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub offset: usize,
    pub length: usize,
    pub kind: EventKind,
}

impl Event {
    pub fn new(offset: usize, length: usize, kind: EventKind) -> Self {
        Event { offset, length, kind }
    }

    /// Offset one past the last byte of the span.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn bracket(&self) -> Option<Bracket> {
        match self.kind {
            EventKind::Bracket(pair) => Some(pair.bracket),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        self.kind == EventKind::Comment
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.offset..self.end()]
    }
}

/// 1-based line number of `offset`.
pub fn line_at(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
