//! Second pass: pair up brackets outside the lexer's claimed spans

use crate::error::{ParseError, ParseResult};
use crate::event::{Bracket, BracketPair, Event, EventKind};

struct Open {
    bracket: Bracket,
    /// Index of the placeholder event in the output.
    slot: usize,
    offset: usize,
    line: usize,
}

/// Merge bracket-pair events into the lexer's stream.
///
/// The returned events stay ordered by offset; a pair is placed at its
/// opener, so nested spans follow their enclosing pair.
pub fn match_brackets(source: &str, lexed: Vec<Event>) -> ParseResult<Vec<Event>> {
    let bytes = source.as_bytes();
    let mut claimed = lexed.into_iter().peekable();
    let mut events = Vec::new();
    let mut stack: Vec<Open> = Vec::new();
    let mut line = 1;
    let mut pos = 0;

    while pos < bytes.len() {
        if let Some(event) = claimed.next_if(|e| e.offset == pos) {
            line += bytes[event.offset..event.end()].iter().filter(|&&b| b == b'\n').count();
            pos = event.end();
            events.push(event);
            continue;
        }

        let byte = bytes[pos];
        if byte == b'\n' {
            line += 1;
        } else if let Some(bracket) = Bracket::from_open(byte) {
            stack.push(Open { bracket, slot: events.len(), offset: pos, line });
            events.push(Event::new(pos, 0, EventKind::Bracket(BracketPair { bracket, line, close_line: line })));
        } else if let Some(found) = Bracket::from_close(byte) {
            let open = match stack.pop() {
                Some(open) if open.bracket == found => open,
                other => {
                    return Err(ParseError::BracketMismatch {
                        expected: other.map(|o| o.bracket),
                        found,
                        line,
                        offset: pos,
                    });
                }
            };
            events[open.slot] = Event::new(
                open.offset,
                pos - open.offset + 1,
                EventKind::Bracket(BracketPair { bracket: open.bracket, line: open.line, close_line: line }),
            );
        }
        pos += 1;
    }

    match stack.pop() {
        Some(open) => Err(ParseError::UnmatchedOpen {
            bracket: open.bracket,
            line: open.line,
            offset: open.offset,
        }),
        None => Ok(events),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn matched(source: &str) -> ParseResult<Vec<Event>> {
        match_brackets(source, lex(source)?)
    }

    #[test]
    fn test_pairs_nest_in_offset_order() {
        let source = "f(a[0], { b: 1 })";
        let events = matched(source).unwrap();
        let spans: Vec<_> = events.iter().map(|e| e.text(source)).collect();
        assert_eq!(spans, vec!["(a[0], { b: 1 })", "[0]", "{ b: 1 }"]);
        assert!(events.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_pair_span_covers_opener_and_closer() {
        let source = "x = [1, (2)];";
        let events = matched(source).unwrap();
        assert_eq!(events.len(), 2);
        for event in &events {
            let bracket = event.bracket().unwrap();
            assert_eq!(source.as_bytes()[event.offset] as char, bracket.open_char());
            assert_eq!(source.as_bytes()[event.end() - 1] as char, bracket.close_char());
        }
    }

    #[test]
    fn test_brackets_inside_literals_are_ignored() {
        let source = "class A { m() { return \"}\"; } }";
        let events = matched(source).unwrap();
        let curly: Vec<_> = events
            .iter()
            .filter(|e| e.bracket() == Some(Bracket::Curly))
            .map(|e| e.text(source))
            .collect();
        assert_eq!(curly, vec!["{ m() { return \"}\"; } }", "{ return \"}\"; }"]);
    }

    #[test]
    fn test_lines_are_recorded() {
        let source = "{\n  // )\n  x\n}";
        let events = matched(source).unwrap();
        let pair = events
            .iter()
            .find_map(|e| match e.kind {
                EventKind::Bracket(pair) => Some(pair),
                _ => None,
            })
            .unwrap();
        assert_eq!((pair.line, pair.close_line), (1, 4));
    }

    #[test]
    fn test_mismatch_reports_innermost_open() {
        let err = matched("{ (\n] }").unwrap_err();
        assert_eq!(
            err,
            ParseError::BracketMismatch {
                expected: Some(Bracket::Paren),
                found: Bracket::Square,
                line: 2,
                offset: 4,
            }
        );

        let err = matched("x)").unwrap_err();
        assert!(matches!(err, ParseError::BracketMismatch { expected: None, found: Bracket::Paren, .. }));
    }

    #[test]
    fn test_unclosed_opener_fails() {
        let err = matched("a {\n b(").unwrap_err();
        assert!(matches!(err, ParseError::UnmatchedOpen { bracket: Bracket::Paren, line: 2, .. }));
    }
}
