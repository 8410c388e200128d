//! Third pass: classes, methods and imports from the merged event stream

use std::path::Path;

use strata_core::{ClassEntry, MethodEntry, ModuleEntry};

use crate::brackets::match_brackets;
use crate::error::{ParseError, ParseResult};
use crate::event::{line_at, Bracket, Event, EventKind, Keyword};
use crate::lexer::lex;

/// Words that may precede a member name on the previous line.
const MODIFIERS: &[&str] = &["static", "get", "set", "async", "accessor"];

/// Parse one source file into its structural facts.
pub fn parse_module(path: &str, source: &str) -> ParseResult<ModuleEntry> {
    let events = match_brackets(source, lex(source)?)?;
    let parser = StructureParser { source, events: &events };
    let mut module = ModuleEntry::new(path);

    let mut cursor = 0;
    while let Some(event) = events.get(cursor) {
        cursor = match event.kind {
            EventKind::Keyword(Keyword::Import) => {
                parser.import(cursor, &mut module);
                cursor + 1
            }
            EventKind::Keyword(Keyword::Class) => {
                let resume = parser.class(cursor, &mut module)?;
                // methods may load modules dynamically
                for inner in cursor + 1..resume {
                    if matches!(events[inner].kind, EventKind::Keyword(Keyword::Import)) {
                        parser.import(inner, &mut module);
                    }
                }
                resume
            }
            _ => cursor + 1,
        };
    }

    tracing::trace!(
        "Parsed {}: {} classes, {} methods, {} imports",
        path,
        module.classes.len(),
        module.method_count(),
        module.imports.len()
    );
    Ok(module)
}

/// Resolve a relative import against the importing module's directory.
///
/// Bare specifiers (packages, absolute URLs) are returned unchanged.
pub fn resolve_import(module_path: &str, specifier: &str) -> String {
    let relative = specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../");
    if !relative {
        return specifier.to_string();
    }

    let directory = module_path.rsplit_once('/').map_or("", |(dir, _)| dir);
    let joined = format!("{directory}/{specifier}");
    let mut segments: Vec<&str> = joined
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    while let Some(i) = segments
        .windows(2)
        .position(|pair| pair[0] != ".." && pair[1] == "..")
    {
        segments.drain(i..i + 2);
    }
    segments.join("/")
}

/// Whether `path` carries one of the given extensions (without the dot).
pub fn is_source_file(path: &str, extensions: &[String]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}

struct StructureParser<'a> {
    source: &'a str,
    events: &'a [Event],
}

impl<'a> StructureParser<'a> {
    /// Index of the first event after `index` that is not nested inside it.
    fn after(&self, index: usize) -> usize {
        let end = self.events[index].end();
        let mut next = index + 1;
        while next < self.events.len() && self.events[next].offset < end {
            next += 1;
        }
        next
    }

    fn import(&self, index: usize, module: &mut ModuleEntry) {
        if let Some(specifier) = self.import_specifier(index) {
            module.imports.push(resolve_import(&module.path, specifier));
        }
    }

    fn import_specifier(&self, index: usize) -> Option<&'a str> {
        let keyword = self.events[index];
        if self.source.as_bytes().get(keyword.end()) == Some(&b'.') {
            // import.meta
            return None;
        }

        let mut at = keyword.end();
        let mut next = index + 1;
        while let Some(event) = self.events.get(next) {
            if self.source[at..event.offset].contains(';') {
                return None;
            }
            match event.kind {
                EventKind::Comment => {
                    at = event.end();
                    next += 1;
                }
                // dynamic import: the specifier is the first thing inside the call
                EventKind::Bracket(pair) if pair.bracket == Bracket::Paren => {
                    at = event.offset + 1;
                    next += 1;
                }
                EventKind::Bracket(pair) if pair.bracket == Bracket::Curly => {
                    at = event.end();
                    next = self.after(next);
                }
                EventKind::StringLiteral => {
                    let text = event.text(self.source);
                    return Some(&text[1..text.len() - 1]);
                }
                _ => return None,
            }
        }
        None
    }

    /// Parse the class whose keyword sits at `index`; returns the resume index.
    fn class(&self, index: usize, module: &mut ModuleEntry) -> ParseResult<usize> {
        let keyword = self.events[index];
        let line = line_at(self.source, keyword.offset);
        let mut header = String::new();
        let mut at = keyword.end();
        let mut next = index + 1;

        let body_index = loop {
            let Some(event) = self.events.get(next) else {
                return Err(ParseError::MalformedClass {
                    line,
                    reason: "missing class body".to_string(),
                });
            };
            header.push_str(&self.source[at..event.offset]);
            match event.kind {
                EventKind::Bracket(pair) if pair.bracket == Bracket::Curly => break next,
                // keep a marker so `extends (expr)` still has an operand
                EventKind::Bracket(pair) => {
                    header.push(' ');
                    header.push(pair.bracket.open_char());
                    header.push(pair.bracket.close_char());
                    header.push(' ');
                }
                EventKind::Comment => header.push(' '),
                other => {
                    return Err(ParseError::MalformedClass {
                        line,
                        reason: format!("unexpected {} in class header", describe(other)),
                    });
                }
            }
            at = event.end();
            next = self.after(next);
        };

        let resume = self.after(body_index);
        let Some((name, superclass)) = parse_header(&header, line)? else {
            tracing::debug!("Skipping anonymous class at line {}", line);
            return Ok(resume);
        };

        let mut class = ClassEntry::new(name, superclass);
        self.members(&mut class, body_index)?;
        module.add_class(class);
        Ok(resume)
    }

    fn members(&self, class: &mut ClassEntry, body_index: usize) -> ParseResult<()> {
        let body = self.events[body_index];
        let inner_end = body.end() - 1;
        let mut scanner = MemberScanner::default();
        let mut at = body.offset + 1;
        let mut index = body_index + 1;

        while let Some(&event) = self.events.get(index).filter(|e| e.offset < inner_end) {
            scanner.scan(&self.source[at..event.offset]);
            let mut next = self.after(index);
            let mut resume_at = event.end();

            match event.kind {
                EventKind::Comment => {}
                EventKind::StringLiteral if !scanner.assign => {
                    let text = event.text(self.source);
                    scanner.push(&text[1..text.len() - 1]);
                }
                EventKind::Keyword(keyword) if !scanner.assign => scanner.push(keyword.as_str()),
                EventKind::Bracket(pair) if !scanner.assign => match pair.bracket {
                    Bracket::Square => scanner.push(event.text(self.source)),
                    // static initialization block
                    Bracket::Curly => scanner.reset(),
                    Bracket::Paren => {
                        let (method, method_body) = self.method(class, &scanner, index)?;
                        class.add_method(method);
                        scanner.reset();
                        next = self.after(method_body);
                        resume_at = self.events[method_body].end();
                    }
                },
                _ => {}
            }

            if !event.is_comment() {
                scanner.last = Some(Sig::Operand);
            }
            at = resume_at;
            index = next;
        }
        Ok(())
    }

    /// Build the method whose parameter list is the event at `paren_index`.
    /// Returns the method and the index of its body event.
    fn method(
        &self,
        class: &ClassEntry,
        scanner: &MemberScanner,
        paren_index: usize,
    ) -> ParseResult<(MethodEntry, usize)> {
        let paren = self.events[paren_index];
        let line = line_at(self.source, paren.offset);
        let malformed = |reason: String| ParseError::MalformedMethod {
            class: class.name.clone(),
            line,
            reason,
        };

        let Some((bare_name, attributes)) = scanner.tokens.split_last() else {
            return Err(malformed("parameter list without a method name".to_string()));
        };

        let mut at = paren.end();
        let mut next = self.after(paren_index);
        let body_index = loop {
            let Some(event) = self.events.get(next) else {
                return Err(malformed("missing method body".to_string()));
            };
            let gap = self.source[at..event.offset].trim();
            if !gap.is_empty() {
                return Err(malformed(format!("unexpected `{gap}` before method body")));
            }
            match event.kind {
                EventKind::Comment => {
                    at = event.end();
                    next += 1;
                }
                EventKind::Bracket(pair) if pair.bracket == Bracket::Curly => break next,
                other => return Err(malformed(format!("expected method body, found {}", describe(other)))),
            }
        };

        let parameters = &self.source[paren.offset + 1..paren.end() - 1];
        let body = self.events[body_index];
        let method = MethodEntry::new(
            attributes.to_vec(),
            bare_name.clone(),
            parameters.to_string(),
            body.text(self.source).to_string(),
        );
        Ok((method, body_index))
    }
}

/// Split a class header into name and superclass. `None` for anonymous classes.
fn parse_header(header: &str, line: usize) -> ParseResult<Option<(String, Option<String>)>> {
    let malformed = |reason: String| ParseError::MalformedClass { line, reason };
    let mut words = header.split_whitespace();

    let name = match words.next() {
        None | Some("extends") => return Ok(None),
        Some(name) => name,
    };
    if !is_identifier(name) {
        return Err(malformed(format!("invalid class name `{name}`")));
    }

    let superclass = match words.next() {
        None => None,
        Some("extends") => {
            let Some(expression) = words.next() else {
                return Err(malformed("missing superclass after `extends`".to_string()));
            };
            let dotted: String = expression
                .chars()
                .take_while(|&c| c == '.' || is_identifier_char(c))
                .collect();
            // computed heritage such as `extends (cond ? A : B)` names no single class
            (!dotted.is_empty()).then_some(dotted)
        }
        Some(other) => return Err(malformed(format!("unexpected `{other}` after class name"))),
    };
    Ok(Some((name.to_string(), superclass)))
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn is_identifier(word: &str) -> bool {
    word.chars().next().is_some_and(|c| !c.is_ascii_digit()) && word.chars().all(is_identifier_char)
}

fn describe(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Comment => "comment",
        EventKind::StringLiteral => "string literal",
        EventKind::TemplateLiteral => "template literal",
        EventKind::RegexLiteral => "regex literal",
        EventKind::Keyword(keyword) => keyword.as_str(),
        EventKind::Bracket(pair) => match pair.bracket {
            Bracket::Curly => "block",
            Bracket::Paren => "parenthesis",
            Bracket::Square => "bracket",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sig {
    Operand,
    Operator,
}

/// Tracks the member currently being read at the top level of a class body.
#[derive(Debug, Default)]
struct MemberScanner {
    /// Identifier-like words since the end of the previous member.
    tokens: Vec<String>,
    /// Inside a field initializer; brackets here belong to the value.
    assign: bool,
    last: Option<Sig>,
}

impl MemberScanner {
    fn push(&mut self, token: &str) {
        self.tokens.push(token.to_string());
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.assign = false;
        self.last = None;
    }

    /// Consume plain text lying between two top-level events.
    fn scan(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let byte = bytes[pos];
            match byte {
                b';' => self.reset(),
                b'\n' => self.newline(),
                b' ' | b'\t' | b'\r' => {}
                b'=' if bytes.get(pos + 1) != Some(&b'>') && bytes.get(pos + 1) != Some(&b'=') => {
                    self.assign = true;
                    self.last = Some(Sig::Operator);
                }
                b if b == b'#' || b == b'_' || b == b'$' || b.is_ascii_alphanumeric() || b >= 0x80 => {
                    let start = pos;
                    pos += 1;
                    while pos < bytes.len()
                        && (bytes[pos] == b'_' || bytes[pos] == b'$' || bytes[pos].is_ascii_alphanumeric() || bytes[pos] >= 0x80)
                    {
                        pos += 1;
                    }
                    if !self.assign {
                        self.push(&text[start..pos]);
                    }
                    self.last = Some(Sig::Operand);
                    continue;
                }
                _ => self.last = Some(Sig::Operator),
            }
            pos += 1;
        }
    }

    /// Class fields may omit their semicolon, so a line break can end a member.
    fn newline(&mut self) {
        if self.assign {
            if self.last != Some(Sig::Operator) {
                self.reset();
            }
        } else if self
            .tokens
            .last()
            .is_some_and(|token| !MODIFIERS.contains(&token.as_str()))
        {
            self.reset();
        }
    }
}
