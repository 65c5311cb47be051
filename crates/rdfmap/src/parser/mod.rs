//! Line-oriented N-Triples parser.
//!
//! Only N-Triples is parsed; richer syntaxes are expected to arrive as an
//! already built [`TripleSource`](crate::model::TripleSource).

use crate::error::ParseError;
use crate::model::{BlankId, Graph, Iri, Literal, Term, Triple};

/// Parse an N-Triples document into a [`Graph`].
pub fn parse_ntriples(input: &str) -> Result<Graph, ParseError> {
    let mut graph = Graph::new();
    for (idx, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let triple = LineParser::new(trimmed, idx + 1).triple()?;
        graph.insert(triple);
    }
    Ok(graph)
}

struct LineParser<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> LineParser<'a> {
    fn new(rest: &'a str, line: usize) -> Self {
        Self { rest, line }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, message)
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn triple(mut self) -> Result<Triple, ParseError> {
        let s = self.subject()?;
        self.skip_ws();
        let p = self.iri()?;
        self.skip_ws();
        let o = self.object()?;
        self.skip_ws();
        let Some(rest) = self.rest.strip_prefix('.') else {
            return Err(self.err("expected '.' after object"));
        };
        let rest = rest.trim();
        if !rest.is_empty() && !rest.starts_with('#') {
            return Err(self.err(format!("unexpected trailing content: {rest}")));
        }
        Ok(Triple::new(s, p, o))
    }

    fn subject(&mut self) -> Result<Term, ParseError> {
        if self.rest.starts_with('<') {
            Ok(Term::Iri(self.iri()?))
        } else if self.rest.starts_with("_:") {
            Ok(Term::Blank(self.blank()?))
        } else {
            Err(self.err("subject must be an IRI or blank node"))
        }
    }

    fn object(&mut self) -> Result<Term, ParseError> {
        if self.rest.starts_with('<') {
            Ok(Term::Iri(self.iri()?))
        } else if self.rest.starts_with("_:") {
            Ok(Term::Blank(self.blank()?))
        } else if self.rest.starts_with('"') {
            Ok(Term::Literal(self.literal()?))
        } else {
            Err(self.err("object must be an IRI, blank node or literal"))
        }
    }

    fn iri(&mut self) -> Result<Iri, ParseError> {
        let Some(body) = self.rest.strip_prefix('<') else {
            return Err(self.err("expected '<'"));
        };
        let Some(end) = body.find('>') else {
            return Err(self.err("unterminated IRI"));
        };
        let iri = &body[..end];
        self.rest = &body[end + 1..];
        Iri::parse(iri).ok_or_else(|| self.err(format!("invalid IRI: {iri}")))
    }

    fn blank(&mut self) -> Result<BlankId, ParseError> {
        let body = &self.rest[2..];
        let mut end = body.find(char::is_whitespace).unwrap_or(body.len());
        // a label may contain '.' but never end with one
        while end > 0 && body[..end].ends_with('.') {
            end -= 1;
        }
        let label = &body[..end];
        if label.is_empty() {
            return Err(self.err("empty blank node label"));
        }
        self.rest = &body[end..];
        Ok(BlankId::new(label))
    }

    fn literal(&mut self) -> Result<Literal, ParseError> {
        let mut chars = self.rest[1..].char_indices();
        let mut lexical = String::new();
        let end = loop {
            let Some((i, c)) = chars.next() else {
                return Err(self.err("unterminated literal"));
            };
            match c {
                '"' => break i + 1,
                '\\' => {
                    let Some((_, esc)) = chars.next() else {
                        return Err(self.err("dangling escape"));
                    };
                    match esc {
                        'n' => lexical.push('\n'),
                        'r' => lexical.push('\r'),
                        't' => lexical.push('\t'),
                        'b' => lexical.push('\u{8}'),
                        'f' => lexical.push('\u{c}'),
                        '"' => lexical.push('"'),
                        '\'' => lexical.push('\''),
                        '\\' => lexical.push('\\'),
                        'u' | 'U' => {
                            let width = if esc == 'u' { 4 } else { 8 };
                            let hex: String = chars.by_ref().take(width).map(|(_, c)| c).collect();
                            let decoded = u32::from_str_radix(&hex, 16)
                                .ok()
                                .filter(|_| hex.len() == width)
                                .and_then(char::from_u32)
                                .ok_or_else(|| self.err(format!("invalid escape \\{esc}{hex}")))?;
                            lexical.push(decoded);
                        }
                        other => return Err(self.err(format!("invalid escape \\{other}"))),
                    }
                }
                c => lexical.push(c),
            }
        };
        // `end` is relative to the slice after the opening quote
        self.rest = &self.rest[1 + end..];

        if let Some(rest) = self.rest.strip_prefix('@') {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(self.err("empty language tag"));
            }
            let lang = &rest[..end];
            self.rest = &rest[end..];
            return Ok(Literal::lang(lexical, lang));
        }
        if let Some(rest) = self.rest.strip_prefix("^^") {
            self.rest = rest;
            let datatype = self.iri()?;
            return Ok(Literal::typed(lexical, datatype));
        }
        Ok(Literal::string(lexical))
    }
}
