use std::io::{self, Write};

use super::TriplesEmitter;
use crate::model::vocab::standard;
use crate::model::{Term, Triple};

/// N-Triples format emitter. Streams triples as `<s> <p> <o> .` lines.
pub struct NTriplesEmitter<W: Write> {
    writer: W,
    count: u64,
}

impl<W: Write> NTriplesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, count: 0 }
    }

    /// Escape a string for N-Triples literal (per RDF 1.1 N-Triples spec).
    pub(crate) fn escape_literal(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    // Control chars: \uXXXX
                    out.push_str(&format!("\\u{:04X}", c as u32));
                }
                _ => out.push(c),
            }
        }
        out
    }

    fn term(term: &Term) -> String {
        match term {
            Term::Iri(iri) => format!("<{iri}>"),
            Term::Blank(id) => id.to_string(),
            Term::Literal(lit) => {
                let escaped = Self::escape_literal(lit.lexical());
                match lit.language() {
                    Some(lang) => format!("\"{escaped}\"@{lang}"),
                    None if lit.datatype().as_str() == standard::XSD_STRING => {
                        format!("\"{escaped}\"")
                    }
                    None => format!("\"{escaped}\"^^<{}>", lit.datatype()),
                }
            }
        }
    }
}

impl<W: Write> TriplesEmitter for NTriplesEmitter<W> {
    fn emit(&mut self, triple: &Triple) -> io::Result<()> {
        let s = Self::term(&triple.s);
        let o = Self::term(&triple.o);
        writeln!(self.writer, "{s} <{}> {o} .", triple.p)?;
        self.count += 1;
        Ok(())
    }

    fn add_prefix(&mut self, _prefix: &str, _iri: &str) {
        // N-Triples has no prefixes
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn triple_count(&self) -> u64 {
        self.count
    }
}
