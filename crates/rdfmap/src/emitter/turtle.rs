use std::collections::BTreeMap;
use std::io::{self, Write};

use super::ntriples::NTriplesEmitter;
use super::TriplesEmitter;
use crate::model::vocab::standard;
use crate::model::{Term, Triple};

/// Turtle format emitter with prefix support.
///
/// Triples are written one statement per line; prefixes are flushed before the
/// first triple, so register them up front.
pub struct TurtleEmitter<W: Write> {
    writer: W,
    count: u64,
    prefixes: BTreeMap<String, String>,
    prefix_written: bool,
}

impl<W: Write> TurtleEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            count: 0,
            prefixes: BTreeMap::new(),
            prefix_written: false,
        }
    }

    /// Write all registered prefixes (called before first triple).
    fn write_prefixes(&mut self) -> io::Result<()> {
        if self.prefix_written {
            return Ok(());
        }
        self.prefix_written = true;
        for (prefix, iri) in &self.prefixes {
            writeln!(self.writer, "@prefix {prefix}: <{iri}> .")?;
        }
        if !self.prefixes.is_empty() {
            writeln!(self.writer)?;
        }
        Ok(())
    }

    /// Try to compact an IRI using registered prefixes.
    fn compact_iri(&self, iri: &str) -> String {
        // Find longest matching prefix
        let mut best: Option<(&str, &str)> = None;
        for (prefix, ns) in &self.prefixes {
            if iri.starts_with(ns.as_str())
                && best.is_none_or(|(_, prev_ns)| ns.len() > prev_ns.len())
            {
                best = Some((prefix.as_str(), ns.as_str()));
            }
        }
        if let Some((prefix, ns)) = best {
            let local = &iri[ns.len()..];
            // Only compact if local name is valid (alphanumeric + _)
            if !local.is_empty() && local.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return format!("{prefix}:{local}");
            }
        }
        format!("<{iri}>")
    }

    fn term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => self.compact_iri(iri.as_str()),
            Term::Blank(id) => id.to_string(),
            Term::Literal(lit) => {
                let escaped = NTriplesEmitter::<W>::escape_literal(lit.lexical());
                match lit.language() {
                    Some(lang) => format!("\"{escaped}\"@{lang}"),
                    None if lit.datatype().as_str() == standard::XSD_STRING => {
                        format!("\"{escaped}\"")
                    }
                    None => {
                        let dt = self.compact_iri(lit.datatype().as_str());
                        format!("\"{escaped}\"^^{dt}")
                    }
                }
            }
        }
    }
}

impl<W: Write> TriplesEmitter for TurtleEmitter<W> {
    fn emit(&mut self, triple: &Triple) -> io::Result<()> {
        self.write_prefixes()?;
        let s = self.term(&triple.s);
        let p = if triple.p.as_str() == standard::RDF_TYPE {
            "a".to_string()
        } else {
            self.compact_iri(triple.p.as_str())
        };
        let o = self.term(&triple.o);
        writeln!(self.writer, "{s} {p} {o} .")?;
        self.count += 1;
        Ok(())
    }

    fn add_prefix(&mut self, prefix: &str, iri: &str) {
        self.prefixes.insert(prefix.to_string(), iri.to_string());
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    fn triple_count(&self) -> u64 {
        self.count
    }
}
