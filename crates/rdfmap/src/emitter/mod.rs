pub mod ntriples;
pub mod turtle;

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Graph, Triple, TripleSink};
use ntriples::NTriplesEmitter;
use turtle::TurtleEmitter;

/// Trait for emitting RDF triples in different serialization formats.
pub trait TriplesEmitter {
    /// Emit one triple.
    fn emit(&mut self, triple: &Triple) -> io::Result<()>;
    /// Register a namespace prefix (used by Turtle format).
    fn add_prefix(&mut self, prefix: &str, iri: &str);
    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()>;
    /// Return the number of triples emitted so far.
    fn triple_count(&self) -> u64;
}

/// Supported output syntaxes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RdfFormat {
    #[default]
    NTriples,
    Turtle,
}

impl RdfFormat {
    /// Build an emitter for this format over `writer`.
    pub fn emitter<'w, W: Write + 'w>(self, writer: W) -> Box<dyn TriplesEmitter + 'w> {
        match self {
            RdfFormat::NTriples => Box::new(NTriplesEmitter::new(writer)),
            RdfFormat::Turtle => Box::new(TurtleEmitter::new(writer)),
        }
    }
}

impl FromStr for RdfFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ntriples" | "nt" => Ok(RdfFormat::NTriples),
            "turtle" | "ttl" => Ok(RdfFormat::Turtle),
            other => Err(format!("Unknown format: {other}. Use 'ntriples' or 'turtle'.")),
        }
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RdfFormat::NTriples => f.write_str("ntriples"),
            RdfFormat::Turtle => f.write_str("turtle"),
        }
    }
}

/// Streams every triple the writer produces straight into an emitter.
pub struct EmitterSink<E: TriplesEmitter> {
    emitter: E,
}

impl<E: TriplesEmitter> EmitterSink<E> {
    pub fn new(emitter: E) -> Self {
        Self { emitter }
    }

    pub fn into_inner(self) -> E {
        self.emitter
    }
}

impl<E: TriplesEmitter> TripleSink for EmitterSink<E> {
    fn add(&mut self, triple: Triple) -> io::Result<()> {
        self.emitter.emit(&triple)
    }
}

/// Emit a whole graph, registering its prefixes first. Returns the triple count.
pub fn emit_graph(emitter: &mut dyn TriplesEmitter, graph: &Graph) -> io::Result<u64> {
    for (prefix, ns) in &graph.prefixes {
        emitter.add_prefix(prefix, ns);
    }
    for triple in graph {
        emitter.emit(triple)?;
    }
    emitter.flush()?;
    Ok(emitter.triple_count())
}
