pub mod graph;
pub mod iri;
pub mod term;
pub mod vocab;

pub use graph::{Graph, TripleSink, TripleSource};
pub use term::{BlankId, Iri, Literal, Term, Triple};
