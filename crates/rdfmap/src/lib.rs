//! Map typed Rust object graphs to and from RDF triples.
//!
//! A type takes part in mapping by implementing [`Mapped`], declaring its RDF
//! type, how its subject IRI is computed, and which properties map to which
//! predicates. The [`ClassAnalyzer`] turns those declarations into cached
//! [`ClassDescriptor`]s, optionally merged with supertype descriptors and
//! registered mix-ins. The reader walks triples from a subject into an
//! instance, built through a pluggable instance strategy; the writer walks an
//! instance back into triples. For queryable stores, the query generator
//! derives a CONSTRUCT query from the descriptor.
//!
//! [`ObjectMapper`] wires all of these together around one analyzer.

pub mod analysis;
pub mod config;
pub mod emitter;
pub mod error;
pub mod mapper;
pub mod model;
pub mod module;
pub mod parser;
pub mod reader;
pub mod repository;
pub mod writer;

pub use analysis::{
    ClassAnalyzer, ClassDeclaration, ClassDescriptor, Mapped, MergePolicy, Overlay,
    PredicateSpec, Role, SubjectSpec, TypeSpec,
};
pub use config::MapperConfig;
pub use emitter::RdfFormat;
pub use error::{MapperError, Result};
pub use mapper::{ObjectMapper, ObjectMapperBuilder};
pub use model::{Graph, Iri, Literal, Term, Triple, TripleSink, TripleSource};
pub use module::{CoreModule, Module, ModuleContext, SimpleModule};
