//! Reading from and writing to a queryable repository.

pub mod query;

use tracing::debug;

use crate::analysis::Mapped;
use crate::error::{MapperError, RepositoryError};
use crate::model::{Graph, Iri, Term};
use crate::reader::ObjectReader;
use crate::writer::ObjectWriter;
use query::{QueryGenerator, VAR_SUBJECT};

/// A store that evaluates CONSTRUCT queries and accepts new triples.
pub trait Repository {
    /// Evaluate `query` with the given variable bindings (names without `?`).
    fn construct(&self, query: &str, bindings: &[(&str, Term)]) -> Result<Graph, RepositoryError>;

    fn add(&mut self, graph: &Graph) -> Result<(), RepositoryError>;
}

/// Runs the generated query for a type and reads the result graph.
pub struct RepositoryObjectReader<'m> {
    reader: &'m ObjectReader,
    generator: &'m QueryGenerator,
}

impl<'m> RepositoryObjectReader<'m> {
    pub fn new(reader: &'m ObjectReader, generator: &'m QueryGenerator) -> Self {
        Self { reader, generator }
    }

    pub fn read<T: Mapped>(&self, repository: &dyn Repository, subject: &Iri) -> Result<T, MapperError> {
        let query = self.generator.generate::<T>()?;
        debug!(%subject, "evaluating construct query");
        let graph = repository.construct(&query, &[(VAR_SUBJECT, Term::Iri(subject.clone()))])?;
        self.reader.read(&graph, subject)
    }
}

/// Writes an instance into a graph and adds it to the repository.
pub struct RepositoryObjectWriter<'m> {
    writer: &'m ObjectWriter,
}

impl<'m> RepositoryObjectWriter<'m> {
    pub fn new(writer: &'m ObjectWriter) -> Self {
        Self { writer }
    }

    pub fn write<T: Mapped>(
        &self,
        repository: &mut dyn Repository,
        value: &T,
        subject: &Iri,
    ) -> Result<(), MapperError> {
        let graph = self.writer.write_graph(value, subject)?;
        debug!(%subject, triples = graph.len(), "adding to repository");
        repository.add(&graph)?;
        Ok(())
    }
}
