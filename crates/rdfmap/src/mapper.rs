use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::analysis::{ClassAnalyzer, ClassDescriptor, Mapped};
use crate::config::MapperConfig;
use crate::emitter::{emit_graph, RdfFormat};
use crate::error::{MapperError, ReaderError, WriterError};
use crate::model::{Graph, Iri, TripleSource};
use crate::module::{CoreModule, Module};
use crate::parser::parse_ntriples;
use crate::reader::ObjectReader;
use crate::repository::query::QueryGenerator;
use crate::repository::{RepositoryObjectReader, RepositoryObjectWriter};
use crate::writer::ObjectWriter;

/// Entry point tying the analyzer, both engines and the query generator to
/// one shared descriptor cache.
pub struct ObjectMapper {
    analyzer: Arc<ClassAnalyzer>,
    reader: ObjectReader,
    writer: ObjectWriter,
    queries: QueryGenerator,
    config: MapperConfig,
}

impl ObjectMapper {
    /// A mapper with [`CoreModule`] installed and default settings.
    pub fn new() -> Result<Self, MapperError> {
        Self::builder().build()
    }

    pub fn with_config(config: MapperConfig) -> Result<Self, MapperError> {
        Self::builder().config(config).build()
    }

    /// Start a mapper whose modules are applied in registration order,
    /// ahead of [`CoreModule`].
    pub fn builder() -> ObjectMapperBuilder {
        ObjectMapperBuilder::default()
    }

    fn bare(config: MapperConfig) -> Self {
        let analyzer = Arc::new(ClassAnalyzer::new());
        Self {
            reader: ObjectReader::new(analyzer.clone()),
            writer: ObjectWriter::new(analyzer.clone()),
            queries: QueryGenerator::new(analyzer.clone()),
            analyzer,
            config,
        }
    }

    /// Apply `module` to the analyzer, the reader and the writer, in that
    /// order. Its strategies go after every strategy already registered, so
    /// they only see what earlier ones declined; use [`ObjectMapper::builder`]
    /// to place strategies ahead of the core ones.
    pub fn add_module(&mut self, module: &dyn Module) -> Result<&mut Self, MapperError> {
        let mut analyzer: &ClassAnalyzer = &self.analyzer;
        module.setup(&mut analyzer)?;
        module.setup(&mut self.reader)?;
        module.setup(&mut self.writer)?;
        Ok(self)
    }

    pub fn analyzer(&self) -> &ClassAnalyzer {
        &self.analyzer
    }

    pub fn reader(&self) -> &ObjectReader {
        &self.reader
    }

    pub fn writer(&self) -> &ObjectWriter {
        &self.writer
    }

    pub fn queries(&self) -> &QueryGenerator {
        &self.queries
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn analyze<T: Mapped>(&self) -> Result<Arc<ClassDescriptor>, MapperError> {
        Ok(self.analyzer.analyze::<T>()?)
    }

    pub fn read<T: Mapped>(&self, source: &dyn TripleSource, subject: &str) -> Result<T, MapperError> {
        let subject = Iri::parse(subject).ok_or_else(|| ReaderError::InvalidSubject {
            value: subject.to_string(),
        })?;
        self.reader.read(source, &subject)
    }

    /// Parse an N-Triples document and read `subject` from it.
    pub fn read_str<T: Mapped>(&self, input: &str, subject: &str) -> Result<T, MapperError> {
        let graph = parse_ntriples(input)?;
        self.read(&graph, subject)
    }

    pub fn write<T: Mapped>(&self, value: &T, subject: &str) -> Result<Graph, MapperError> {
        let subject = Iri::parse(subject).ok_or_else(|| WriterError::InvalidIri {
            value: subject.to_string(),
        })?;
        self.writer.write_graph(value, &subject)
    }

    /// Serialize `value` in `format`. Returns the number of triples written.
    pub fn write_to<T: Mapped, W: Write>(
        &self,
        out: W,
        value: &T,
        subject: &str,
        format: RdfFormat,
    ) -> Result<u64, MapperError> {
        let graph = self.write(value, subject)?;
        let mut emitter = format.emitter(out);
        Ok(emit_graph(emitter.as_mut(), &graph)?)
    }

    /// Serialize `value` to a string in the configured format.
    pub fn write_string<T: Mapped>(&self, value: &T, subject: &str) -> Result<String, MapperError> {
        let mut out = Vec::new();
        self.write_to(&mut out, value, subject, self.config.format)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn repository_reader(&self) -> RepositoryObjectReader<'_> {
        RepositoryObjectReader::new(&self.reader, &self.queries)
    }

    pub fn repository_writer(&self) -> RepositoryObjectWriter<'_> {
        RepositoryObjectWriter::new(&self.writer)
    }
}

/// Assembles an [`ObjectMapper`]. Strategy resolution is first match wins,
/// so the modules added here take precedence over [`CoreModule`], which is
/// applied last unless [`without_core`](Self::without_core) is called.
pub struct ObjectMapperBuilder {
    config: MapperConfig,
    modules: Vec<Box<dyn Module>>,
    core: bool,
}

impl Default for ObjectMapperBuilder {
    fn default() -> Self {
        Self {
            config: MapperConfig::default(),
            modules: Vec::new(),
            core: true,
        }
    }
}

impl ObjectMapperBuilder {
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Leave [`CoreModule`] out; every strategy and converter must then come
    /// from the added modules.
    pub fn without_core(mut self) -> Self {
        self.core = false;
        self
    }

    pub fn build(self) -> Result<ObjectMapper, MapperError> {
        let mut mapper = ObjectMapper::bare(self.config);
        for module in &self.modules {
            mapper.add_module(module.as_ref())?;
        }
        if self.core {
            mapper.add_module(&CoreModule::default())?;
        }
        mapper.reader.set_detect_cycles(mapper.config.detect_cycles);
        for (prefix, iri) in &mapper.config.namespaces {
            mapper.writer.register_namespace(prefix, iri);
        }
        debug!(
            format = %mapper.config.format,
            modules = self.modules.len(),
            core = self.core,
            "object mapper ready"
        );
        Ok(mapper)
    }
}
