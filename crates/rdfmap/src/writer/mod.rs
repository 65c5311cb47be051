//! Writer Engine: a typed instance into triples rooted at a subject.

pub mod datum;
pub mod wrapper;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::analysis::{ClassAnalyzer, Mapped, MappedType, PredicateSpec, PropertyDescriptor, SubjectSpec};
use crate::error::{MapperError, ValidationError, WriterError};
use crate::model::iri::relative_iri;
use crate::model::vocab::standard;
use crate::model::{Graph, Iri, Literal, Term, Triple, TripleSink};
use crate::module::ModuleContext;
use datum::Datum;
use wrapper::WrapperStrategy;

/// Writes mapped instances into a [`TripleSink`].
pub struct ObjectWriter {
    analyzer: Arc<ClassAnalyzer>,
    wrappers: Vec<Arc<dyn WrapperStrategy>>,
    namespaces: BTreeMap<String, String>,
}

impl ObjectWriter {
    pub fn new(analyzer: Arc<ClassAnalyzer>) -> Self {
        Self {
            analyzer,
            wrappers: Vec::new(),
            namespaces: BTreeMap::new(),
        }
    }

    pub fn register_wrapper_strategy(&mut self, strategy: Arc<dyn WrapperStrategy>) {
        self.wrappers.push(strategy);
    }

    pub fn register_namespace(&mut self, prefix: &str, iri: &str) {
        self.namespaces.insert(prefix.to_string(), iri.to_string());
    }

    /// Prefixes handed to serializers.
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    pub fn write<T: Mapped>(
        &self,
        value: &T,
        subject: &Iri,
        sink: &mut dyn TripleSink,
    ) -> Result<(), MapperError> {
        self.write_type(MappedType::of::<T>(), value, subject, sink)
    }

    /// Write into a fresh [`Graph`] carrying the registered namespaces.
    pub fn write_graph<T: Mapped>(&self, value: &T, subject: &Iri) -> Result<Graph, MapperError> {
        let mut graph = Graph::new();
        for (prefix, iri) in &self.namespaces {
            graph.add_prefix(prefix.as_str(), iri.as_str());
        }
        self.write(value, subject, &mut graph)?;
        Ok(graph)
    }

    /// Write a type-erased value of `mapped`.
    pub fn write_type(
        &self,
        mapped: MappedType,
        value: &dyn Any,
        subject: &Iri,
        sink: &mut dyn TripleSink,
    ) -> Result<(), MapperError> {
        debug!(ty = %mapped.key(), %subject, "writing");
        self.write_internal(mapped, value, subject, sink)
    }

    fn write_internal(
        &self,
        mapped: MappedType,
        value: &dyn Any,
        subject: &Iri,
        sink: &mut dyn TripleSink,
    ) -> Result<(), MapperError> {
        let descriptor = self.analyzer.analyze_type(mapped)?;
        let ty = descriptor.key().name();

        if let Some(types) = descriptor.type_property() {
            for iri in types.annotation().iris() {
                sink.add(Triple::new(
                    subject.clone(),
                    Iri::new(standard::RDF_TYPE),
                    Iri::new(iri),
                ))?;
            }
        }

        for predicate in descriptor.predicates() {
            let name = predicate.name().unwrap_or_default();
            let getter = predicate.getter().ok_or_else(|| WriterError::MissingGetter {
                ty: ty.to_string(),
                property: name.to_string(),
            })?;
            let raw = getter(value).map_err(|source| WriterError::Access {
                ty: ty.to_string(),
                property: name.to_string(),
                source,
            })?;

            let spec = predicate.annotation();
            let Some(content) = self.unwrap(raw, name)? else {
                if spec.is_required() {
                    return Err(ValidationError::MissingRequired {
                        ty: ty.to_string(),
                        property: name.to_string(),
                        predicate: spec.iri().to_string(),
                    }
                    .into());
                }
                trace!(property = name, "optional property absent");
                continue;
            };

            let iri = Iri::new(spec.iri());
            match content {
                Datum::Seq(elements) | Datum::Array(elements) => {
                    for element in elements {
                        self.write_statement(spec, subject, &iri, element, name, sink)?;
                    }
                }
                scalar => self.write_statement(spec, subject, &iri, scalar, name, sink)?,
            }
        }
        Ok(())
    }

    /// Open a wrapper value with the first supporting strategy. An empty
    /// wrapper yields `None`.
    fn unwrap<'a>(&self, datum: Datum<'a>, property: &str) -> Result<Option<Datum<'a>>, WriterError> {
        if !matches!(datum, Datum::Wrapped { .. }) {
            return Ok(Some(datum));
        }
        let strategy = self
            .wrappers
            .iter()
            .find(|strategy| strategy.supports(&datum))
            .ok_or_else(|| WriterError::UnsupportedValue {
                property: property.to_string(),
                reason: "no wrapper strategy recognizes the value".into(),
            })?;
        if !strategy.is_present(&datum) {
            return Ok(None);
        }
        match strategy.unwrap(datum) {
            Some(inner) => self.unwrap(inner, property),
            None => Ok(None),
        }
    }

    fn write_statement(
        &self,
        spec: &PredicateSpec,
        subject: &Iri,
        predicate: &Iri,
        value: Datum<'_>,
        property: &str,
        sink: &mut dyn TripleSink,
    ) -> Result<(), MapperError> {
        match value {
            Datum::Object { value, mapped } => {
                let descriptor = self.analyzer.analyze_type(mapped)?;
                let subject_property =
                    descriptor
                        .subject()
                        .ok_or_else(|| WriterError::MissingSubject {
                            ty: mapped.key().name().to_string(),
                        })?;
                let child = self.child_subject(subject_property, value.as_any(), subject, mapped)?;
                sink.add(Triple::new(subject.clone(), predicate.clone(), child.clone()))?;
                self.write_internal(mapped, value.as_any(), &child, sink)
            }
            Datum::Leaf(lexical) => {
                let object = if spec.is_literal() {
                    Term::Literal(Literal::typed(lexical.as_ref(), Iri::new(spec.datatype_iri())))
                } else {
                    Term::Iri(Iri::parse(lexical.as_ref()).ok_or_else(|| WriterError::InvalidIri {
                        value: lexical.to_string(),
                    })?)
                };
                sink.add(Triple::new(subject.clone(), predicate.clone(), object))?;
                Ok(())
            }
            other => Err(WriterError::UnsupportedValue {
                property: property.to_string(),
                reason: format!("unexpected {} element", other.kind()),
            }
            .into()),
        }
    }

    /// Subject of a nested value: the fixed class-level value, or whatever the
    /// subject accessor returns, composed under `parent` when relative.
    fn child_subject(
        &self,
        property: &PropertyDescriptor<SubjectSpec>,
        value: &dyn Any,
        parent: &Iri,
        mapped: MappedType,
    ) -> Result<Iri, MapperError> {
        let ty = mapped.key().name();
        let spec = property.annotation();
        let local = match property.getter() {
            None if !spec.value().trim().is_empty() => spec.value().to_string(),
            None => return Err(WriterError::EmptySubject { ty: ty.to_string() }.into()),
            Some(getter) => {
                let raw = getter(value).map_err(|source| WriterError::Access {
                    ty: ty.to_string(),
                    property: property.name().unwrap_or_default().to_string(),
                    source,
                })?;
                match self.unwrap(raw, property.name().unwrap_or_default())? {
                    Some(Datum::Leaf(lexical)) if !lexical.is_empty() => lexical.into_owned(),
                    Some(Datum::Leaf(_)) | None => {
                        return Err(WriterError::EmptySubject { ty: ty.to_string() }.into())
                    }
                    Some(other) => {
                        return Err(WriterError::UnsupportedValue {
                            property: property.name().unwrap_or_default().to_string(),
                            reason: format!("subject must be a leaf value, got {}", other.kind()),
                        }
                        .into())
                    }
                }
            }
        };

        if spec.is_relative() {
            return Ok(relative_iri(parent, &local));
        }
        Iri::parse(&local).ok_or_else(|| WriterError::InvalidIri { value: local }.into())
    }
}

impl ModuleContext for ObjectWriter {
    fn register_namespace(&mut self, prefix: &str, iri: &str) {
        ObjectWriter::register_namespace(self, prefix, iri);
    }

    fn register_wrapper_strategy(&mut self, strategy: Arc<dyn WrapperStrategy>) {
        ObjectWriter::register_wrapper_strategy(self, strategy);
    }
}
