//! Reader Engine: triples rooted at a subject into a typed instance.

pub mod argument;
pub mod converter;
pub mod instance;

use std::any::type_name;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::analysis::{
    AnyValue, ClassAnalyzer, ClassDescriptor, ElementKind, Mapped, MappedType, PropertyBinding,
    TypeKey,
};
use crate::error::{ArgumentError, InstanceError, MapperError, ReaderError, ValidationError};
use crate::model::iri::relative_local;
use crate::model::vocab::standard;
use crate::model::{Iri, Term, TripleSource};
use crate::module::ModuleContext;
use argument::ArgumentStrategyFactory;
use converter::{ConverterRegistry, ValueConverter};
use instance::{InstanceStrategy, InstanceStrategyFactory};

/// Reads mapped instances from a [`TripleSource`].
pub struct ObjectReader {
    analyzer: Arc<ClassAnalyzer>,
    instance_strategies: Vec<Arc<dyn InstanceStrategyFactory>>,
    argument_strategies: Vec<Arc<dyn ArgumentStrategyFactory>>,
    converters: ConverterRegistry,
    detect_cycles: bool,
}

impl ObjectReader {
    /// A reader with empty registries; see [`CoreModule`](crate::module::CoreModule).
    pub fn new(analyzer: Arc<ClassAnalyzer>) -> Self {
        Self {
            analyzer,
            instance_strategies: Vec::new(),
            argument_strategies: Vec::new(),
            converters: ConverterRegistry::new(),
            detect_cycles: true,
        }
    }

    /// Fail with [`ReaderError::CyclicReference`] when a subject is reached
    /// again below itself. On by default.
    pub fn set_detect_cycles(&mut self, detect: bool) {
        self.detect_cycles = detect;
    }

    pub fn register_instance_strategy(&mut self, factory: Arc<dyn InstanceStrategyFactory>) {
        self.instance_strategies.push(factory);
    }

    pub fn register_argument_strategy(&mut self, factory: Arc<dyn ArgumentStrategyFactory>) {
        self.argument_strategies.push(factory);
    }

    pub fn register_converter(&mut self, key: TypeKey, converter: Arc<dyn ValueConverter>) {
        self.converters.register(key, converter);
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn read<T: Mapped>(&self, source: &dyn TripleSource, subject: &Iri) -> Result<T, MapperError> {
        let value = self.read_type(MappedType::of::<T>(), source, subject)?;
        value.downcast::<T>().map(|value| *value).map_err(|_| {
            ReaderError::TypeMismatch {
                ty: type_name::<T>().to_string(),
            }
            .into()
        })
    }

    /// Read an instance of `mapped`, returned type-erased.
    pub fn read_type(
        &self,
        mapped: MappedType,
        source: &dyn TripleSource,
        subject: &Iri,
    ) -> Result<AnyValue, MapperError> {
        debug!(ty = %mapped.key(), %subject, "reading");
        let mut path = Vec::new();
        self.read_internal(mapped, source, subject, &mut path)
    }

    fn read_internal(
        &self,
        mapped: MappedType,
        source: &dyn TripleSource,
        subject: &Iri,
        path: &mut Vec<Iri>,
    ) -> Result<AnyValue, MapperError> {
        if self.detect_cycles && path.contains(subject) {
            return Err(ReaderError::CyclicReference {
                subject: subject.to_string(),
            }
            .into());
        }
        let descriptor = self.analyzer.analyze_type(mapped)?;

        let factory = self
            .instance_strategies
            .iter()
            .find(|factory| factory.supports(&descriptor))
            .ok_or_else(|| InstanceError::NoSupportingStrategy {
                ty: descriptor.key().name().to_string(),
            })?;
        trace!(ty = %descriptor.key(), strategy = factory.name(), "selected instance strategy");
        let mut instance = factory.create();
        instance.initialize(&descriptor)?;

        path.push(subject.clone());
        let populated = self.populate(&descriptor, instance.as_mut(), source, subject, path);
        path.pop();
        populated?;

        Ok(instance.build()?)
    }

    fn populate(
        &self,
        descriptor: &ClassDescriptor,
        instance: &mut dyn InstanceStrategy,
        source: &dyn TripleSource,
        subject: &Iri,
        path: &mut Vec<Iri>,
    ) -> Result<(), MapperError> {
        let node = Term::Iri(subject.clone());

        if let Some(binding) = descriptor.type_property().and_then(|d| d.binding()) {
            let types = source.objects(&node, &Iri::new(standard::RDF_TYPE));
            if !types.is_empty() {
                self.attach(binding, &types, false, instance, source, path)?;
            }
        }

        if let Some(property) = descriptor.subject() {
            if let Some(binding) = property.binding() {
                let value = if property.annotation().is_relative() {
                    Term::string(relative_local(subject))
                } else {
                    node.clone()
                };
                self.attach(binding, &[value], false, instance, source, path)?;
            }
        }

        for predicate in descriptor.predicates() {
            let Some(binding) = predicate.binding() else {
                continue;
            };
            let spec = predicate.annotation();
            let values = source.objects(&node, &Iri::new(spec.iri()));
            if values.is_empty() {
                if spec.is_required() {
                    return Err(ValidationError::MissingRequired {
                        ty: descriptor.key().name().to_string(),
                        property: binding.name().to_string(),
                        predicate: spec.iri().to_string(),
                    }
                    .into());
                }
                trace!(property = binding.name(), "optional predicate absent");
                continue;
            }
            if spec.is_readonly() {
                return Err(ValidationError::ReadonlyViolation {
                    ty: descriptor.key().name().to_string(),
                    property: binding.name().to_string(),
                    predicate: spec.iri().to_string(),
                }
                .into());
            }
            self.attach(binding, &values, predicate.is_nested(), instance, source, path)?;
        }
        Ok(())
    }

    /// Convert `values`, aggregate them and hand them to the instance.
    fn attach(
        &self,
        binding: &PropertyBinding,
        values: &[Term],
        nested: bool,
        instance: &mut dyn InstanceStrategy,
        source: &dyn TripleSource,
        path: &mut Vec<Iri>,
    ) -> Result<(), MapperError> {
        let property_type = binding.property_type();
        let factory = self
            .argument_strategies
            .iter()
            .find(|factory| factory.supports(&property_type))
            .ok_or_else(|| ArgumentError::NoSupportingStrategy {
                property: binding.name().to_string(),
            })?;
        trace!(property = binding.name(), strategy = factory.name(), count = values.len(), "aggregating");

        let mut argument = factory.create(binding, values.len());
        for term in values {
            let value = self.read_value(argument.element_type(), term, binding, nested, source, path)?;
            argument.add_value(value)?;
        }
        argument.attach(instance, binding)
    }

    fn read_value(
        &self,
        element: ElementKind,
        term: &Term,
        binding: &PropertyBinding,
        nested: bool,
        source: &dyn TripleSource,
        path: &mut Vec<Iri>,
    ) -> Result<AnyValue, MapperError> {
        match element {
            ElementKind::Mapped(mapped) if nested => {
                let Term::Iri(child) = term else {
                    return Err(ReaderError::NotAResource {
                        property: binding.name().to_string(),
                        term: term.to_string(),
                    }
                    .into());
                };
                self.read_internal(mapped, source, child, path)
            }
            other => {
                let converter = self.converters.get(other.key()).ok_or_else(|| {
                    ReaderError::NoConverter {
                        ty: other.key().name().to_string(),
                    }
                })?;
                Ok(converter.convert(term)?)
            }
        }
    }
}

impl ModuleContext for ObjectReader {
    fn register_instance_strategy(&mut self, factory: Arc<dyn InstanceStrategyFactory>) {
        ObjectReader::register_instance_strategy(self, factory);
    }

    fn register_argument_strategy(&mut self, factory: Arc<dyn ArgumentStrategyFactory>) {
        ObjectReader::register_argument_strategy(self, factory);
    }

    fn register_converter(&mut self, key: TypeKey, converter: Arc<dyn ValueConverter>) {
        ObjectReader::register_converter(self, key, converter);
    }
}
