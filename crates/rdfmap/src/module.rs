//! Configuration surface: modules register strategies, converters,
//! namespaces and mix-ins with each part of the mapper.

use std::sync::Arc;

use crate::analysis::{OverlayDeclaration, TypeKey};
use crate::error::AnalysisError;
use crate::model::vocab::DEFAULT_PREFIXES;
use crate::reader::argument::{
    ArgumentStrategyFactory, ArrayArgumentStrategyFactory, CollectionArgumentStrategyFactory,
    SingleArgumentStrategyFactory,
};
use crate::reader::converter::{ConverterRegistry, ValueConverter};
use crate::reader::instance::{
    BeanInstanceStrategyFactory, BuilderInstanceStrategyFactory,
    ConstructorInstanceStrategyFactory, InstanceStrategyFactory,
};
use crate::writer::wrapper::{OptionWrapperStrategy, WrapperStrategy};

/// Receiver of module registrations. Each part of the mapper implements the
/// registrations it uses and ignores the rest.
pub trait ModuleContext {
    fn register_instance_strategy(&mut self, _factory: Arc<dyn InstanceStrategyFactory>) {}

    fn register_argument_strategy(&mut self, _factory: Arc<dyn ArgumentStrategyFactory>) {}

    fn register_converter(&mut self, _key: TypeKey, _converter: Arc<dyn ValueConverter>) {}

    fn register_namespace(&mut self, _prefix: &str, _iri: &str) {}

    fn register_wrapper_strategy(&mut self, _strategy: Arc<dyn WrapperStrategy>) {}

    fn register_mixin(&mut self, _overlay: OverlayDeclaration) -> Result<(), AnalysisError> {
        Ok(())
    }
}

pub trait Module {
    fn setup(&self, context: &mut dyn ModuleContext) -> Result<(), AnalysisError>;
}

/// A module assembled from individual registrations, applied in the order
/// they were added within each kind.
#[derive(Default, Clone)]
pub struct SimpleModule {
    instance_strategies: Vec<Arc<dyn InstanceStrategyFactory>>,
    argument_strategies: Vec<Arc<dyn ArgumentStrategyFactory>>,
    converters: Vec<(TypeKey, Arc<dyn ValueConverter>)>,
    namespaces: Vec<(String, String)>,
    wrappers: Vec<Arc<dyn WrapperStrategy>>,
    mixins: Vec<OverlayDeclaration>,
}

impl SimpleModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_instance_strategy(mut self, factory: Arc<dyn InstanceStrategyFactory>) -> Self {
        self.instance_strategies.push(factory);
        self
    }

    pub fn add_argument_strategy(mut self, factory: Arc<dyn ArgumentStrategyFactory>) -> Self {
        self.argument_strategies.push(factory);
        self
    }

    /// Register a converter for the leaf type `T`.
    pub fn add_converter<T: 'static>(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converters.push((TypeKey::of::<T>(), converter));
        self
    }

    pub fn add_namespace(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.namespaces.push((prefix.into(), iri.into()));
        self
    }

    pub fn add_wrapper_strategy(mut self, strategy: Arc<dyn WrapperStrategy>) -> Self {
        self.wrappers.push(strategy);
        self
    }

    pub fn add_mixin(mut self, overlay: OverlayDeclaration) -> Self {
        self.mixins.push(overlay);
        self
    }
}

impl Module for SimpleModule {
    fn setup(&self, context: &mut dyn ModuleContext) -> Result<(), AnalysisError> {
        for factory in &self.instance_strategies {
            context.register_instance_strategy(factory.clone());
        }
        for factory in &self.argument_strategies {
            context.register_argument_strategy(factory.clone());
        }
        for (key, converter) in &self.converters {
            context.register_converter(*key, converter.clone());
        }
        for (prefix, iri) in &self.namespaces {
            context.register_namespace(prefix, iri);
        }
        for wrapper in &self.wrappers {
            context.register_wrapper_strategy(wrapper.clone());
        }
        for overlay in &self.mixins {
            context.register_mixin(overlay.clone())?;
        }
        Ok(())
    }
}

/// The strategies, converters and wrappers every mapper starts with.
pub struct CoreModule {
    inner: SimpleModule,
}

impl Default for CoreModule {
    fn default() -> Self {
        let mut inner = SimpleModule::new()
            .add_instance_strategy(Arc::new(BuilderInstanceStrategyFactory))
            .add_instance_strategy(Arc::new(ConstructorInstanceStrategyFactory))
            .add_instance_strategy(Arc::new(BeanInstanceStrategyFactory))
            .add_argument_strategy(Arc::new(ArrayArgumentStrategyFactory))
            .add_argument_strategy(Arc::new(CollectionArgumentStrategyFactory))
            .add_argument_strategy(Arc::new(SingleArgumentStrategyFactory))
            .add_wrapper_strategy(Arc::new(OptionWrapperStrategy));
        inner.converters = ConverterRegistry::builtins();
        for (prefix, iri) in DEFAULT_PREFIXES {
            inner = inner.add_namespace(*prefix, *iri);
        }
        Self { inner }
    }
}

impl Module for CoreModule {
    fn setup(&self, context: &mut dyn ModuleContext) -> Result<(), AnalysisError> {
        self.inner.setup(context)
    }
}
