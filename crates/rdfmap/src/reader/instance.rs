//! Instance Strategies: how the reader constructs and populates an instance.
//!
//! A strategy is created per read, initialized for one type, fed every
//! property value and finally built. Factories are consulted in registration
//! order and the first one supporting the type is used.

use std::sync::Arc;

use tracing::trace;

use crate::analysis::declaration::{BuilderHooks, ConstructorHook};
use crate::analysis::{Aggregate, AnyValue, Arguments, ClassDescriptor, Creation, PropertyBinding, TypeKey};
use crate::error::InstanceError;

pub trait InstanceStrategy {
    fn initialize(&mut self, descriptor: &ClassDescriptor) -> Result<(), InstanceError>;

    /// Whether collection values of `binding` are attached one element at a
    /// time rather than as a whole.
    fn requires_element_handling(&self, _binding: &PropertyBinding) -> bool {
        false
    }

    fn add_property(&mut self, binding: &PropertyBinding, value: Aggregate) -> Result<(), InstanceError>;

    fn build(self: Box<Self>) -> Result<AnyValue, InstanceError>;
}

pub trait InstanceStrategyFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, descriptor: &ClassDescriptor) -> bool;

    fn create(&self) -> Box<dyn InstanceStrategy>;
}

fn type_name(ty: Option<TypeKey>) -> String {
    ty.map(|key| key.name().to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Bean
// ---------------------------------------------------------------------------

/// Default-constructs the instance and populates it through setters.
#[derive(Default)]
pub struct BeanInstanceStrategy {
    ty: Option<TypeKey>,
    instance: Option<AnyValue>,
}

impl InstanceStrategy for BeanInstanceStrategy {
    fn initialize(&mut self, descriptor: &ClassDescriptor) -> Result<(), InstanceError> {
        let construct = descriptor.creation().default.as_ref().ok_or_else(|| {
            InstanceError::MissingDefaultConstructor {
                ty: descriptor.key().name().to_string(),
            }
        })?;
        self.ty = Some(descriptor.key());
        self.instance = Some(construct());
        Ok(())
    }

    fn add_property(&mut self, binding: &PropertyBinding, value: Aggregate) -> Result<(), InstanceError> {
        let instance = self.instance.as_mut().ok_or(InstanceError::NotInitialized)?;
        let setter = binding.setter().ok_or_else(|| InstanceError::MissingSetter {
            ty: type_name(self.ty),
            property: binding.name().to_string(),
        })?;
        setter(&mut **instance, value).map_err(|source| InstanceError::Access {
            ty: type_name(self.ty),
            source,
        })
    }

    fn build(self: Box<Self>) -> Result<AnyValue, InstanceError> {
        self.instance.ok_or(InstanceError::NotInitialized)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BeanInstanceStrategyFactory;

impl InstanceStrategyFactory for BeanInstanceStrategyFactory {
    fn name(&self) -> &'static str {
        "bean"
    }

    fn supports(&self, descriptor: &ClassDescriptor) -> bool {
        descriptor.creation().has_default()
    }

    fn create(&self) -> Box<dyn InstanceStrategy> {
        Box::new(BeanInstanceStrategy::default())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Feeds property values to a builder object, then builds it.
#[derive(Default)]
pub struct BuilderInstanceStrategy {
    ty: Option<TypeKey>,
    creation: Option<Arc<Creation>>,
    builder: Option<AnyValue>,
}

impl BuilderInstanceStrategy {
    fn hooks(&self) -> Result<&BuilderHooks, InstanceError> {
        self.creation
            .as_deref()
            .ok_or(InstanceError::NotInitialized)?
            .builder
            .as_ref()
            .ok_or_else(|| InstanceError::NoSupportingStrategy {
                ty: type_name(self.ty),
            })
    }
}

impl InstanceStrategy for BuilderInstanceStrategy {
    fn initialize(&mut self, descriptor: &ClassDescriptor) -> Result<(), InstanceError> {
        self.ty = Some(descriptor.key());
        self.creation = Some(descriptor.creation().clone());
        let builder = (self.hooks()?.factory)();
        self.builder = Some(builder);
        Ok(())
    }

    fn requires_element_handling(&self, binding: &PropertyBinding) -> bool {
        binding.property_type().shape().is_collection()
            && self.hooks().is_ok_and(|hooks| {
                hooks
                    .method(binding.name())
                    .is_some_and(|method| method.element.is_some())
            })
    }

    fn add_property(&mut self, binding: &PropertyBinding, value: Aggregate) -> Result<(), InstanceError> {
        let per_element = self.requires_element_handling(binding);
        let hooks = self.hooks()?;
        let method = hooks.method(binding.name());
        let call = if per_element {
            method.and_then(|method| method.element.clone())
        } else {
            method.and_then(|method| method.whole.clone().or_else(|| method.element.clone()))
        }
        .ok_or_else(|| InstanceError::MissingBuilderMethod {
            ty: type_name(self.ty),
            property: binding.name().to_string(),
        })?;
        trace!(property = binding.name(), per_element, "invoking builder method");

        let builder = self.builder.take().ok_or(InstanceError::NotInitialized)?;
        let builder = call(builder, value).map_err(|source| InstanceError::Access {
            ty: type_name(self.ty),
            source,
        })?;
        self.builder = Some(builder);
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<AnyValue, InstanceError> {
        let build = self.hooks()?.build.clone();
        let builder = self.builder.ok_or(InstanceError::NotInitialized)?;
        build(builder).map_err(|source| InstanceError::Access {
            ty: type_name(self.ty),
            source,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BuilderInstanceStrategyFactory;

impl InstanceStrategyFactory for BuilderInstanceStrategyFactory {
    fn name(&self) -> &'static str {
        "builder"
    }

    fn supports(&self, descriptor: &ClassDescriptor) -> bool {
        descriptor.creation().has_builder()
    }

    fn create(&self) -> Box<dyn InstanceStrategy> {
        Box::new(BuilderInstanceStrategy::default())
    }
}

// ---------------------------------------------------------------------------
// Constructor
// ---------------------------------------------------------------------------

/// Collects values into constructor parameter slots by property name.
#[derive(Default)]
pub struct ConstructorInstanceStrategy {
    ty: Option<TypeKey>,
    creation: Option<Arc<Creation>>,
    arguments: Option<Arguments>,
}

fn single_constructor(descriptor: &ClassDescriptor) -> Result<&ConstructorHook, InstanceError> {
    let ty = descriptor.key().name().to_string();
    let constructors = &descriptor.creation().constructors;
    let [hook] = constructors.as_slice() else {
        return Err(InstanceError::AmbiguousConstructor {
            ty,
            found: constructors.len(),
        });
    };
    if hook.names.len() != hook.arity {
        return Err(InstanceError::ConstructorArity {
            ty,
            names: hook.names.len(),
            arity: hook.arity,
        });
    }
    Ok(hook)
}

impl InstanceStrategy for ConstructorInstanceStrategy {
    fn initialize(&mut self, descriptor: &ClassDescriptor) -> Result<(), InstanceError> {
        let hook = single_constructor(descriptor)?;
        self.arguments = Some(Arguments::new(hook.names.clone()));
        self.ty = Some(descriptor.key());
        self.creation = Some(descriptor.creation().clone());
        Ok(())
    }

    fn add_property(&mut self, binding: &PropertyBinding, value: Aggregate) -> Result<(), InstanceError> {
        let ty = self.ty;
        let arguments = self.arguments.as_mut().ok_or(InstanceError::NotInitialized)?;
        let index = arguments
            .position(binding.name())
            .ok_or_else(|| InstanceError::UnmatchedProperty {
                ty: type_name(ty),
                property: binding.name().to_string(),
            })?;
        arguments
            .set(index, value)
            .map_err(|source| InstanceError::Access {
                ty: type_name(ty),
                source,
            })
    }

    fn build(self: Box<Self>) -> Result<AnyValue, InstanceError> {
        let creation = self.creation.ok_or(InstanceError::NotInitialized)?;
        let arguments = self.arguments.ok_or(InstanceError::NotInitialized)?;
        let hook = creation
            .constructors
            .first()
            .ok_or(InstanceError::NotInitialized)?;
        (hook.invoke)(arguments).map_err(|source| InstanceError::Access {
            ty: type_name(self.ty),
            source,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorInstanceStrategyFactory;

impl InstanceStrategyFactory for ConstructorInstanceStrategyFactory {
    fn name(&self) -> &'static str {
        "constructor"
    }

    fn supports(&self, descriptor: &ClassDescriptor) -> bool {
        single_constructor(descriptor).is_ok()
    }

    fn create(&self) -> Box<dyn InstanceStrategy> {
        Box::new(ConstructorInstanceStrategy::default())
    }
}
