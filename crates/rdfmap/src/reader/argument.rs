//! Argument Strategies: per-property accumulation of converted values.

use crate::analysis::{Aggregate, AnyValue, ElementKind, PropertyBinding, PropertyType, Shape};
use crate::error::{ArgumentError, MapperError};

use super::instance::InstanceStrategy;

pub trait ArgumentStrategy {
    /// Type each accumulated value must have.
    fn element_type(&self) -> ElementKind;

    fn add_value(&mut self, value: AnyValue) -> Result<(), ArgumentError>;

    fn finalize(self: Box<Self>) -> Result<Aggregate, ArgumentError>;

    /// Hand the accumulated value to `instance`.
    fn attach(
        self: Box<Self>,
        instance: &mut dyn InstanceStrategy,
        binding: &PropertyBinding,
    ) -> Result<(), MapperError> {
        let value = self.finalize()?;
        instance.add_property(binding, value)?;
        Ok(())
    }
}

pub trait ArgumentStrategyFactory: Send + Sync {
    fn name(&self) -> &'static str;

    fn supports(&self, property_type: &PropertyType) -> bool;

    /// `size` is the number of values that will be offered.
    fn create(&self, binding: &PropertyBinding, size: usize) -> Box<dyn ArgumentStrategy>;
}

/// Holds at most one value.
pub struct SingleArgumentStrategy {
    property: String,
    element: ElementKind,
    value: Option<AnyValue>,
}

impl ArgumentStrategy for SingleArgumentStrategy {
    fn element_type(&self) -> ElementKind {
        self.element
    }

    fn add_value(&mut self, value: AnyValue) -> Result<(), ArgumentError> {
        if self.value.is_some() {
            return Err(ArgumentError::Overwrite {
                property: self.property.clone(),
            });
        }
        self.value = Some(value);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Aggregate, ArgumentError> {
        Ok(self.value.map_or(Aggregate::Absent, Aggregate::Single))
    }
}

/// Accepts any property; registered last as the fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleArgumentStrategyFactory;

impl ArgumentStrategyFactory for SingleArgumentStrategyFactory {
    fn name(&self) -> &'static str {
        "single"
    }

    fn supports(&self, _property_type: &PropertyType) -> bool {
        true
    }

    fn create(&self, binding: &PropertyBinding, _size: usize) -> Box<dyn ArgumentStrategy> {
        Box::new(SingleArgumentStrategy {
            property: binding.name().to_string(),
            element: binding.property_type().element(),
            value: None,
        })
    }
}

/// Fixed capacity, taken from the number of matching triples.
pub struct ArrayArgumentStrategy {
    property: String,
    element: ElementKind,
    capacity: usize,
    values: Vec<AnyValue>,
}

impl ArgumentStrategy for ArrayArgumentStrategy {
    fn element_type(&self) -> ElementKind {
        self.element
    }

    fn add_value(&mut self, value: AnyValue) -> Result<(), ArgumentError> {
        if self.values.len() >= self.capacity {
            return Err(ArgumentError::Overflow {
                property: self.property.clone(),
                capacity: self.capacity,
            });
        }
        self.values.push(value);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Aggregate, ArgumentError> {
        Ok(Aggregate::Elements(self.values))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayArgumentStrategyFactory;

impl ArgumentStrategyFactory for ArrayArgumentStrategyFactory {
    fn name(&self) -> &'static str {
        "array"
    }

    fn supports(&self, property_type: &PropertyType) -> bool {
        matches!(property_type.shape(), Shape::Array(_))
    }

    fn create(&self, binding: &PropertyBinding, size: usize) -> Box<dyn ArgumentStrategy> {
        Box::new(ArrayArgumentStrategy {
            property: binding.name().to_string(),
            element: binding.property_type().element(),
            capacity: size,
            values: Vec::with_capacity(size),
        })
    }
}

/// Growable list or set; values keep arrival order and sets drop duplicates
/// when the property value is rebuilt.
pub struct CollectionArgumentStrategy {
    element: ElementKind,
    values: Vec<AnyValue>,
}

impl ArgumentStrategy for CollectionArgumentStrategy {
    fn element_type(&self) -> ElementKind {
        self.element
    }

    fn add_value(&mut self, value: AnyValue) -> Result<(), ArgumentError> {
        self.values.push(value);
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<Aggregate, ArgumentError> {
        Ok(Aggregate::Elements(self.values))
    }

    fn attach(
        self: Box<Self>,
        instance: &mut dyn InstanceStrategy,
        binding: &PropertyBinding,
    ) -> Result<(), MapperError> {
        if !instance.requires_element_handling(binding) {
            let value = self.finalize()?;
            instance.add_property(binding, value)?;
            return Ok(());
        }
        for value in self.values {
            instance.add_property(binding, Aggregate::Single(value))?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CollectionArgumentStrategyFactory;

impl ArgumentStrategyFactory for CollectionArgumentStrategyFactory {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn supports(&self, property_type: &PropertyType) -> bool {
        property_type.shape().is_collection()
    }

    fn create(&self, binding: &PropertyBinding, size: usize) -> Box<dyn ArgumentStrategy> {
        Box::new(CollectionArgumentStrategy {
            element: binding.property_type().element(),
            values: Vec::with_capacity(size),
        })
    }
}
