use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::declaration::{Declaration, ElementKind, Mapped, MappedType, PropertyType, Role, TypeKey};
use super::descriptor::{
    check_class_subject, check_class_type, check_predicate, ClassDescriptor,
    ClassDescriptorBuilder, PropertyBinding, PropertyDescriptor,
};
use super::mixin::{merge, Inheritance, MixInResolver, OverlayDeclaration, OwnDeclarations};
use crate::error::AnalysisError;
use crate::module::ModuleContext;
use crate::reader::converter::ValueConverter;

/// Builds and caches [`ClassDescriptor`]s.
///
/// Descriptors are computed once per type and shared afterwards. Concurrent
/// callers may analyze the same type twice; the first result to reach the
/// cache is the one everybody gets.
#[derive(Default)]
pub struct ClassAnalyzer {
    cache: RwLock<HashMap<TypeKey, Arc<ClassDescriptor>>>,
    leaves: RwLock<HashSet<TypeKey>>,
    mixins: MixInResolver,
}

impl ClassAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `key` as a leaf: converted directly and never analyzed.
    pub fn register_leaf(&self, key: TypeKey) {
        self.leaves.write().insert(key);
    }

    pub fn is_leaf(&self, key: TypeKey) -> bool {
        self.leaves.read().contains(&key)
    }

    pub fn register_mixin(&self, overlay: OverlayDeclaration) -> Result<(), AnalysisError> {
        self.mixins.register(overlay)
    }

    pub fn analyze<T: Mapped>(&self) -> Result<Arc<ClassDescriptor>, AnalysisError> {
        self.analyze_type(MappedType::of::<T>())
    }

    pub fn analyze_type(&self, mapped: MappedType) -> Result<Arc<ClassDescriptor>, AnalysisError> {
        let mut stack = Vec::new();
        self.analyze_internal(mapped, &mut stack)
    }

    /// The cached descriptor, if `key` was analyzed before.
    pub fn cached(&self, key: TypeKey) -> Option<Arc<ClassDescriptor>> {
        self.cache.read().get(&key).cloned()
    }

    fn analyze_internal(
        &self,
        mapped: MappedType,
        stack: &mut Vec<TypeKey>,
    ) -> Result<Arc<ClassDescriptor>, AnalysisError> {
        let key = mapped.key();
        if self.is_leaf(key) {
            return Err(AnalysisError::UnsupportedType {
                ty: key.name().to_string(),
            });
        }
        if let Some(descriptor) = self.cached(key) {
            debug!(ty = %key, "analysis cache hit");
            return Ok(descriptor);
        }

        debug!(ty = %key, depth = stack.len(), "analyzing type");
        stack.push(key);
        let built = self.build(mapped, stack);
        stack.pop();
        let descriptor = Arc::new(built?);

        let mut cache = self.cache.write();
        Ok(cache.entry(key).or_insert(descriptor).clone())
    }

    fn build(
        &self,
        mapped: MappedType,
        stack: &mut Vec<TypeKey>,
    ) -> Result<ClassDescriptor, AnalysisError> {
        let declaration = mapped.declaration();
        let key = declaration.key();

        let mixin = self
            .mixins
            .resolve(&declaration, &mut |property_type: &PropertyType| {
                self.nested(property_type, stack)
            })?;
        let policy = mixin.as_ref().map(|m| m.policy).unwrap_or_default();

        let inherited = match (&declaration.parent, policy.inherit) {
            (Some(parent), Inheritance::Inherit) => {
                let parent_key = parent.mapped.key();
                if stack.contains(&parent_key) {
                    return Err(AnalysisError::InvalidAnnotation {
                        ty: key.name().to_string(),
                        reason: format!("cyclic inheritance through {parent_key}"),
                    });
                }
                let descriptor = self.analyze_internal(parent.mapped, stack)?;
                Some(descriptor.rebased(&parent.lens))
            }
            _ => None,
        };

        let own = match policy.declarations {
            OwnDeclarations::Keep => self.scan(&declaration, stack)?,
            OwnDeclarations::Override => ClassDescriptorBuilder::new(key),
        };

        let merged = merge(key, own, inherited, mixin);
        Ok(merged.build(Arc::new(declaration.creation)))
    }

    /// Descriptors from the type's own declarations.
    fn scan(
        &self,
        declaration: &Declaration,
        stack: &mut Vec<TypeKey>,
    ) -> Result<ClassDescriptorBuilder, AnalysisError> {
        let key = declaration.key();
        let mut builder = ClassDescriptorBuilder::new(key);

        for spec in &declaration.types {
            check_class_type(spec, key)?;
            builder.set_type(PropertyDescriptor::describe(spec.clone(), None, false, key)?)?;
        }
        for spec in &declaration.subjects {
            check_class_subject(spec, key)?;
            builder.set_subject(PropertyDescriptor::describe(spec.clone(), None, false, key)?)?;
        }

        for property in declaration.properties() {
            let binding = PropertyBinding {
                name: property.name.clone(),
                property_type: property.property_type,
                getter: property.getter.clone(),
                setter: property.setter.clone(),
            };
            match property.role() {
                Some(Role::Predicate(spec)) => {
                    check_predicate(&spec, key, &property.name)?;
                    let nested = self.nested(&property.property_type, stack)?;
                    builder.add_predicate(PropertyDescriptor::describe(
                        spec,
                        Some(binding),
                        nested,
                        key,
                    )?)?;
                }
                Some(Role::Type(spec)) => {
                    builder.set_type(PropertyDescriptor::describe(spec, Some(binding), false, key)?)?
                }
                Some(Role::Subject(spec)) => {
                    builder.set_subject(PropertyDescriptor::describe(spec, Some(binding), false, key)?)?
                }
                None => trace!(ty = %key, property = %property.name, "property carries no mapping role"),
            }
        }
        Ok(builder)
    }

    /// Whether values of `property_type` are read and written as nested
    /// subjects. Nested types are analyzed eagerly unless already on the
    /// stack.
    fn nested(
        &self,
        property_type: &PropertyType,
        stack: &mut Vec<TypeKey>,
    ) -> Result<bool, AnalysisError> {
        match property_type.element() {
            ElementKind::Mapped(mapped)
                if !property_type.shape().is_array() && !self.is_leaf(mapped.key()) =>
            {
                if !stack.contains(&mapped.key()) {
                    self.analyze_internal(mapped, stack)?;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl ModuleContext for &ClassAnalyzer {
    fn register_converter(&mut self, key: TypeKey, _converter: Arc<dyn ValueConverter>) {
        self.register_leaf(key);
    }

    fn register_mixin(&mut self, overlay: OverlayDeclaration) -> Result<(), AnalysisError> {
        ClassAnalyzer::register_mixin(*self, overlay)
    }
}
