//! Mix-ins: metadata overlays registered against a type without touching it.
//!
//! An [`Overlay`] names members of its target type and gives them mapping
//! roles, or supplies computed members of its own. Registered overlays are
//! resolved during analysis and combined with the inherited and own
//! descriptors by [`merge`].

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::declaration::{
    computed_getter, Declaration, Getter, Mapped, PropertyType, PropertyValue, Role, TypeKey,
};
use super::descriptor::{
    check_class_subject, check_class_type, check_predicate, ClassDescriptorBuilder,
    PropertyBinding, PropertyDescriptor, SubjectSpec, TypeSpec,
};
use crate::error::AnalysisError;

/// Whether descriptors of the supertype are copied into the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Inheritance {
    #[default]
    Inherit,
    Isolate,
}

/// Whether the target's own declarations survive next to the overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OwnDeclarations {
    #[default]
    Keep,
    Override,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergePolicy {
    pub inherit: Inheritance,
    pub declarations: OwnDeclarations,
}

#[derive(Clone)]
enum MemberSource {
    /// Bound to the same-name member of the target.
    Target,
    /// Computed by the overlay itself.
    Default(Getter),
}

#[derive(Clone)]
struct Member {
    name: String,
    property_type: PropertyType,
    role: Role,
    source: MemberSource,
}

/// Typed builder for a mix-in targeting `T`.
pub struct Overlay<T> {
    declaration: OverlayDeclaration,
    _target: PhantomData<fn() -> T>,
}

impl<T: Mapped> Overlay<T> {
    pub fn new() -> Self {
        Self {
            declaration: OverlayDeclaration {
                target: TypeKey::of::<T>(),
                key: TypeKey::of::<Overlay<T>>(),
                policy: None,
                types: Vec::new(),
                subjects: Vec::new(),
                members: Vec::new(),
            },
            _target: PhantomData,
        }
    }

    /// Mark this overlay as a mix-in. Unmarked overlays are refused at
    /// registration.
    pub fn mix_in(mut self, policy: MergePolicy) -> Self {
        self.declaration.policy = Some(policy);
        self
    }

    pub fn rdf_type(mut self, spec: TypeSpec) -> Self {
        self.declaration.types.push(spec);
        self
    }

    pub fn subject(mut self, spec: SubjectSpec) -> Self {
        self.declaration.subjects.push(spec);
        self
    }

    /// Give `role` to the target's member `name`, which must exist with the
    /// value type `V`.
    pub fn member<V: PropertyValue>(mut self, name: &str, role: Role) -> Self {
        self.declaration.members.push(Member {
            name: name.to_string(),
            property_type: PropertyType::of::<V>(),
            role,
            source: MemberSource::Target,
        });
        self
    }

    /// A member computed by the overlay. When the target has a same-name
    /// member of the same type, its setter is used for reading.
    pub fn default_member<V, F>(mut self, name: &str, role: Role, f: F) -> Self
    where
        V: PropertyValue,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.declaration.members.push(Member {
            name: name.to_string(),
            property_type: PropertyType::of::<V>(),
            role,
            source: MemberSource::Default(computed_getter(f)),
        });
        self
    }

    pub fn into_declaration(self) -> OverlayDeclaration {
        self.declaration
    }
}

impl<T: Mapped> Default for Overlay<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Erased form of an [`Overlay`], ready for registration.
#[derive(Clone)]
pub struct OverlayDeclaration {
    target: TypeKey,
    key: TypeKey,
    policy: Option<MergePolicy>,
    types: Vec<TypeSpec>,
    subjects: Vec<SubjectSpec>,
    members: Vec<Member>,
}

impl OverlayDeclaration {
    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub fn policy(&self) -> Option<MergePolicy> {
        self.policy
    }
}

impl std::fmt::Debug for OverlayDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayDeclaration")
            .field("target", &self.target)
            .field("policy", &self.policy)
            .field("members", &self.members.len())
            .finish()
    }
}

/// Descriptors contributed by a resolved mix-in.
#[derive(Debug)]
pub struct ResolvedMixIn {
    pub policy: MergePolicy,
    pub descriptors: ClassDescriptorBuilder,
}

/// Registry of mix-ins by target type.
#[derive(Default)]
pub struct MixInResolver {
    overlays: RwLock<HashMap<TypeKey, Arc<OverlayDeclaration>>>,
}

impl MixInResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, overlay: OverlayDeclaration) -> Result<(), AnalysisError> {
        if overlay.policy.is_none() {
            return Err(AnalysisError::MissingMixInMarker {
                target: overlay.target.name().to_string(),
            });
        }
        debug!(target_type = %overlay.target, overlay = %overlay.key, "registered mix-in");
        self.overlays
            .write()
            .insert(overlay.target, Arc::new(overlay));
        Ok(())
    }

    pub fn is_registered(&self, target: TypeKey) -> bool {
        self.overlays.read().contains_key(&target)
    }

    /// Bind the overlay registered for `declaration`'s type, if any.
    ///
    /// `nested` decides, and analyzes when needed, whether a predicate's value
    /// type is a mapped type.
    pub fn resolve(
        &self,
        declaration: &Declaration,
        nested: &mut dyn FnMut(&PropertyType) -> Result<bool, AnalysisError>,
    ) -> Result<Option<ResolvedMixIn>, AnalysisError> {
        let Some(overlay) = self.overlays.read().get(&declaration.key()).cloned() else {
            return Ok(None);
        };
        let target = declaration.key();
        let owner = overlay.key;
        let policy = overlay.policy.unwrap_or_default();
        debug!(target_type = %target, ?policy, "resolving mix-in");

        let mut descriptors = ClassDescriptorBuilder::new(target);
        for spec in &overlay.types {
            check_class_type(spec, owner)?;
            descriptors.set_type(PropertyDescriptor::describe(spec.clone(), None, false, owner)?)?;
        }
        for spec in &overlay.subjects {
            check_class_subject(spec, owner)?;
            descriptors.set_subject(PropertyDescriptor::describe(
                spec.clone(),
                None,
                false,
                owner,
            )?)?;
        }

        for member in &overlay.members {
            let binding = bind(member, declaration)?;
            match &member.role {
                Role::Predicate(spec) => {
                    check_predicate(spec, owner, &member.name)?;
                    let is_nested = nested(&member.property_type)?;
                    descriptors.add_predicate(PropertyDescriptor::describe(
                        spec.clone(),
                        Some(binding),
                        is_nested,
                        owner,
                    )?)?;
                }
                Role::Type(spec) => descriptors.set_type(PropertyDescriptor::describe(
                    spec.clone(),
                    Some(binding),
                    false,
                    owner,
                )?)?,
                Role::Subject(spec) => descriptors.set_subject(PropertyDescriptor::describe(
                    spec.clone(),
                    Some(binding),
                    false,
                    owner,
                )?)?,
            }
        }
        Ok(Some(ResolvedMixIn {
            policy,
            descriptors,
        }))
    }
}

fn bind(member: &Member, declaration: &Declaration) -> Result<PropertyBinding, AnalysisError> {
    let counterpart = declaration.property(&member.name).filter(|property| {
        property.property_type().value() == member.property_type.value()
    });
    match (&member.source, counterpart) {
        (MemberSource::Target, Some(property)) => Ok(PropertyBinding {
            name: member.name.clone(),
            property_type: member.property_type,
            getter: property.getter.clone(),
            setter: property.setter.clone(),
        }),
        (MemberSource::Target, None) => Err(AnalysisError::MixinBindingNotFound {
            target: declaration.key().name().to_string(),
            member: member.name.clone(),
        }),
        (MemberSource::Default(getter), counterpart) => Ok(PropertyBinding {
            name: member.name.clone(),
            property_type: member.property_type,
            getter: Some(getter.clone()),
            setter: counterpart.and_then(|property| property.setter.clone()),
        }),
    }
}

/// Combine the descriptor layers of one type.
///
/// Inherited descriptors come first unless the policy isolates the type, then
/// the type's own unless the mix-in overrides them, then the mix-in's. A later
/// layer replaces the type and subject descriptors of earlier ones and appends
/// its predicates.
pub fn merge(
    key: TypeKey,
    own: ClassDescriptorBuilder,
    inherited: Option<ClassDescriptorBuilder>,
    mixin: Option<ResolvedMixIn>,
) -> ClassDescriptorBuilder {
    let policy = mixin.as_ref().map(|m| m.policy).unwrap_or_default();
    let mut merged = match inherited {
        Some(inherited) if policy.inherit == Inheritance::Inherit => inherited.for_type(key),
        _ => ClassDescriptorBuilder::new(key),
    };
    if policy.declarations == OwnDeclarations::Keep {
        merged.overlay(own);
    }
    if let Some(mixin) = mixin {
        merged.overlay(mixin.descriptors);
    }
    merged
}
