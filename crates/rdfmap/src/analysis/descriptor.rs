//! Immutable metadata describing how one mapped type maps to triples.

use std::fmt;
use std::sync::Arc;

use super::declaration::{Creation, Getter, Lens, PropertyType, Setter, TypeKey};
use crate::error::AnalysisError;
use crate::model::vocab::standard;
use crate::model::Iri;

// ---------------------------------------------------------------------------
// Role specifications
// ---------------------------------------------------------------------------

/// RDF type IRI(s) asserted for, or read into, an instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSpec {
    iris: Vec<String>,
}

impl TypeSpec {
    pub fn new<I, S>(iris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            iris: iris.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(iri: impl Into<String>) -> Self {
        Self {
            iris: vec![iri.into()],
        }
    }

    /// A type role without IRIs; used on properties that receive `rdf:type`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iris(&self) -> &[String] {
        &self.iris
    }
}

/// How instances compute their own subject.
///
/// On a class the value is the subject itself (or its local part when
/// relative). On a property the value is empty and the property supplies it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubjectSpec {
    value: String,
    relative: bool,
}

impl SubjectSpec {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            relative: false,
        }
    }

    /// Subject role for a property.
    pub fn property() -> Self {
        Self::default()
    }

    /// Compose the subject as `{parent}#{value}` under the parent subject.
    pub fn relative(mut self) -> Self {
        self.relative = true;
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_relative(&self) -> bool {
        self.relative
    }
}

/// Binds a property to a predicate IRI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PredicateSpec {
    iri: String,
    required: bool,
    readonly: bool,
    literal: bool,
    datatype: String,
}

impl PredicateSpec {
    /// A required, writable, IRI-valued predicate.
    pub fn new(iri: impl Into<String>) -> Self {
        Self {
            iri: iri.into(),
            required: true,
            readonly: false,
            literal: false,
            datatype: standard::XSD_STRING.to_string(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Computed on write, never accepted on read.
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Write leaf values as literals instead of IRIs.
    pub fn literal(mut self) -> Self {
        self.literal = true;
        self
    }

    pub fn datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = datatype.into();
        self
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }

    pub fn datatype_iri(&self) -> &str {
        &self.datatype
    }
}

fn invalid(owner: TypeKey, reason: String) -> AnalysisError {
    AnalysisError::InvalidAnnotation {
        ty: owner.name().to_string(),
        reason,
    }
}

pub(crate) fn check_class_type(spec: &TypeSpec, owner: TypeKey) -> Result<(), AnalysisError> {
    if spec.iris.is_empty() {
        return Err(invalid(owner, "type declaration names no IRI".into()));
    }
    for iri in &spec.iris {
        if Iri::parse(iri).is_none() {
            return Err(invalid(owner, format!("type '{iri}' is not an absolute IRI")));
        }
    }
    Ok(())
}

pub(crate) fn check_class_subject(spec: &SubjectSpec, owner: TypeKey) -> Result<(), AnalysisError> {
    if spec.value.trim().is_empty() {
        return Err(invalid(owner, "subject declaration has a blank value".into()));
    }
    if !spec.relative && Iri::parse(&spec.value).is_none() {
        return Err(invalid(
            owner,
            format!("subject '{}' is not an absolute IRI", spec.value),
        ));
    }
    Ok(())
}

pub(crate) fn check_predicate(
    spec: &PredicateSpec,
    owner: TypeKey,
    property: &str,
) -> Result<(), AnalysisError> {
    if Iri::parse(&spec.iri).is_none() {
        return Err(invalid(
            owner,
            format!("predicate '{}' of '{property}' is not an absolute IRI", spec.iri),
        ));
    }
    if spec.literal && Iri::parse(&spec.datatype).is_none() {
        return Err(invalid(
            owner,
            format!("datatype '{}' of '{property}' is not an absolute IRI", spec.datatype),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Property descriptors
// ---------------------------------------------------------------------------

/// Name, declared type and accessors of a bound property.
#[derive(Clone)]
pub struct PropertyBinding {
    pub(crate) name: String,
    pub(crate) property_type: PropertyType,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl PropertyBinding {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    fn rebased(&self, lens: &Lens) -> Self {
        Self {
            name: self.name.clone(),
            property_type: self.property_type,
            getter: self.getter.as_ref().map(|getter| lens.getter(getter)),
            setter: self.setter.as_ref().map(|setter| lens.setter(setter)),
        }
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("name", &self.name)
            .field("property_type", &self.property_type)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// One mapped property (or class-level declaration when unbound).
#[derive(Clone, Debug)]
pub struct PropertyDescriptor<A> {
    annotation: A,
    binding: Option<PropertyBinding>,
    nested: bool,
    declared_by: TypeKey,
}

impl<A> PropertyDescriptor<A> {
    pub fn builder() -> PropertyDescriptorBuilder<A> {
        PropertyDescriptorBuilder::default()
    }

    pub fn annotation(&self) -> &A {
        &self.annotation
    }

    pub fn binding(&self) -> Option<&PropertyBinding> {
        self.binding.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.binding.as_ref().map(PropertyBinding::name)
    }

    pub fn getter(&self) -> Option<&Getter> {
        self.binding.as_ref().and_then(PropertyBinding::getter)
    }

    pub fn setter(&self) -> Option<&Setter> {
        self.binding.as_ref().and_then(PropertyBinding::setter)
    }

    /// Whether values are themselves mapped types.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// The type whose declaration (or mix-in) introduced this property.
    pub fn declared_by(&self) -> TypeKey {
        self.declared_by
    }
}

impl<A> PropertyDescriptor<A> {
    pub(crate) fn describe(
        annotation: A,
        binding: Option<PropertyBinding>,
        nested: bool,
        owner: TypeKey,
    ) -> Result<Self, AnalysisError> {
        let mut builder = Self::builder()
            .annotation(annotation)?
            .nested(nested)?
            .declared_by(owner)?;
        if let Some(binding) = binding {
            builder = builder.binding(binding)?;
        }
        builder.build()
    }
}

impl<A: Clone> PropertyDescriptor<A> {
    /// Copy whose accessors reach the property through `lens`.
    pub(crate) fn rebased(&self, lens: &Lens) -> Self {
        Self {
            annotation: self.annotation.clone(),
            binding: self.binding.as_ref().map(|binding| binding.rebased(lens)),
            nested: self.nested,
            declared_by: self.declared_by,
        }
    }
}

impl<A: PartialEq> PartialEq for PropertyDescriptor<A> {
    fn eq(&self, other: &Self) -> bool {
        self.declared_by == other.declared_by
            && self.name() == other.name()
            && self.annotation == other.annotation
    }
}

/// Builder for [`PropertyDescriptor`]; every field can be set once.
#[derive(Debug)]
pub struct PropertyDescriptorBuilder<A> {
    annotation: Option<A>,
    binding: Option<PropertyBinding>,
    nested: Option<bool>,
    declared_by: Option<TypeKey>,
}

impl<A> Default for PropertyDescriptorBuilder<A> {
    fn default() -> Self {
        Self {
            annotation: None,
            binding: None,
            nested: None,
            declared_by: None,
        }
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), AnalysisError> {
    if slot.is_some() {
        return Err(AnalysisError::FieldAlreadySet { field });
    }
    *slot = Some(value);
    Ok(())
}

impl<A> PropertyDescriptorBuilder<A> {
    pub fn annotation(mut self, annotation: A) -> Result<Self, AnalysisError> {
        set_once(&mut self.annotation, annotation, "annotation")?;
        Ok(self)
    }

    pub fn binding(mut self, binding: PropertyBinding) -> Result<Self, AnalysisError> {
        set_once(&mut self.binding, binding, "binding")?;
        Ok(self)
    }

    pub fn nested(mut self, nested: bool) -> Result<Self, AnalysisError> {
        set_once(&mut self.nested, nested, "nested")?;
        Ok(self)
    }

    pub fn declared_by(mut self, owner: TypeKey) -> Result<Self, AnalysisError> {
        set_once(&mut self.declared_by, owner, "declared_by")?;
        Ok(self)
    }

    pub fn build(self) -> Result<PropertyDescriptor<A>, AnalysisError> {
        Ok(PropertyDescriptor {
            annotation: self.annotation.ok_or(AnalysisError::FieldMissing {
                field: "annotation",
            })?,
            binding: self.binding,
            nested: self.nested.unwrap_or(false),
            declared_by: self.declared_by.ok_or(AnalysisError::FieldMissing {
                field: "declared_by",
            })?,
        })
    }
}

// ---------------------------------------------------------------------------
// Class descriptors
// ---------------------------------------------------------------------------

/// Accumulates the descriptors of one type during analysis.
#[derive(Clone, Debug)]
pub struct ClassDescriptorBuilder {
    key: TypeKey,
    type_property: Option<PropertyDescriptor<TypeSpec>>,
    subject: Option<PropertyDescriptor<SubjectSpec>>,
    predicates: Vec<PropertyDescriptor<PredicateSpec>>,
}

impl ClassDescriptorBuilder {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            type_property: None,
            subject: None,
            predicates: Vec::new(),
        }
    }

    pub fn set_type(&mut self, descriptor: PropertyDescriptor<TypeSpec>) -> Result<(), AnalysisError> {
        if self.type_property.is_some() {
            return Err(AnalysisError::DuplicateDescriptor {
                ty: self.key.name().to_string(),
                kind: "type",
            });
        }
        self.type_property = Some(descriptor);
        Ok(())
    }

    pub fn set_subject(
        &mut self,
        descriptor: PropertyDescriptor<SubjectSpec>,
    ) -> Result<(), AnalysisError> {
        if self.subject.is_some() {
            return Err(AnalysisError::DuplicateDescriptor {
                ty: self.key.name().to_string(),
                kind: "subject",
            });
        }
        self.subject = Some(descriptor);
        Ok(())
    }

    pub fn add_predicate(
        &mut self,
        descriptor: PropertyDescriptor<PredicateSpec>,
    ) -> Result<(), AnalysisError> {
        let duplicate = self.predicates.iter().any(|existing| {
            existing.declared_by == descriptor.declared_by && existing.name() == descriptor.name()
        });
        if duplicate {
            return Err(AnalysisError::DuplicatePredicate {
                ty: self.key.name().to_string(),
                name: descriptor.name().unwrap_or_default().to_string(),
            });
        }
        self.predicates.push(descriptor);
        Ok(())
    }

    /// Layer `other` on top: its type and subject win, its predicates are
    /// appended unless an equal one is already present.
    pub(crate) fn overlay(&mut self, other: ClassDescriptorBuilder) {
        if other.type_property.is_some() {
            self.type_property = other.type_property;
        }
        if other.subject.is_some() {
            self.subject = other.subject;
        }
        for predicate in other.predicates {
            if !self.predicates.contains(&predicate) {
                self.predicates.push(predicate);
            }
        }
    }

    /// Re-key the accumulated descriptors for the type being analyzed.
    pub(crate) fn for_type(mut self, key: TypeKey) -> Self {
        self.key = key;
        self
    }

    pub fn build(self, creation: Arc<Creation>) -> ClassDescriptor {
        ClassDescriptor {
            key: self.key,
            type_property: self.type_property,
            subject: self.subject,
            predicates: self.predicates,
            creation,
        }
    }
}

/// Finished metadata for one mapped type.
#[derive(Clone, Debug)]
pub struct ClassDescriptor {
    key: TypeKey,
    type_property: Option<PropertyDescriptor<TypeSpec>>,
    subject: Option<PropertyDescriptor<SubjectSpec>>,
    predicates: Vec<PropertyDescriptor<PredicateSpec>>,
    creation: Arc<Creation>,
}

impl ClassDescriptor {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn type_property(&self) -> Option<&PropertyDescriptor<TypeSpec>> {
        self.type_property.as_ref()
    }

    pub fn subject(&self) -> Option<&PropertyDescriptor<SubjectSpec>> {
        self.subject.as_ref()
    }

    /// Predicates in declaration order, supertype first.
    pub fn predicates(&self) -> &[PropertyDescriptor<PredicateSpec>] {
        &self.predicates
    }

    pub fn creation(&self) -> &Arc<Creation> {
        &self.creation
    }

    /// Builder seeded with copies of these descriptors, with accessors routed
    /// through `lens` so they apply to an extending type.
    pub(crate) fn rebased(&self, lens: &Lens) -> ClassDescriptorBuilder {
        ClassDescriptorBuilder {
            key: self.key,
            type_property: self.type_property.as_ref().map(|d| d.rebased(lens)),
            subject: self.subject.as_ref().map(|d| d.rebased(lens)),
            predicates: self.predicates.iter().map(|d| d.rebased(lens)).collect(),
        }
    }
}
