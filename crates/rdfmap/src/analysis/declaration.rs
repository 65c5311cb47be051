//! Typed declarations through which a Rust type describes its RDF mapping.
//!
//! A mapped type implements [`Mapped`] and fills a [`ClassDeclaration`]:
//! class-level type and subject specs, its properties with their accessors and
//! roles, and the hooks used to construct it. Everything typed is erased into
//! closures over `dyn Any` here, so the analyzer and both engines work on
//! plain descriptor values.

use std::any::{type_name, Any, TypeId};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use super::descriptor::{PredicateSpec, SubjectSpec, TypeSpec};
use crate::error::AccessError;
use crate::model::Iri;
use crate::writer::datum::{Datum, ObjectRef, OPTION_WRAPPER};

/// A value whose concrete type is only known to the declaration that made it.
pub type AnyValue = Box<dyn Any>;

/// Reads a property from an erased instance.
pub type Getter =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Result<Datum<'a>, AccessError> + Send + Sync>;

/// Writes an aggregated value into an erased instance.
pub type Setter = Arc<dyn Fn(&mut dyn Any, Aggregate) -> Result<(), AccessError> + Send + Sync>;

// ---------------------------------------------------------------------------
// Type identity
// ---------------------------------------------------------------------------

/// Runtime identity of a Rust type, with its name kept for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Handle to a [`Mapped`] type: its identity plus a way to obtain its
/// declaration without naming the type.
#[derive(Clone, Copy)]
pub struct MappedType {
    key: TypeKey,
    declare: fn() -> Declaration,
}

impl MappedType {
    pub fn of<T: Mapped>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            declare: declaration_of::<T>,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Run the type's [`Mapped::declare`] and return the erased result.
    pub fn declaration(&self) -> Declaration {
        (self.declare)()
    }
}

impl PartialEq for MappedType {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MappedType {}

impl fmt::Debug for MappedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappedType({})", self.key)
    }
}

fn declaration_of<T: Mapped>() -> Declaration {
    let mut class = ClassDeclaration::<T>::new();
    T::declare(&mut class);
    class.declaration
}

/// A type that maps to a group of triples rooted at one subject.
pub trait Mapped: Any + Sized {
    fn declare(class: &mut ClassDeclaration<Self>);
}

// ---------------------------------------------------------------------------
// Property shapes
// ---------------------------------------------------------------------------

/// Whether an element is converted directly or read and written as a
/// nested mapped value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Leaf(TypeKey),
    Mapped(MappedType),
}

impl ElementKind {
    pub fn leaf<T: Any>() -> Self {
        ElementKind::Leaf(TypeKey::of::<T>())
    }

    pub fn key(&self) -> TypeKey {
        match self {
            ElementKind::Leaf(key) => *key,
            ElementKind::Mapped(mapped) => mapped.key(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

/// How many values a property holds and how they are grouped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Single,
    Array(usize),
    Collection(CollectionKind),
}

impl Shape {
    pub fn is_array(&self) -> bool {
        matches!(self, Shape::Array(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Shape::Collection(_))
    }
}

/// Declared type of a property: the full value type, its shape and the type
/// of its elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyType {
    value: TypeKey,
    shape: Shape,
    element: ElementKind,
}

impl PropertyType {
    pub fn of<V: PropertyValue>() -> Self {
        Self {
            value: TypeKey::of::<V>(),
            shape: V::shape(),
            element: V::Element::element_kind(),
        }
    }

    pub fn value(&self) -> TypeKey {
        self.value
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn element(&self) -> ElementKind {
        self.element
    }
}

/// Values handed from an argument strategy to an instance strategy.
pub enum Aggregate {
    /// Nothing was collected.
    Absent,
    Single(AnyValue),
    Elements(Vec<AnyValue>),
}

impl Aggregate {
    fn into_elements(self) -> Vec<AnyValue> {
        match self {
            Aggregate::Absent => Vec::new(),
            Aggregate::Single(value) => vec![value],
            Aggregate::Elements(values) => values,
        }
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Absent => f.write_str("Absent"),
            Aggregate::Single(_) => f.write_str("Single(..)"),
            Aggregate::Elements(values) => write!(f, "Elements({})", values.len()),
        }
    }
}

pub(crate) fn downcast<T: Any>(value: AnyValue) -> Result<T, AccessError> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| AccessError::TypeMismatch {
            expected: type_name::<T>(),
        })
}

fn target<T: Any>(value: &dyn Any) -> Result<&T, AccessError> {
    value.downcast_ref::<T>().ok_or(AccessError::TypeMismatch {
        expected: type_name::<T>(),
    })
}

fn target_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, AccessError> {
    value.downcast_mut::<T>().ok_or(AccessError::TypeMismatch {
        expected: type_name::<T>(),
    })
}

/// Type of one value of a property: a leaf with a converter or a mapped type.
pub trait Element: Any {
    fn element_kind() -> ElementKind;

    fn element_datum(&self) -> Datum<'_>;

    fn into_element_datum(self) -> Datum<'static>
    where
        Self: Sized;
}

impl<T: Mapped> Element for T {
    fn element_kind() -> ElementKind {
        ElementKind::Mapped(MappedType::of::<T>())
    }

    fn element_datum(&self) -> Datum<'_> {
        Datum::Object {
            value: ObjectRef::Borrowed(self),
            mapped: MappedType::of::<T>(),
        }
    }

    fn into_element_datum(self) -> Datum<'static> {
        Datum::Object {
            value: ObjectRef::Owned(Box::new(self)),
            mapped: MappedType::of::<T>(),
        }
    }
}

macro_rules! display_leaf {
    ($($ty:ty),* $(,)?) => {$(
        impl Element for $ty {
            fn element_kind() -> ElementKind {
                ElementKind::leaf::<$ty>()
            }

            fn element_datum(&self) -> Datum<'_> {
                Datum::Leaf(Cow::Owned(self.to_string()))
            }

            fn into_element_datum(self) -> Datum<'static> {
                Datum::Leaf(Cow::Owned(self.to_string()))
            }
        }
    )*};
}

display_leaf!(bool, char, i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, f32, f64);

impl Element for String {
    fn element_kind() -> ElementKind {
        ElementKind::leaf::<String>()
    }

    fn element_datum(&self) -> Datum<'_> {
        Datum::Leaf(Cow::Borrowed(self.as_str()))
    }

    fn into_element_datum(self) -> Datum<'static> {
        Datum::Leaf(Cow::Owned(self))
    }
}

impl Element for Iri {
    fn element_kind() -> ElementKind {
        ElementKind::leaf::<Iri>()
    }

    fn element_datum(&self) -> Datum<'_> {
        Datum::Leaf(Cow::Borrowed(self.as_str()))
    }

    fn into_element_datum(self) -> Datum<'static> {
        Datum::Leaf(Cow::Owned(self.as_str().to_string()))
    }
}

/// The declared type of a property.
///
/// Implemented for every [`Element`] (single value), `Option<T>`, `Vec<T>`,
/// `HashSet<T>`, `BTreeSet<T>` and `[T; N]`.
pub trait PropertyValue: Any + Sized {
    type Element: Element;

    fn shape() -> Shape;

    fn to_datum(&self) -> Datum<'_>;

    fn into_datum(self) -> Datum<'static>;

    /// Rebuild the value from what the reader collected.
    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError>;
}

impl<T: Element> PropertyValue for T {
    type Element = T;

    fn shape() -> Shape {
        Shape::Single
    }

    fn to_datum(&self) -> Datum<'_> {
        self.element_datum()
    }

    fn into_datum(self) -> Datum<'static> {
        self.into_element_datum()
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        match aggregate {
            Aggregate::Single(value) => downcast(value),
            Aggregate::Absent => Err(AccessError::MissingValue {
                expected: type_name::<T>(),
            }),
            Aggregate::Elements(mut values) => {
                if values.len() != 1 {
                    return Err(AccessError::LengthMismatch {
                        expected: 1,
                        actual: values.len(),
                    });
                }
                downcast(values.remove(0))
            }
        }
    }
}

impl<T: Element> PropertyValue for Option<T> {
    type Element = T;

    fn shape() -> Shape {
        Shape::Single
    }

    fn to_datum(&self) -> Datum<'_> {
        Datum::Wrapped {
            wrapper: OPTION_WRAPPER,
            inner: self.as_ref().map(|value| Box::new(value.element_datum())),
        }
    }

    fn into_datum(self) -> Datum<'static> {
        Datum::Wrapped {
            wrapper: OPTION_WRAPPER,
            inner: self.map(|value| Box::new(value.into_element_datum())),
        }
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        match aggregate {
            Aggregate::Absent => Ok(None),
            other => T::from_aggregate(other).map(Some),
        }
    }
}

impl<T: Element> PropertyValue for Vec<T> {
    type Element = T;

    fn shape() -> Shape {
        Shape::Collection(CollectionKind::List)
    }

    fn to_datum(&self) -> Datum<'_> {
        Datum::Seq(self.iter().map(|value| value.element_datum()).collect())
    }

    fn into_datum(self) -> Datum<'static> {
        Datum::Seq(
            self.into_iter()
                .map(|value| value.into_element_datum())
                .collect(),
        )
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        aggregate.into_elements().into_iter().map(downcast).collect()
    }
}

impl<T: Element + Eq + Hash> PropertyValue for HashSet<T> {
    type Element = T;

    fn shape() -> Shape {
        Shape::Collection(CollectionKind::Set)
    }

    fn to_datum(&self) -> Datum<'_> {
        Datum::Seq(self.iter().map(|value| value.element_datum()).collect())
    }

    fn into_datum(self) -> Datum<'static> {
        Datum::Seq(
            self.into_iter()
                .map(|value| value.into_element_datum())
                .collect(),
        )
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        aggregate.into_elements().into_iter().map(downcast).collect()
    }
}

impl<T: Element + Ord> PropertyValue for BTreeSet<T> {
    type Element = T;

    fn shape() -> Shape {
        Shape::Collection(CollectionKind::Set)
    }

    fn to_datum(&self) -> Datum<'_> {
        Datum::Seq(self.iter().map(|value| value.element_datum()).collect())
    }

    fn into_datum(self) -> Datum<'static> {
        Datum::Seq(
            self.into_iter()
                .map(|value| value.into_element_datum())
                .collect(),
        )
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        aggregate.into_elements().into_iter().map(downcast).collect()
    }
}

impl<T: Element, const N: usize> PropertyValue for [T; N] {
    type Element = T;

    fn shape() -> Shape {
        Shape::Array(N)
    }

    fn to_datum(&self) -> Datum<'_> {
        Datum::Array(self.iter().map(|value| value.element_datum()).collect())
    }

    fn into_datum(self) -> Datum<'static> {
        Datum::Array(
            self.into_iter()
                .map(|value| value.into_element_datum())
                .collect(),
        )
    }

    fn from_aggregate(aggregate: Aggregate) -> Result<Self, AccessError> {
        let values = aggregate
            .into_elements()
            .into_iter()
            .map(downcast)
            .collect::<Result<Vec<T>, _>>()?;
        <[T; N]>::try_from(values).map_err(|values| AccessError::LengthMismatch {
            expected: N,
            actual: values.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Erased accessors
// ---------------------------------------------------------------------------

fn erase_getter<F>(f: F) -> Getter
where
    F: for<'a> Fn(&'a dyn Any) -> Result<Datum<'a>, AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn erase_setter<F>(f: F) -> Setter
where
    F: Fn(&mut dyn Any, Aggregate) -> Result<(), AccessError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Getter for a computed value; used by default mix-in members.
pub(crate) fn computed_getter<T, V, F>(f: F) -> Getter
where
    T: Any,
    V: PropertyValue,
    F: Fn(&T) -> V + Send + Sync + 'static,
{
    erase_getter(move |value| Ok(f(target::<T>(value)?).into_datum()))
}

type Project = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type ProjectMut = Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

fn erase_project<F>(f: F) -> Project
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn erase_project_mut<F>(f: F) -> ProjectMut
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Path from an extending type to the embedded value of its supertype.
#[derive(Clone)]
pub struct Lens {
    owner: &'static str,
    get: Project,
    get_mut: ProjectMut,
}

impl Lens {
    fn new<T, P, G, M>(get: G, get_mut: M) -> Self
    where
        T: Any,
        P: Any,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
    {
        Self {
            owner: type_name::<T>(),
            get: erase_project(move |value| {
                value
                    .downcast_ref::<T>()
                    .map(|value| get(value) as &dyn Any)
            }),
            get_mut: erase_project_mut(move |value| {
                value
                    .downcast_mut::<T>()
                    .map(|value| get_mut(value) as &mut dyn Any)
            }),
        }
    }

    /// Route a supertype getter through this lens.
    pub(crate) fn getter(&self, inner: &Getter) -> Getter {
        let (owner, get, inner) = (self.owner, self.get.clone(), inner.clone());
        erase_getter(move |value| {
            let parent = get(value).ok_or(AccessError::TypeMismatch { expected: owner })?;
            inner(parent)
        })
    }

    /// Route a supertype setter through this lens.
    pub(crate) fn setter(&self, inner: &Setter) -> Setter {
        let (owner, get_mut, inner) = (self.owner, self.get_mut.clone(), inner.clone());
        erase_setter(move |value, aggregate| {
            let parent = get_mut(value).ok_or(AccessError::TypeMismatch { expected: owner })?;
            inner(parent, aggregate)
        })
    }
}

impl fmt::Debug for Lens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lens({})", self.owner)
    }
}

// ---------------------------------------------------------------------------
// Construction hooks
// ---------------------------------------------------------------------------

pub(crate) type DefaultFn = Arc<dyn Fn() -> AnyValue + Send + Sync>;
pub(crate) type BuilderCall =
    Arc<dyn Fn(AnyValue, Aggregate) -> Result<AnyValue, AccessError> + Send + Sync>;
pub(crate) type BuildFn = Arc<dyn Fn(AnyValue) -> Result<AnyValue, AccessError> + Send + Sync>;
pub(crate) type ConstructorCall =
    Arc<dyn Fn(Arguments) -> Result<AnyValue, AccessError> + Send + Sync>;

/// How instances of a mapped type can be created.
#[derive(Default)]
pub struct Creation {
    pub(crate) default: Option<DefaultFn>,
    pub(crate) builder: Option<BuilderHooks>,
    pub(crate) constructors: Vec<ConstructorHook>,
}

impl Creation {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn has_builder(&self) -> bool {
        self.builder.is_some()
    }

    pub fn constructor_count(&self) -> usize {
        self.constructors.len()
    }
}

impl fmt::Debug for Creation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creation")
            .field("default", &self.default.is_some())
            .field("builder", &self.builder.is_some())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

pub(crate) struct BuilderHooks {
    pub(crate) factory: DefaultFn,
    pub(crate) methods: Vec<BuilderMethod>,
    pub(crate) build: BuildFn,
}

impl BuilderHooks {
    pub(crate) fn method(&self, name: &str) -> Option<&BuilderMethod> {
        self.methods.iter().find(|method| method.name == name)
    }

    fn method_mut(&mut self, name: &str) -> &mut BuilderMethod {
        let index = match self.methods.iter().position(|method| method.name == name) {
            Some(index) => index,
            None => {
                self.methods.push(BuilderMethod {
                    name: name.to_string(),
                    whole: None,
                    element: None,
                });
                self.methods.len() - 1
            }
        };
        &mut self.methods[index]
    }
}

/// A builder method, with an optional overload taking one element at a time.
pub(crate) struct BuilderMethod {
    pub(crate) name: String,
    pub(crate) whole: Option<BuilderCall>,
    pub(crate) element: Option<BuilderCall>,
}

pub(crate) struct ConstructorHook {
    pub(crate) names: Vec<String>,
    pub(crate) arity: usize,
    pub(crate) invoke: ConstructorCall,
}

/// Positional arguments collected for a constructor.
#[derive(Debug)]
pub struct Arguments {
    names: Vec<String>,
    slots: Vec<Option<Aggregate>>,
}

impl Arguments {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let slots = names.iter().map(|_| None).collect();
        Self { names, slots }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub(crate) fn set(&mut self, index: usize, value: Aggregate) -> Result<(), AccessError> {
        let arity = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(AccessError::ArgumentOutOfRange { index, arity })?;
        *slot = Some(value);
        Ok(())
    }

    /// Take argument `index`. A parameter that received nothing falls back to
    /// the empty value of its type (`None`, an empty collection) if it has one.
    pub fn take<V: PropertyValue>(&mut self, index: usize) -> Result<V, AccessError> {
        match self.slots.get_mut(index).and_then(Option::take) {
            Some(value) => V::from_aggregate(value),
            None => V::from_aggregate(Aggregate::Absent).map_err(|_| AccessError::MissingArgument {
                name: self.names.get(index).cloned().unwrap_or_default(),
            }),
        }
    }
}

/// A function usable as a positional constructor.
///
/// Implemented for closures and fn items of one to eight [`PropertyValue`]
/// parameters.
pub trait ConstructorFn<T, Args>: Send + Sync + 'static {
    fn arity(&self) -> usize;

    fn call(&self, arguments: &mut Arguments) -> Result<T, AccessError>;
}

macro_rules! constructor_fn {
    ($($ty:ident => $index:tt),+) => {
        impl<T, F, $($ty: PropertyValue),+> ConstructorFn<T, ($($ty,)+)> for F
        where
            F: Fn($($ty),+) -> T + Send + Sync + 'static,
        {
            fn arity(&self) -> usize {
                [$($index),+].len()
            }

            fn call(&self, arguments: &mut Arguments) -> Result<T, AccessError> {
                Ok(self($(arguments.take::<$ty>($index)?),+))
            }
        }
    };
}

constructor_fn!(A => 0);
constructor_fn!(A => 0, B => 1);
constructor_fn!(A => 0, B => 1, C => 2);
constructor_fn!(A => 0, B => 1, C => 2, D => 3);
constructor_fn!(A => 0, B => 1, C => 2, D => 3, E => 4);
constructor_fn!(A => 0, B => 1, C => 2, D => 3, E => 4, G => 5);
constructor_fn!(A => 0, B => 1, C => 2, D => 3, E => 4, G => 5, H => 6);
constructor_fn!(A => 0, B => 1, C => 2, D => 3, E => 4, G => 5, H => 6, I => 7);

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A mapping role carried by a property or a mix-in member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Predicate(PredicateSpec),
    Type(TypeSpec),
    Subject(SubjectSpec),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Roles {
    predicate: Option<PredicateSpec>,
    rdf_type: Option<TypeSpec>,
    subject: Option<SubjectSpec>,
}

/// Erased form of one declared property.
pub struct PropertyDeclaration {
    pub(crate) name: String,
    pub(crate) property_type: PropertyType,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    field: Roles,
    accessor: Roles,
}

impl PropertyDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// The role this property plays. The field is checked before the
    /// accessor, and Predicate wins over Type, which wins over Subject.
    /// Roles placed on the accessor only count when a getter exists.
    pub fn role(&self) -> Option<Role> {
        let accessor = self.getter.as_ref().map(|_| &self.accessor);
        let predicate = self
            .field
            .predicate
            .as_ref()
            .or_else(|| accessor.and_then(|roles| roles.predicate.as_ref()));
        if let Some(spec) = predicate {
            return Some(Role::Predicate(spec.clone()));
        }
        let rdf_type = self
            .field
            .rdf_type
            .as_ref()
            .or_else(|| accessor.and_then(|roles| roles.rdf_type.as_ref()));
        if let Some(spec) = rdf_type {
            return Some(Role::Type(spec.clone()));
        }
        self.field
            .subject
            .as_ref()
            .or_else(|| accessor.and_then(|roles| roles.subject.as_ref()))
            .map(|spec| Role::Subject(spec.clone()))
    }
}

impl fmt::Debug for PropertyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDeclaration")
            .field("name", &self.name)
            .field("property_type", &self.property_type)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

pub(crate) struct Parent {
    pub(crate) mapped: MappedType,
    pub(crate) lens: Lens,
}

/// Erased output of [`Mapped::declare`].
pub struct Declaration {
    pub(crate) key: TypeKey,
    pub(crate) types: Vec<TypeSpec>,
    pub(crate) subjects: Vec<SubjectSpec>,
    pub(crate) parent: Option<Parent>,
    pub(crate) properties: Vec<PropertyDeclaration>,
    pub(crate) creation: Creation,
}

impl Declaration {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn properties(&self) -> &[PropertyDeclaration] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDeclaration> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Typed builder handed to [`Mapped::declare`].
pub struct ClassDeclaration<T> {
    declaration: Declaration,
    _type: PhantomData<fn() -> T>,
}

impl<T: Mapped> ClassDeclaration<T> {
    fn new() -> Self {
        Self {
            declaration: Declaration {
                key: TypeKey::of::<T>(),
                types: Vec::new(),
                subjects: Vec::new(),
                parent: None,
                properties: Vec::new(),
                creation: Creation::default(),
            },
            _type: PhantomData,
        }
    }

    /// Class-level RDF type(s) asserted for every instance.
    pub fn rdf_type(&mut self, spec: TypeSpec) -> &mut Self {
        self.declaration.types.push(spec);
        self
    }

    /// Class-level subject: a fixed IRI, or a local value when relative.
    pub fn subject(&mut self, spec: SubjectSpec) -> &mut Self {
        self.declaration.subjects.push(spec);
        self
    }

    /// Declare `P` as the supertype, embedded in `T` and reached through the
    /// two projections.
    pub fn extends<P, G, M>(&mut self, get: G, get_mut: M) -> &mut Self
    where
        P: Mapped,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
    {
        self.declaration.parent = Some(Parent {
            mapped: MappedType::of::<P>(),
            lens: Lens::new(get, get_mut),
        });
        self
    }

    /// No-argument constructor used by the bean strategy.
    pub fn default_constructor<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.declaration.creation.default = Some(Arc::new(move || Box::new(f()) as AnyValue));
        self
    }

    /// Builder factory and finishing step used by the builder strategy.
    pub fn builder<B, F, G>(&mut self, factory: F, build: G) -> BuilderDeclarer<'_, T, B>
    where
        B: Any,
        F: Fn() -> B + Send + Sync + 'static,
        G: Fn(B) -> T + Send + Sync + 'static,
    {
        let hooks = self.declaration.creation.builder.insert(BuilderHooks {
            factory: Arc::new(move || Box::new(factory()) as AnyValue),
            methods: Vec::new(),
            build: Arc::new(move |builder| {
                let builder = downcast::<B>(builder)?;
                Ok(Box::new(build(builder)) as AnyValue)
            }),
        });
        BuilderDeclarer {
            hooks,
            _types: PhantomData,
        }
    }

    /// Positional constructor whose parameters are the named properties, in
    /// order.
    pub fn constructor<Args, F>(&mut self, names: &[&str], f: F) -> &mut Self
    where
        F: ConstructorFn<T, Args>,
    {
        let arity = f.arity();
        self.declaration.creation.constructors.push(ConstructorHook {
            names: names.iter().map(|name| name.to_string()).collect(),
            arity,
            invoke: Arc::new(move |mut arguments| {
                f.call(&mut arguments).map(|value| Box::new(value) as AnyValue)
            }),
        });
        self
    }

    /// Declare a property of type `V`.
    pub fn property<V: PropertyValue>(&mut self, name: &str) -> PropertyDeclarer<'_, T, V> {
        self.declaration.properties.push(PropertyDeclaration {
            name: name.to_string(),
            property_type: PropertyType::of::<V>(),
            getter: None,
            setter: None,
            field: Roles::default(),
            accessor: Roles::default(),
        });
        let index = self.declaration.properties.len() - 1;
        PropertyDeclarer {
            property: &mut self.declaration.properties[index],
            _types: PhantomData,
        }
    }
}

/// Declares accessors and roles of one property.
///
/// `predicate`, `rdf_type` and `subject` place the role on the field;
/// the `getter_*` variants place it on the accessor.
pub struct PropertyDeclarer<'a, T, V> {
    property: &'a mut PropertyDeclaration,
    _types: PhantomData<fn() -> (T, V)>,
}

impl<T: Mapped, V: PropertyValue> PropertyDeclarer<'_, T, V> {
    pub fn get<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> &V + Send + Sync + 'static,
    {
        self.property.getter = Some(erase_getter(move |value| {
            Ok(f(target::<T>(value)?).to_datum())
        }));
        self
    }

    /// Getter returning a computed value instead of a reference.
    pub fn get_with<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.property.getter = Some(computed_getter(f));
        self
    }

    pub fn set<F>(self, f: F) -> Self
    where
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.property.setter = Some(erase_setter(move |value, aggregate| {
            let converted = V::from_aggregate(aggregate)?;
            f(target_mut::<T>(value)?, converted);
            Ok(())
        }));
        self
    }

    pub fn predicate(self, spec: PredicateSpec) -> Self {
        self.property.field.predicate = Some(spec);
        self
    }

    pub fn rdf_type(self, spec: TypeSpec) -> Self {
        self.property.field.rdf_type = Some(spec);
        self
    }

    pub fn subject(self, spec: SubjectSpec) -> Self {
        self.property.field.subject = Some(spec);
        self
    }

    pub fn getter_predicate(self, spec: PredicateSpec) -> Self {
        self.property.accessor.predicate = Some(spec);
        self
    }

    pub fn getter_type(self, spec: TypeSpec) -> Self {
        self.property.accessor.rdf_type = Some(spec);
        self
    }

    pub fn getter_subject(self, spec: SubjectSpec) -> Self {
        self.property.accessor.subject = Some(spec);
        self
    }
}

/// Declares the property methods of a builder type `B`.
pub struct BuilderDeclarer<'a, T, B> {
    hooks: &'a mut BuilderHooks,
    _types: PhantomData<fn() -> (T, B)>,
}

impl<T, B: Any> BuilderDeclarer<'_, T, B> {
    /// Method receiving the whole property value.
    pub fn method<V, F>(self, name: &str, f: F) -> Self
    where
        V: PropertyValue,
        F: Fn(B, V) -> B + Send + Sync + 'static,
    {
        self.hooks.method_mut(name).whole = Some(Arc::new(move |builder, aggregate| {
            let builder = downcast::<B>(builder)?;
            let value = V::from_aggregate(aggregate)?;
            Ok(Box::new(f(builder, value)) as AnyValue)
        }));
        self
    }

    /// Overload receiving one element of a collection property per call.
    pub fn element_method<E, F>(self, name: &str, f: F) -> Self
    where
        E: Element,
        F: Fn(B, E) -> B + Send + Sync + 'static,
    {
        self.hooks.method_mut(name).element = Some(Arc::new(move |builder, aggregate| {
            let builder = downcast::<B>(builder)?;
            let value = <E as PropertyValue>::from_aggregate(aggregate)?;
            Ok(Box::new(f(builder, value)) as AnyValue)
        }));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
        tags: Vec<String>,
    }

    impl Mapped for Point {
        fn declare(class: &mut ClassDeclaration<Self>) {
            class
                .default_constructor(Point::default)
                .subject(SubjectSpec::new("http://ex/p"));
            class
                .property::<i64>("x")
                .get(|p| &p.x)
                .set(|p, v| p.x = v)
                .predicate(PredicateSpec::new("http://ex/x"));
            class
                .property::<Vec<String>>("tags")
                .get(|p| &p.tags)
                .getter_predicate(PredicateSpec::new("http://ex/tag").optional());
        }
    }

    #[test]
    fn property_types_describe_shape_and_element() {
        let list = PropertyType::of::<Vec<String>>();
        assert_eq!(list.shape(), Shape::Collection(CollectionKind::List));
        assert_eq!(list.element(), ElementKind::leaf::<String>());

        let array = PropertyType::of::<[i32; 3]>();
        assert_eq!(array.shape(), Shape::Array(3));

        let optional = PropertyType::of::<Option<Point>>();
        assert_eq!(optional.shape(), Shape::Single);
        assert_eq!(optional.element(), ElementKind::Mapped(MappedType::of::<Point>()));
    }

    #[test]
    fn declaration_erases_accessors() {
        let declaration = MappedType::of::<Point>().declaration();
        let x = declaration.property("x").unwrap();
        let mut point = Point::default();

        let setter = x.setter.clone().unwrap();
        setter(&mut point, Aggregate::Single(Box::new(7i64))).unwrap();
        assert_eq!(point.x, 7);

        let getter = x.getter.clone().unwrap();
        assert!(matches!(getter(&point).unwrap(), Datum::Leaf(v) if v == "7"));
    }

    #[test]
    fn accessor_roles_apply_when_field_has_none() {
        let declaration = MappedType::of::<Point>().declaration();
        let role = declaration.property("tags").unwrap().role();
        assert!(matches!(role, Some(Role::Predicate(spec)) if spec.iri() == "http://ex/tag"));
    }

    #[test]
    fn setter_rejects_wrong_value_type() {
        let declaration = MappedType::of::<Point>().declaration();
        let setter = declaration.property("x").unwrap().setter.clone().unwrap();
        let mut point = Point::default();
        let err = setter(&mut point, Aggregate::Single(Box::new("7".to_string()))).unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
    }

    #[test]
    fn arrays_check_their_length() {
        let values: Vec<AnyValue> = vec![Box::new(1i32), Box::new(2i32)];
        let err = <[i32; 3]>::from_aggregate(Aggregate::Elements(values)).unwrap_err();
        assert_eq!(
            err,
            AccessError::LengthMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn arguments_fall_back_to_empty_values() {
        let mut arguments = Arguments::new(vec!["a".into(), "b".into()]);
        arguments
            .set(0, Aggregate::Single(Box::new("x".to_string())))
            .unwrap();
        assert_eq!(arguments.take::<String>(0).unwrap(), "x");
        assert_eq!(arguments.take::<Option<String>>(1).unwrap(), None);
        assert!(matches!(
            arguments.take::<String>(1),
            Err(AccessError::MissingArgument { name }) if name == "b"
        ));
    }

    #[test]
    fn arguments_reject_positions_past_the_last_parameter() {
        let mut arguments = Arguments::new(vec!["a".into()]);
        assert_eq!(
            arguments.set(1, Aggregate::Single(Box::new("x".to_string()))),
            Err(AccessError::ArgumentOutOfRange { index: 1, arity: 1 })
        );
        assert_eq!(arguments.take::<Option<String>>(0).unwrap(), None);
    }
}
