//! Class analysis: from typed declarations to cached [`ClassDescriptor`]s.

pub mod analyzer;
pub mod declaration;
pub mod descriptor;
pub mod mixin;

pub use analyzer::ClassAnalyzer;
pub use declaration::{
    Aggregate, AnyValue, Arguments, ClassDeclaration, CollectionKind, ConstructorFn, Creation,
    Element, ElementKind, Getter, Mapped, MappedType, PropertyType, PropertyValue, Role, Setter,
    Shape, TypeKey,
};
pub use descriptor::{
    ClassDescriptor, ClassDescriptorBuilder, PredicateSpec, PropertyBinding, PropertyDescriptor,
    SubjectSpec, TypeSpec,
};
pub use mixin::{
    merge, Inheritance, MergePolicy, MixInResolver, Overlay, OverlayDeclaration, OwnDeclarations,
    ResolvedMixIn,
};
