//! Type-erased view of a property value as the writer sees it.

use std::any::Any;
use std::borrow::Cow;

use crate::analysis::MappedType;

/// Wrapper tag produced by `Option<T>` properties.
pub const OPTION_WRAPPER: &str = "option";

/// A mapped value, either borrowed from the object being written or owned
/// because a computed getter produced it.
#[derive(Debug)]
pub enum ObjectRef<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl ObjectRef<'_> {
    pub fn as_any(&self) -> &dyn Any {
        match self {
            ObjectRef::Borrowed(value) => *value,
            ObjectRef::Owned(value) => &**value,
        }
    }
}

/// What a getter hands to the writer.
#[derive(Debug)]
pub enum Datum<'a> {
    /// Lexical form of a leaf value.
    Leaf(Cow<'a, str>),
    /// A value of a mapped type; written as a nested subject.
    Object {
        value: ObjectRef<'a>,
        mapped: MappedType,
    },
    /// Ordered or set-like collection.
    Seq(Vec<Datum<'a>>),
    /// Fixed-size array; normalized to [`Datum::Seq`] before writing.
    Array(Vec<Datum<'a>>),
    /// A wrapper such as `Option`, opened by a
    /// [`WrapperStrategy`](super::wrapper::WrapperStrategy).
    Wrapped {
        wrapper: &'static str,
        inner: Option<Box<Datum<'a>>>,
    },
}

impl Datum<'_> {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Datum::Leaf(_) => "leaf",
            Datum::Object { .. } => "object",
            Datum::Seq(_) => "sequence",
            Datum::Array(_) => "array",
            Datum::Wrapped { .. } => "wrapper",
        }
    }
}
