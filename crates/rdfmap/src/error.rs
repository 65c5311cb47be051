//! Error taxonomy for analysis, reading, writing and the surrounding I/O.
//!
//! Every failure is fail-fast: the whole read or write call is abandoned and
//! the caller has to start over. Variants carry the type and property names
//! involved so the message is actionable on its own.

use thiserror::Error;

/// Failures while building a [`ClassDescriptor`](crate::analysis::ClassDescriptor).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("type {ty} is a leaf type and cannot be analyzed as a mapped type")]
    UnsupportedType { ty: String },

    #[error("invalid declaration on {ty}: {reason}")]
    InvalidAnnotation { ty: String, reason: String },

    #[error("mix-in member '{member}' has no matching member on {target}")]
    MixinBindingNotFound { target: String, member: String },

    #[error("overlay registered for {target} is not marked as a mix-in")]
    MissingMixInMarker { target: String },

    #[error("{ty} declares more than one {kind} descriptor")]
    DuplicateDescriptor { ty: String, kind: &'static str },

    #[error("predicate property '{name}' is already declared on {ty}")]
    DuplicatePredicate { ty: String, name: String },

    #[error("descriptor field '{field}' is already set")]
    FieldAlreadySet { field: &'static str },

    #[error("descriptor is missing its {field}")]
    FieldMissing { field: &'static str },
}

/// Failures while invoking user-supplied accessors, builders or constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("expected a value of type {expected}")]
    TypeMismatch { expected: &'static str },

    #[error("expected {expected} element(s) but got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("constructor argument '{name}' was not supplied")]
    MissingArgument { name: String },

    #[error("argument position {index} is out of range for {arity} parameter(s)")]
    ArgumentOutOfRange { index: usize, arity: usize },

    #[error("no value available for a non-optional {expected}")]
    MissingValue { expected: &'static str },

    #[error("{0}")]
    Failed(String),
}

/// Failures of the instance construction strategies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceError {
    #[error("no registered instance strategy supports {ty}")]
    NoSupportingStrategy { ty: String },

    #[error("instance strategy used before initialize()")]
    NotInitialized,

    #[error("property '{property}' of {ty} has no setter")]
    MissingSetter { ty: String, property: String },

    #[error("builder for {ty} has no method for property '{property}'")]
    MissingBuilderMethod { ty: String, property: String },

    #[error("property '{property}' does not match any constructor parameter of {ty}")]
    UnmatchedProperty { ty: String, property: String },

    #[error("{ty} needs exactly one declared constructor, found {found}")]
    AmbiguousConstructor { ty: String, found: usize },

    #[error("constructor of {ty} names {names} parameter(s) but takes {arity}")]
    ConstructorArity { ty: String, names: usize, arity: usize },

    #[error("{ty} has no default constructor")]
    MissingDefaultConstructor { ty: String },

    #[error("failed to populate {ty}: {source}")]
    Access {
        ty: String,
        #[source]
        source: AccessError,
    },
}

/// Failures of the per-property value accumulators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("property '{property}' accepts a single value and already holds one")]
    Overwrite { property: String },

    #[error("property '{property}' received more than the {capacity} expected value(s)")]
    Overflow { property: String, capacity: usize },

    #[error("no registered argument strategy supports property '{property}'")]
    NoSupportingStrategy { property: String },

    #[error("property '{property}' finished without a value")]
    Empty { property: String },
}

/// Failures of the Reader Engine that are not validation problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("no value converter registered for {ty}")]
    NoConverter { ty: String },

    #[error("cannot convert {term} into {ty}: {reason}")]
    Conversion {
        term: String,
        ty: String,
        reason: String,
    },

    #[error("nested value for '{property}' must be an IRI, got {term}")]
    NotAResource { property: String, term: String },

    #[error("subject {subject} is already being read further up the graph")]
    CyclicReference { subject: String },

    #[error("reader produced a value that is not a {ty}")]
    TypeMismatch { ty: String },

    #[error("'{value}' is not a valid subject IRI")]
    InvalidSubject { value: String },
}

/// Failures of the Writer Engine that are not validation problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriterError {
    #[error("property '{property}' of {ty} has no getter")]
    MissingGetter { ty: String, property: String },

    #[error("nested type {ty} has no subject descriptor")]
    MissingSubject { ty: String },

    #[error("nested value of type {ty} produced no subject")]
    EmptySubject { ty: String },

    #[error("'{value}' is not an absolute IRI")]
    InvalidIri { value: String },

    #[error("property '{property}' produced an unsupported value: {reason}")]
    UnsupportedValue { property: String, reason: String },

    #[error("getter for '{property}' of {ty} failed: {source}")]
    Access {
        ty: String,
        property: String,
        #[source]
        source: AccessError,
    },
}

/// Data that does not satisfy the declared constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required property '{property}' (<{predicate}>) of {ty} is missing")]
    MissingRequired {
        ty: String,
        property: String,
        predicate: String,
    },

    #[error("read-only property '{property}' (<{predicate}>) of {ty} must not be supplied")]
    ReadonlyViolation {
        ty: String,
        property: String,
        predicate: String,
    },
}

/// N-Triples parse failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Failure reported by a [`Repository`](crate::repository::Repository).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query evaluation failed: {0}")]
    Query(String),

    #[error("update failed: {0}")]
    Update(String),
}

/// Failure while loading a [`MapperConfig`](crate::config::MapperConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Umbrella error for the public mapper surface.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = MapperError> = std::result::Result<T, E>;
