//! Value Converter Registry: from an RDF term to a leaf value.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

use crate::analysis::{AnyValue, TypeKey};
use crate::error::ReaderError;
use crate::model::{Iri, Term};

/// Converts a term into a value of one leaf type.
pub trait ValueConverter: Send + Sync {
    fn convert(&self, term: &Term) -> Result<AnyValue, ReaderError>;
}

fn conversion_error<T>(term: &Term, reason: impl Into<String>) -> ReaderError {
    ReaderError::Conversion {
        term: term.to_string(),
        ty: type_name::<T>().to_string(),
        reason: reason.into(),
    }
}

/// Parses the lexical form of the term.
pub struct LexicalConverter<T> {
    parse: fn(&str) -> Result<T, String>,
}

impl<T> LexicalConverter<T> {
    pub fn new(parse: fn(&str) -> Result<T, String>) -> Self {
        Self { parse }
    }
}

impl<T: FromStr> LexicalConverter<T>
where
    T::Err: Display,
{
    /// Converter using the type's `FromStr` implementation.
    pub fn parsed() -> Self {
        Self::new(|lexical| lexical.trim().parse::<T>().map_err(|e| e.to_string()))
    }
}

impl<T: Any> ValueConverter for LexicalConverter<T> {
    fn convert(&self, term: &Term) -> Result<AnyValue, ReaderError> {
        (self.parse)(term.lexical())
            .map(|value| Box::new(value) as AnyValue)
            .map_err(|reason| conversion_error::<T>(term, reason))
    }
}

struct FnConverter<T, F> {
    f: F,
    _type: PhantomData<fn() -> T>,
}

impl<T, F> ValueConverter for FnConverter<T, F>
where
    T: Any,
    F: Fn(&Term) -> Result<T, String> + Send + Sync,
{
    fn convert(&self, term: &Term) -> Result<AnyValue, ReaderError> {
        (self.f)(term)
            .map(|value| Box::new(value) as AnyValue)
            .map_err(|reason| conversion_error::<T>(term, reason))
    }
}

/// Wrap a closure over the whole term as a converter for `T`.
pub fn converter_fn<T, F>(f: F) -> Arc<dyn ValueConverter>
where
    T: Any,
    F: Fn(&Term) -> Result<T, String> + Send + Sync + 'static,
{
    Arc::new(FnConverter {
        f,
        _type: PhantomData,
    })
}

/// Accepts IRI terms, and literals whose lexical form is an absolute IRI.
#[derive(Debug, Default, Clone, Copy)]
pub struct IriConverter;

impl ValueConverter for IriConverter {
    fn convert(&self, term: &Term) -> Result<AnyValue, ReaderError> {
        let iri = match term {
            Term::Iri(iri) => Some(iri.clone()),
            Term::Literal(lit) => Iri::parse(lit.lexical()),
            Term::Blank(_) => None,
        };
        iri.map(|iri| Box::new(iri) as AnyValue)
            .ok_or_else(|| conversion_error::<Iri>(term, "not an absolute IRI"))
    }
}

fn parse_bool(lexical: &str) -> Result<bool, String> {
    match lexical.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("'{other}' is not a boolean")),
    }
}

fn parse_char(lexical: &str) -> Result<char, String> {
    let mut chars = lexical.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!("'{lexical}' is not a single character")),
    }
}

/// Leaf type to converter mapping.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeKey, Arc<dyn ValueConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converters for the built-in leaf types.
    pub fn builtins() -> Vec<(TypeKey, Arc<dyn ValueConverter>)> {
        fn entry<T: Any>(converter: impl ValueConverter + 'static) -> (TypeKey, Arc<dyn ValueConverter>) {
            (TypeKey::of::<T>(), Arc::new(converter))
        }

        fn parsed<T>() -> (TypeKey, Arc<dyn ValueConverter>)
        where
            T: FromStr + Any,
            T::Err: Display,
        {
            entry::<T>(LexicalConverter::<T>::parsed())
        }

        vec![
            entry::<String>(LexicalConverter::new(|lexical| Ok(lexical.to_string()))),
            entry::<bool>(LexicalConverter::new(parse_bool)),
            entry::<char>(LexicalConverter::new(parse_char)),
            entry::<Iri>(IriConverter),
            parsed::<i8>(),
            parsed::<i16>(),
            parsed::<i32>(),
            parsed::<i64>(),
            parsed::<i128>(),
            parsed::<u8>(),
            parsed::<u16>(),
            parsed::<u32>(),
            parsed::<u64>(),
            parsed::<u128>(),
            parsed::<f32>(),
            parsed::<f64>(),
        ]
    }

    /// Register a converter; a later registration for the same type wins.
    pub fn register(&mut self, key: TypeKey, converter: Arc<dyn ValueConverter>) {
        self.converters.insert(key, converter);
    }

    pub fn get(&self, key: TypeKey) -> Option<&Arc<dyn ValueConverter>> {
        self.converters.get(&key)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vocab::standard;

    fn registry() -> ConverterRegistry {
        let mut registry = ConverterRegistry::new();
        for (key, converter) in ConverterRegistry::builtins() {
            registry.register(key, converter);
        }
        registry
    }

    fn convert<T: Any>(registry: &ConverterRegistry, term: &Term) -> Result<T, ReaderError> {
        let converter = registry.get(TypeKey::of::<T>()).unwrap();
        converter
            .convert(term)
            .map(|value| *value.downcast::<T>().unwrap())
    }

    #[test]
    fn converts_builtin_leaves() {
        let registry = registry();
        assert_eq!(convert::<String>(&registry, &Term::string("hi")).unwrap(), "hi");
        assert_eq!(
            convert::<i32>(&registry, &Term::typed("42", standard::XSD_INT)).unwrap(),
            42
        );
        assert!(convert::<bool>(&registry, &Term::string("1")).unwrap());
        assert_eq!(convert::<char>(&registry, &Term::string("x")).unwrap(), 'x');
        assert_eq!(
            convert::<Iri>(&registry, &Term::iri("http://ex/a")).unwrap(),
            Iri::new("http://ex/a")
        );
    }

    #[test]
    fn reports_unparseable_values() {
        let registry = registry();
        let err = convert::<u8>(&registry, &Term::string("300")).unwrap_err();
        assert!(matches!(err, ReaderError::Conversion { ty, .. } if ty == "u8"));
        assert!(convert::<Iri>(&registry, &Term::blank("b0")).is_err());
    }

    #[test]
    fn closures_act_as_converters() {
        let converter = converter_fn(|term: &Term| Ok(term.lexical().len()));
        let value = converter.convert(&Term::string("abc")).unwrap();
        assert_eq!(*value.downcast::<usize>().unwrap(), 3);
    }
}
