//! RDF term types: IRI, blank node, literal and triple.
//!
//! IRIs are always stored expanded. Literals always carry an explicit datatype;
//! plain strings use `xsd:string`.

use std::fmt;
use std::sync::Arc;

use super::vocab::standard;

/// An absolute IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iri(Arc<str>);

impl Iri {
    /// Wrap a string without validation. Use [`Iri::parse`] for user input.
    pub fn new(iri: impl AsRef<str>) -> Self {
        Self(Arc::from(iri.as_ref()))
    }

    /// Accept only absolute IRIs: a scheme followed by `:` and no whitespace
    /// or angle brackets.
    pub fn parse(iri: impl AsRef<str>) -> Option<Self> {
        let iri = iri.as_ref();
        let (scheme, rest) = iri.split_once(':')?;
        let scheme_ok = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        let rest_ok = !rest.is_empty()
            && !rest
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"'));
        (scheme_ok && rest_ok).then(|| Self::new(iri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Iri::new(value)
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Iri(Arc::from(value))
    }
}

impl AsRef<str> for Iri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Blank node label, without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankId(Arc<str>);

impl BlankId {
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// Literal with lexical form, datatype and optional language tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    lexical: Arc<str>,
    datatype: Iri,
    language: Option<Arc<str>>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(lexical: impl AsRef<str>) -> Self {
        Self::typed(lexical, Iri::new(standard::XSD_STRING))
    }

    pub fn typed(lexical: impl AsRef<str>, datatype: Iri) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype,
            language: None,
        }
    }

    /// A language-tagged string (`rdf:langString`).
    pub fn lang(lexical: impl AsRef<str>, language: impl AsRef<str>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: Iri::new(standard::RDF_LANG_STRING),
            language: Some(Arc::from(language.as_ref())),
        }
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> &Iri {
        &self.datatype
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.lexical)?;
        match &self.language {
            Some(lang) => write!(f, "@{lang}"),
            None if self.datatype.as_str() == standard::XSD_STRING => Ok(()),
            None => write!(f, "^^<{}>", self.datatype),
        }
    }
}

/// Any RDF term that can appear in subject or object position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(Iri),
    Blank(BlankId),
    Literal(Literal),
}

impl Term {
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Iri::new(iri))
    }

    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::Blank(BlankId::new(label))
    }

    pub fn string(value: impl AsRef<str>) -> Self {
        Term::Literal(Literal::string(value))
    }

    pub fn typed(value: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        Term::Literal(Literal::typed(value, Iri::new(datatype)))
    }

    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// Lexical content: the IRI string, blank label or literal lexical form.
    pub fn lexical(&self) -> &str {
        match self {
            Term::Iri(iri) => iri.as_str(),
            Term::Blank(id) => id.as_str(),
            Term::Literal(lit) => lit.lexical(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{iri}>"),
            Term::Blank(id) => write!(f, "{id}"),
            Term::Literal(lit) => write!(f, "{lit}"),
        }
    }
}

impl From<Iri> for Term {
    fn from(value: Iri) -> Self {
        Term::Iri(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

/// One statement. Predicates are always IRIs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub s: Term,
    pub p: Iri,
    pub o: Term,
}

impl Triple {
    pub fn new(s: impl Into<Term>, p: Iri, o: impl Into<Term>) -> Self {
        Self {
            s: s.into(),
            p,
            o: o.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {} .", self.s, self.p, self.o)
    }
}
