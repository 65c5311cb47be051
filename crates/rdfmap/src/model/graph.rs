//! In-memory triple graph and the source/sink contracts the engines use.
//!
//! The reader only ever asks a [`TripleSource`] for matching triples and the
//! writer only ever pushes into a [`TripleSink`], so the same engines run over
//! an in-memory [`Graph`], a query result, or a streaming serializer.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;

use super::term::{Iri, Term, Triple};

/// Read side of a triple store: pattern matching with wildcards.
pub trait TripleSource {
    /// All triples matching the pattern; `None` matches anything.
    fn matching(&self, s: Option<&Term>, p: Option<&Iri>, o: Option<&Term>) -> Vec<Triple>;

    /// Objects of `(s, p, ?)`, in source order.
    fn objects(&self, s: &Term, p: &Iri) -> Vec<Term> {
        self.matching(Some(s), Some(p), None)
            .into_iter()
            .map(|t| t.o)
            .collect()
    }
}

/// Write side of a triple store.
pub trait TripleSink {
    fn add(&mut self, triple: Triple) -> io::Result<()>;
}

/// An insertion-ordered set of triples.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    /// Positions in `triples` per subject
    by_subject: HashMap<Term, Vec<usize>>,
    /// Prefix mappings (deterministic order via BTreeMap)
    pub prefixes: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Insert a triple. Returns `false` when it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.by_subject
            .entry(triple.s.clone())
            .or_default()
            .push(self.triples.len());
        self.triples.push(triple);
        true
    }

    pub fn add_triple(&mut self, s: impl Into<Term>, p: Iri, o: impl Into<Term>) -> bool {
        self.insert(Triple::new(s, p, o))
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Sort triples by SPO for deterministic output
    pub fn sort(&mut self) {
        self.triples.sort();
        self.reindex();
    }

    fn reindex(&mut self) {
        self.by_subject.clear();
        for (position, triple) in self.triples.iter().enumerate() {
            self.by_subject
                .entry(triple.s.clone())
                .or_default()
                .push(position);
        }
    }
}

impl TripleSource for Graph {
    fn matching(&self, s: Option<&Term>, p: Option<&Iri>, o: Option<&Term>) -> Vec<Triple> {
        let keep = |t: &&Triple| {
            p.is_none_or(|p| &t.p == p) && o.is_none_or(|o| &t.o == o)
        };
        match s {
            Some(s) => self
                .by_subject
                .get(s)
                .into_iter()
                .flatten()
                .filter_map(|&position| self.triples.get(position))
                .filter(keep)
                .cloned()
                .collect(),
            None => self.triples.iter().filter(keep).cloned().collect(),
        }
    }
}

impl TripleSink for Graph {
    fn add(&mut self, triple: Triple) -> io::Result<()> {
        self.insert(triple);
        Ok(())
    }
}

impl FromIterator<Triple> for Graph {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        let mut graph = Graph::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Triple> for Graph {
    fn extend<T: IntoIterator<Item = Triple>>(&mut self, iter: T) {
        for triple in iter {
            self.insert(triple);
        }
    }
}

impl<'a> IntoIterator for &'a Graph {
    type Item = &'a Triple;
    type IntoIter = std::slice::Iter<'a, Triple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

impl PartialEq for Graph {
    /// Set equality; insertion order and prefixes are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}
