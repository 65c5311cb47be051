mod common;

use std::sync::Arc;

use common::*;
use rdfmap::error::{MapperError, RepositoryError, ValidationError};
use rdfmap::repository::query::{QueryGenerator, VAR_SUBJECT};
use rdfmap::repository::Repository;
use rdfmap::{ClassAnalyzer, Graph, Iri, Term};

// ---------------------------------------------------------------------------
// Query text
// ---------------------------------------------------------------------------

#[test]
fn optional_predicates_are_wrapped_in_where_only() {
    let generator = QueryGenerator::new(Arc::new(ClassAnalyzer::new()));
    let query = generator.generate::<Labelled>().unwrap();
    assert_eq!(
        &*query,
        "CONSTRUCT {\n  ?s <http://ex/label> ?o1 .\n  ?s <http://ex/note> ?o2\n} WHERE {\n  ?s <http://ex/label> ?o1 .\n  OPTIONAL { ?s <http://ex/note> ?o2 }\n}\n"
    );
}

#[test]
fn nested_patterns_continue_the_variable_count() {
    let generator = QueryGenerator::new(Arc::new(ClassAnalyzer::new()));
    let query = generator.generate::<Person>().unwrap();
    let expected = concat!(
        "CONSTRUCT {\n",
        "  ?s <http://ex/name> ?o1 .\n",
        "  ?s <http://ex/age> ?o2 .\n",
        "  ?s <http://ex/nickname> ?o3 .\n",
        "  ?s <http://ex/address> ?o4 .\n",
        "  ?o4 <http://ex/street> ?o5 .\n",
        "  ?s <http://ex/tag> ?o6\n",
        "} WHERE {\n",
        "  ?s <http://ex/name> ?o1 .\n",
        "  OPTIONAL { ?s <http://ex/age> ?o2 } .\n",
        "  OPTIONAL { ?s <http://ex/nickname> ?o3 } .\n",
        "  OPTIONAL { ?s <http://ex/address> ?o4 .\n",
        "  ?o4 <http://ex/street> ?o5 } .\n",
        "  OPTIONAL { ?s <http://ex/tag> ?o6 }\n",
        "}\n",
    );
    assert_eq!(&*query, expected);
}

#[test]
fn recursive_types_are_expanded_once() {
    let generator = QueryGenerator::new(Arc::new(ClassAnalyzer::new()));
    let query = generator.generate::<Node>().unwrap();
    assert_eq!(
        &*query,
        "CONSTRUCT {\n  ?s <http://ex/child> ?o1\n} WHERE {\n  OPTIONAL { ?s <http://ex/child> ?o1 }\n}\n"
    );
}

#[test]
fn inherited_predicates_are_queried() {
    let generator = QueryGenerator::new(Arc::new(ClassAnalyzer::new()));
    let query = generator.generate::<Dog>().unwrap();
    assert!(query.contains("  ?s <http://ex/name> ?o1 .\n  ?s <http://ex/breed> ?o2\n}"));
}

#[test]
fn queries_are_cached() {
    let generator = QueryGenerator::new(Arc::new(ClassAnalyzer::new()));
    let first = generator.generate::<Person>().unwrap();
    let second = generator.generate::<Person>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn subject_variable_is_named_s() {
    assert_eq!(VAR_SUBJECT, "s");
}

// ---------------------------------------------------------------------------
// Repository round trips
// ---------------------------------------------------------------------------

#[test]
fn repository_round_trip() {
    let mapper = mapper();
    let mut repository = MemoryRepository::default();
    let subject = Iri::new("http://ex/alice");

    mapper
        .repository_writer()
        .write(&mut repository, &alice(), &subject)
        .unwrap();
    assert_eq!(repository.graph.len(), 11);

    let person: Person = mapper.repository_reader().read(&repository, &subject).unwrap();
    assert_eq!(person, alice());

    let queries = repository.queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0], &*mapper.queries().generate::<Person>().unwrap());
}

#[test]
fn repository_read_only_sees_reachable_triples() {
    let mapper = mapper();
    let mut repository = MemoryRepository::default();
    let writer = mapper.repository_writer();
    writer
        .write(&mut repository, &alice(), &Iri::new("http://ex/alice"))
        .unwrap();
    let mut bob = alice();
    bob.id = "http://ex/bob".into();
    bob.name = "Bob".into();
    writer
        .write(&mut repository, &bob, &Iri::new("http://ex/bob"))
        .unwrap();

    let read: Person = mapper
        .repository_reader()
        .read(&repository, &Iri::new("http://ex/bob"))
        .unwrap();
    assert_eq!(read.name, "Bob");
}

#[test]
fn repository_read_validates_result() {
    let mapper = mapper();
    let repository = MemoryRepository::default();
    assert!(matches!(
        mapper
            .repository_reader()
            .read::<Resource>(&repository, &Iri::new("http://ex/1")),
        Err(MapperError::Validation(ValidationError::MissingRequired { .. }))
    ));
}

struct Offline;

impl Repository for Offline {
    fn construct(&self, _query: &str, _bindings: &[(&str, Term)]) -> Result<Graph, RepositoryError> {
        Err(RepositoryError::Query("connection refused".into()))
    }

    fn add(&mut self, _graph: &Graph) -> Result<(), RepositoryError> {
        Err(RepositoryError::Update("read-only".into()))
    }
}

#[test]
fn repository_failures_are_propagated() {
    let mapper = mapper();
    assert!(matches!(
        mapper
            .repository_reader()
            .read::<Resource>(&Offline, &Iri::new("http://ex/1")),
        Err(MapperError::Repository(RepositoryError::Query(_)))
    ));
    assert!(matches!(
        mapper.repository_writer().write(
            &mut Offline,
            &Resource { value: "v".into() },
            &Iri::new("http://ex/1")
        ),
        Err(MapperError::Repository(RepositoryError::Update(_)))
    ));
}
