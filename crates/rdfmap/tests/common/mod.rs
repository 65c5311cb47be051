//! Mapped fixture types and a fake repository shared by the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use rdfmap::error::RepositoryError;
use rdfmap::model::vocab::standard;
use rdfmap::repository::Repository;
use rdfmap::{
    ClassDeclaration, Graph, Mapped, ObjectMapper, PredicateSpec, SubjectSpec, Term, TripleSource,
    TypeSpec,
};

pub const EX: &str = "http://ex/";

pub fn mapper() -> ObjectMapper {
    ObjectMapper::new().unwrap()
}

// ---------------------------------------------------------------------------
// Bean-style fixtures
// ---------------------------------------------------------------------------

/// Fixed subject, one required literal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Resource {
    pub value: String,
}

impl Mapped for Resource {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Resource::default)
            .subject(SubjectSpec::new("http://ex/1"));
        class
            .property::<String>("value")
            .get(|r| &r.value)
            .set(|r, v| r.value = v)
            .predicate(PredicateSpec::new("http://ex/value").literal());
    }
}

/// Subject relative to the parent, supplied by the `key` property.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub key: String,
    pub street: String,
}

impl Mapped for Address {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Address::default)
            .rdf_type(TypeSpec::single("http://ex/Address"));
        class
            .property::<String>("key")
            .get(|a| &a.key)
            .set(|a, v| a.key = v)
            .subject(SubjectSpec::property().relative());
        class
            .property::<String>("street")
            .get(|a| &a.street)
            .set(|a, v| a.street = v)
            .predicate(PredicateSpec::new("http://ex/street").literal());
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub age: Option<i32>,
    pub nicknames: Vec<String>,
    pub address: Option<Address>,
    pub tags: BTreeSet<String>,
}

impl Mapped for Person {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Person::default)
            .rdf_type(TypeSpec::new(["http://ex/Person", "http://ex/Agent"]));
        class
            .property::<String>("id")
            .get(|p| &p.id)
            .set(|p, v| p.id = v)
            .subject(SubjectSpec::property());
        class
            .property::<String>("name")
            .get(|p| &p.name)
            .set(|p, v| p.name = v)
            .predicate(PredicateSpec::new("http://ex/name").literal());
        class
            .property::<Option<i32>>("age")
            .get(|p| &p.age)
            .set(|p, v| p.age = v)
            .predicate(
                PredicateSpec::new("http://ex/age")
                    .optional()
                    .literal()
                    .datatype(standard::XSD_INT),
            );
        class
            .property::<Vec<String>>("nicknames")
            .get(|p| &p.nicknames)
            .set(|p, v| p.nicknames = v)
            .predicate(PredicateSpec::new("http://ex/nickname").optional().literal());
        class
            .property::<Option<Address>>("address")
            .get(|p| &p.address)
            .set(|p, v| p.address = v)
            .predicate(PredicateSpec::new("http://ex/address").optional());
        class
            .property::<BTreeSet<String>>("tags")
            .get(|p| &p.tags)
            .set(|p, v| p.tags = v)
            .predicate(PredicateSpec::new("http://ex/tag").optional().literal());
    }
}

pub fn alice() -> Person {
    Person {
        id: "http://ex/alice".into(),
        name: "Alice".into(),
        age: Some(42),
        nicknames: vec!["Al".into(), "Ally".into()],
        address: Some(Address {
            key: "home".into(),
            street: "Main Street 1".into(),
        }),
        tags: ["b".to_string(), "a".to_string()].into_iter().collect(),
    }
}

/// Required and optional literal; target of most mix-in tests.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Labelled {
    pub label: String,
    pub note: String,
}

impl Mapped for Labelled {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Labelled::default)
            .subject(SubjectSpec::new("http://ex/labelled"));
        class
            .property::<String>("label")
            .get(|l| &l.label)
            .set(|l, v| l.label = v)
            .predicate(PredicateSpec::new("http://ex/label").literal());
        class
            .property::<String>("note")
            .get(|l| &l.note)
            .set(|l, v| l.note = v)
            .getter_predicate(PredicateSpec::new("http://ex/note").optional().literal());
    }
}

/// Value that must never be supplied on read.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Audited {
    pub created: Option<String>,
}

impl Mapped for Audited {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Audited::default);
        class
            .property::<Option<String>>("created")
            .get(|a| &a.created)
            .set(|a, v| a.created = v)
            .predicate(
                PredicateSpec::new("http://ex/created")
                    .optional()
                    .readonly()
                    .literal(),
            );
    }
}

/// Required but wrapped, so it can be absent on write.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Draft {
    pub title: Option<String>,
}

impl Mapped for Draft {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Draft::default);
        class
            .property::<Option<String>>("title")
            .get(|d| &d.title)
            .set(|d, v| d.title = v)
            .predicate(PredicateSpec::new("http://ex/title").literal());
    }
}

/// IRI-valued leaf.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Link {
    pub target: String,
}

impl Mapped for Link {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Link::default);
        class
            .property::<String>("target")
            .get(|l| &l.target)
            .set(|l, v| l.target = v)
            .predicate(PredicateSpec::new("http://ex/target"));
    }
}

/// Self-referential graph node.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub children: Vec<Node>,
}

impl Mapped for Node {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Node::default);
        class
            .property::<String>("id")
            .get(|n| &n.id)
            .set(|n, v| n.id = v)
            .subject(SubjectSpec::property());
        class
            .property::<Vec<Node>>("children")
            .get(|n| &n.children)
            .set(|n, v| n.children = v)
            .predicate(PredicateSpec::new("http://ex/child").optional());
    }
}

// ---------------------------------------------------------------------------
// Inheritance
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Animal {
    pub name: String,
}

impl Mapped for Animal {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Animal::default)
            .rdf_type(TypeSpec::single("http://ex/Animal"));
        class
            .property::<String>("name")
            .get(|a| &a.name)
            .set(|a, v| a.name = v)
            .predicate(PredicateSpec::new("http://ex/name").literal());
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dog {
    pub animal: Animal,
    pub breed: String,
}

impl Mapped for Dog {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .default_constructor(Dog::default)
            .extends::<Animal, _, _>(|d| &d.animal, |d| &mut d.animal)
            .rdf_type(TypeSpec::single("http://ex/Dog"));
        class
            .property::<String>("breed")
            .get(|d| &d.breed)
            .set(|d, v| d.breed = v)
            .predicate(PredicateSpec::new("http://ex/breed").literal());
    }
}

// ---------------------------------------------------------------------------
// Builder and constructor fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub title: String,
    pub authors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct BookBuilder {
    title: String,
    authors: Vec<String>,
}

impl Mapped for Book {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class
            .builder(BookBuilder::default, |b: BookBuilder| Book {
                title: b.title,
                authors: b.authors,
            })
            .method("title", |mut b: BookBuilder, title: String| {
                b.title = title;
                b
            })
            .element_method("authors", |mut b: BookBuilder, author: String| {
                b.authors.push(author);
                b
            });
        class
            .property::<String>("title")
            .get(|b| &b.title)
            .predicate(PredicateSpec::new("http://ex/title").literal());
        class
            .property::<Vec<String>>("authors")
            .get(|b| &b.authors)
            .predicate(PredicateSpec::new("http://ex/author").optional().literal());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    pub label: Option<String>,
}

impl Mapped for Point {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.constructor(
            &["x", "y", "label"],
            |x: i32, y: i32, label: Option<String>| Point { x, y, label },
        );
        class
            .property::<i32>("x")
            .get(|p| &p.x)
            .predicate(PredicateSpec::new("http://ex/x").literal().datatype(standard::XSD_INT));
        class
            .property::<i32>("y")
            .get(|p| &p.y)
            .predicate(PredicateSpec::new("http://ex/y").literal().datatype(standard::XSD_INT));
        class
            .property::<Option<String>>("label")
            .get(|p| &p.label)
            .predicate(PredicateSpec::new("http://ex/label").optional().literal());
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Triangle {
    pub sides: [u32; 3],
}

impl Mapped for Triangle {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Triangle::default);
        class
            .property::<[u32; 3]>("sides")
            .get(|t| &t.sides)
            .set(|t, v| t.sides = v)
            .predicate(PredicateSpec::new("http://ex/side").literal());
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tagged {
    pub tags: HashSet<String>,
}

impl Mapped for Tagged {
    fn declare(class: &mut ClassDeclaration<Self>) {
        class.default_constructor(Tagged::default);
        class
            .property::<HashSet<String>>("tags")
            .get(|t| &t.tags)
            .set(|t, v| t.tags = v)
            .predicate(PredicateSpec::new("http://ex/tag").literal());
    }
}

// ---------------------------------------------------------------------------
// Repository fake
// ---------------------------------------------------------------------------

/// Answers every construct query with the triples reachable from the bound
/// subject, and records the queries it was given.
#[derive(Default)]
pub struct MemoryRepository {
    pub graph: Graph,
    pub queries: RefCell<Vec<String>>,
}

impl Repository for MemoryRepository {
    fn construct(&self, query: &str, bindings: &[(&str, Term)]) -> Result<Graph, RepositoryError> {
        self.queries.borrow_mut().push(query.to_string());
        let subject = bindings
            .iter()
            .find(|(name, _)| *name == "s")
            .map(|(_, term)| term.clone())
            .ok_or_else(|| RepositoryError::Query("?s is unbound".into()))?;

        let mut result = Graph::new();
        let mut pending = vec![subject];
        while let Some(node) = pending.pop() {
            for triple in self.graph.matching(Some(&node), None, None) {
                let object = triple.o.clone();
                if result.insert(triple) && matches!(object, Term::Iri(_)) {
                    pending.push(object);
                }
            }
        }
        Ok(result)
    }

    fn add(&mut self, graph: &Graph) -> Result<(), RepositoryError> {
        self.graph.extend(graph.iter().cloned());
        Ok(())
    }
}
