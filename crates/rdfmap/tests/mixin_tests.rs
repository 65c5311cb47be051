mod common;

use common::*;
use rdfmap::analysis::mixin::{Inheritance, MixInResolver, OwnDeclarations};
use rdfmap::analysis::TypeKey;
use rdfmap::error::{AnalysisError, InstanceError, MapperError};
use rdfmap::{
    Graph, Iri, MergePolicy, Overlay, PredicateSpec, Role, SimpleModule, Term, TripleSource,
    TypeSpec,
};

fn with_overlay<T: rdfmap::Mapped>(overlay: Overlay<T>) -> rdfmap::ObjectMapper {
    let mut mapper = mapper();
    mapper
        .add_module(&SimpleModule::new().add_mixin(overlay.into_declaration()))
        .unwrap();
    mapper
}

fn predicate_iris(descriptor: &rdfmap::ClassDescriptor) -> Vec<&str> {
    descriptor
        .predicates()
        .iter()
        .map(|predicate| predicate.annotation().iri())
        .collect()
}

fn labelled() -> Labelled {
    Labelled {
        label: "L".into(),
        note: "n".into(),
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn unmarked_overlay_is_refused() {
    let mut mapper = mapper();
    let overlay = Overlay::<Labelled>::new().rdf_type(TypeSpec::single("http://ex/Labelled"));
    let err = mapper
        .add_module(&SimpleModule::new().add_mixin(overlay.into_declaration()))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        MapperError::Analysis(AnalysisError::MissingMixInMarker { .. })
    ));
}

#[test]
fn resolver_tracks_registered_targets() {
    let resolver = MixInResolver::new();
    assert!(!resolver.is_registered(TypeKey::of::<Labelled>()));
    let overlay = Overlay::<Labelled>::new().mix_in(MergePolicy::default());
    resolver.register(overlay.into_declaration()).unwrap();
    assert!(resolver.is_registered(TypeKey::of::<Labelled>()));
    assert!(!resolver.is_registered(TypeKey::of::<Person>()));
}

#[test]
fn overlay_declaration_reports_target_and_policy() {
    let policy = MergePolicy {
        inherit: Inheritance::Isolate,
        declarations: OwnDeclarations::Override,
    };
    let declaration = Overlay::<Dog>::new().mix_in(policy).into_declaration();
    assert_eq!(declaration.target(), TypeKey::of::<Dog>());
    assert_eq!(declaration.policy(), Some(policy));
}

// ---------------------------------------------------------------------------
// Merge policies
// ---------------------------------------------------------------------------

#[test]
fn kept_declarations_are_extended_by_the_mixin() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .rdf_type(TypeSpec::single("http://ex/Labelled"))
        .member::<String>(
            "note",
            Role::Predicate(PredicateSpec::new("http://ex/comment").optional().literal()),
        );
    let mapper = with_overlay(overlay);
    let descriptor = mapper.analyze::<Labelled>().unwrap();

    assert_eq!(
        predicate_iris(&descriptor),
        ["http://ex/label", "http://ex/note", "http://ex/comment"]
    );
    assert_eq!(
        descriptor.type_property().unwrap().annotation().iris(),
        ["http://ex/Labelled"]
    );
    assert_eq!(
        descriptor.predicates()[2].declared_by(),
        TypeKey::of::<Overlay<Labelled>>()
    );
}

#[test]
fn mixin_predicates_are_written() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .rdf_type(TypeSpec::single("http://ex/Labelled"))
        .member::<String>(
            "note",
            Role::Predicate(PredicateSpec::new("http://ex/comment").optional().literal()),
        );
    let mapper = with_overlay(overlay);
    let graph = mapper.write(&labelled(), "http://ex/x").unwrap();

    let s = Term::iri("http://ex/x");
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.objects(&s, &Iri::new("http://ex/comment")), [Term::string("n")]);
    assert_eq!(
        graph.objects(&s, &Iri::new("http://www.w3.org/1999/02/22-rdf-syntax-ns#type")),
        [Term::iri("http://ex/Labelled")]
    );
}

#[test]
fn overriding_mixin_replaces_own_declarations() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy {
            inherit: Inheritance::Inherit,
            declarations: OwnDeclarations::Override,
        })
        .member::<String>(
            "label",
            Role::Predicate(PredicateSpec::new("http://ex/title").literal()),
        );
    let mapper = with_overlay(overlay);
    let descriptor = mapper.analyze::<Labelled>().unwrap();
    assert_eq!(predicate_iris(&descriptor), ["http://ex/title"]);
    assert!(descriptor.subject().is_none());

    let graph = mapper.write(&labelled(), "http://ex/x").unwrap();
    assert_eq!(graph.len(), 1);

    let mut input = Graph::new();
    input.add_triple(Iri::new("http://ex/x"), Iri::new("http://ex/title"), Term::string("T"));
    let read: Labelled = mapper.read(&input, "http://ex/x").unwrap();
    assert_eq!(read.label, "T");
    assert_eq!(read.note, "");
}

#[test]
fn isolating_mixin_drops_inherited_descriptors() {
    let overlay = Overlay::<Dog>::new().mix_in(MergePolicy {
        inherit: Inheritance::Isolate,
        declarations: OwnDeclarations::Keep,
    });
    let mapper = with_overlay(overlay);
    let dog = mapper.analyze::<Dog>().unwrap();
    assert_eq!(predicate_iris(&dog), ["http://ex/breed"]);
    assert_eq!(dog.type_property().unwrap().annotation().iris(), ["http://ex/Dog"]);
}

#[test]
fn inheriting_mixin_keeps_supertype_predicates() {
    let overlay = Overlay::<Dog>::new().mix_in(MergePolicy::default()).member::<String>(
        "breed",
        Role::Predicate(PredicateSpec::new("http://ex/race").literal()),
    );
    let mapper = with_overlay(overlay);
    let dog = mapper.analyze::<Dog>().unwrap();
    assert_eq!(
        predicate_iris(&dog),
        ["http://ex/name", "http://ex/breed", "http://ex/race"]
    );
}

// ---------------------------------------------------------------------------
// Member binding
// ---------------------------------------------------------------------------

#[test]
fn unknown_member_fails_analysis() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .member::<String>("missing", Role::Predicate(PredicateSpec::new("http://ex/m")));
    let mapper = with_overlay(overlay);
    assert!(matches!(
        mapper.analyze::<Labelled>(),
        Err(MapperError::Analysis(AnalysisError::MixinBindingNotFound { member, .. })) if member == "missing"
    ));
}

#[test]
fn member_with_other_type_does_not_bind() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .member::<i32>("label", Role::Predicate(PredicateSpec::new("http://ex/m")));
    let mapper = with_overlay(overlay);
    assert!(matches!(
        mapper.analyze::<Labelled>(),
        Err(MapperError::Analysis(AnalysisError::MixinBindingNotFound { .. }))
    ));
}

#[test]
fn invalid_mixin_predicate_is_rejected() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .member::<String>("label", Role::Predicate(PredicateSpec::new("no scheme")));
    let mapper = with_overlay(overlay);
    assert!(matches!(
        mapper.analyze::<Labelled>(),
        Err(MapperError::Analysis(AnalysisError::InvalidAnnotation { .. }))
    ));
}

#[test]
fn default_member_computes_written_value_and_reads_through_target_setter() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .default_member::<String, _>(
            "note",
            Role::Predicate(PredicateSpec::new("http://ex/shout").optional().literal()),
            |l: &Labelled| l.note.to_uppercase(),
        );
    let mapper = with_overlay(overlay);

    let graph = mapper.write(&labelled(), "http://ex/x").unwrap();
    let s = Term::iri("http://ex/x");
    assert_eq!(graph.objects(&s, &Iri::new("http://ex/note")), [Term::string("n")]);
    assert_eq!(graph.objects(&s, &Iri::new("http://ex/shout")), [Term::string("N")]);

    let mut input = Graph::new();
    input.add_triple(Iri::new("http://ex/x"), Iri::new("http://ex/label"), Term::string("L"));
    input.add_triple(Iri::new("http://ex/x"), Iri::new("http://ex/shout"), Term::string("LOUD"));
    let read: Labelled = mapper.read(&input, "http://ex/x").unwrap();
    assert_eq!(read.note, "LOUD");
}

#[test]
fn default_member_without_counterpart_is_write_only() {
    let overlay = Overlay::<Labelled>::new()
        .mix_in(MergePolicy::default())
        .default_member::<String, _>(
            "summary",
            Role::Predicate(PredicateSpec::new("http://ex/summary").optional().literal()),
            |l: &Labelled| format!("{}/{}", l.label, l.note),
        );
    let mapper = with_overlay(overlay);

    let graph = mapper.write(&labelled(), "http://ex/x").unwrap();
    assert_eq!(
        graph.objects(&Term::iri("http://ex/x"), &Iri::new("http://ex/summary")),
        [Term::string("L/n")]
    );

    let mut input = Graph::new();
    input.add_triple(Iri::new("http://ex/x"), Iri::new("http://ex/label"), Term::string("L"));
    input.add_triple(Iri::new("http://ex/x"), Iri::new("http://ex/summary"), Term::string("s"));
    assert!(matches!(
        mapper.read::<Labelled>(&input, "http://ex/x"),
        Err(MapperError::Instance(InstanceError::MissingSetter { property, .. })) if property == "summary"
    ));
}
