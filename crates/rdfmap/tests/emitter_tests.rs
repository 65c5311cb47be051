use rdfmap::emitter::ntriples::NTriplesEmitter;
use rdfmap::emitter::turtle::TurtleEmitter;
use rdfmap::emitter::{emit_graph, EmitterSink, RdfFormat, TriplesEmitter};
use rdfmap::model::vocab::standard;
use rdfmap::{Graph, Iri, Literal, Term, Triple, TripleSink};

fn triple(s: &str, p: &str, o: Term) -> Triple {
    Triple::new(Iri::new(s), Iri::new(p), o)
}

// ---------------------------------------------------------------------------
// NTriples tests
// ---------------------------------------------------------------------------

#[test]
fn nt_basic_iri_triple() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::iri("http://example.org/o"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(
        out,
        "<http://example.org/s> <http://example.org/p> <http://example.org/o> .\n"
    );
}

#[test]
fn nt_literal_triple() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/name",
        Term::string("hello world"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(
        out,
        "<http://example.org/s> <http://example.org/name> \"hello world\" .\n"
    );
}

#[test]
fn nt_typed_literal() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::typed("42", standard::XSD_INTEGER),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(
        out,
        "<http://example.org/s> <http://example.org/p> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n"
    );
}

#[test]
fn nt_language_tagged_literal() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::Literal(Literal::lang("hallo", "de")),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(out, "<http://example.org/s> <http://example.org/p> \"hallo\"@de .\n");
}

#[test]
fn nt_blank_subject() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&Triple::new(
        Term::blank("b0"),
        Iri::new("http://example.org/p"),
        Term::string("x"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(out, "_:b0 <http://example.org/p> \"x\" .\n");
}

#[test]
fn nt_escape_special_chars() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::string("line1\nline2\ttab\"quote\\back"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains(r#""line1\nline2\ttab\"quote\\back""#));
}

#[test]
fn nt_escapes_control_characters() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::string("bell\u{7}"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains(r#""bell\u0007""#));
}

#[test]
fn nt_ignores_prefixes() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::iri("http://example.org/o"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(!out.contains("@prefix"));
    assert!(out.starts_with("<http://example.org/s>"));
}

#[test]
fn nt_triple_count() {
    let mut buf = Vec::new();
    let mut em = NTriplesEmitter::new(&mut buf);
    assert_eq!(em.triple_count(), 0);
    em.emit(&triple("http://a/s", "http://a/p", Term::iri("http://a/o")))
        .unwrap();
    em.emit(&triple("http://a/s", "http://a/q", Term::string("v")))
        .unwrap();
    assert_eq!(em.triple_count(), 2);
}

// ---------------------------------------------------------------------------
// Turtle tests
// ---------------------------------------------------------------------------

#[test]
fn ttl_prefix_compaction() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::iri("http://example.org/o"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("@prefix ex: <http://example.org/> ."));
    assert!(out.contains("ex:s ex:p ex:o ."));
}

#[test]
fn ttl_rdf_type_written_as_a() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.emit(&triple(
        "http://example.org/s",
        standard::RDF_TYPE,
        Term::iri("http://example.org/Person"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("ex:s a ex:Person ."));
}

#[test]
fn ttl_typed_literal_compacts_datatype() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.add_prefix("xsd", standard::XSD);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/age",
        Term::typed("42", standard::XSD_INT),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("ex:s ex:age \"42\"^^xsd:int ."));
}

#[test]
fn ttl_plain_string_has_no_datatype() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("xsd", standard::XSD);
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/p",
        Term::string("hi"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("\"hi\" ."));
    assert!(!out.contains("^^"));
}

#[test]
fn ttl_no_compaction_for_dotted_local_names() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.emit(&triple(
        "http://example.org/a.b",
        "http://example.org/p",
        Term::iri("http://other.org/o"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("<http://example.org/a.b> ex:p <http://other.org/o> ."));
}

#[test]
fn ttl_longest_prefix_wins() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.add_prefix("exv", "http://example.org/vocab/");
    em.emit(&triple(
        "http://example.org/s",
        "http://example.org/vocab/name",
        Term::string("n"),
    ))
    .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("ex:s exv:name \"n\" ."));
}

#[test]
fn ttl_prefixes_sorted() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("z", "http://z.org/");
    em.add_prefix("a", "http://a.org/");
    em.emit(&triple("http://a.org/s", "http://a.org/p", Term::iri("http://z.org/o")))
        .unwrap();
    let out = String::from_utf8(buf).unwrap();
    let a_pos = out.find("@prefix a:").unwrap();
    let z_pos = out.find("@prefix z:").unwrap();
    assert!(a_pos < z_pos);
}

#[test]
fn ttl_prefixes_written_once() {
    let mut buf = Vec::new();
    let mut em = TurtleEmitter::new(&mut buf);
    em.add_prefix("ex", "http://example.org/");
    em.emit(&triple("http://example.org/s", "http://example.org/p", Term::string("1")))
        .unwrap();
    em.emit(&triple("http://example.org/s", "http://example.org/q", Term::string("2")))
        .unwrap();
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(out.matches("@prefix").count(), 1);
    assert_eq!(em_lines(&out), 2);
}

fn em_lines(out: &str) -> usize {
    out.lines()
        .filter(|line| !line.is_empty() && !line.starts_with("@prefix"))
        .count()
}

// ---------------------------------------------------------------------------
// Graph emission and formats
// ---------------------------------------------------------------------------

#[test]
fn emit_graph_registers_graph_prefixes() {
    let mut graph = Graph::new();
    graph.add_prefix("ex", "http://example.org/");
    graph.add_triple(
        Iri::new("http://example.org/s"),
        Iri::new("http://example.org/p"),
        Term::string("v"),
    );

    let mut buf = Vec::new();
    let count = {
        let mut em = TurtleEmitter::new(&mut buf);
        emit_graph(&mut em, &graph).unwrap()
    };
    assert_eq!(count, 1);
    let out = String::from_utf8(buf).unwrap();
    assert!(out.starts_with("@prefix ex: <http://example.org/> ."));
    assert!(out.contains("ex:s ex:p \"v\" ."));
}

#[test]
fn emitter_sink_streams_triples() {
    let mut buf = Vec::new();
    {
        let mut sink = EmitterSink::new(NTriplesEmitter::new(&mut buf));
        sink.add(triple("http://a/s", "http://a/p", Term::string("v")))
            .unwrap();
        assert_eq!(sink.into_inner().triple_count(), 1);
    }
    let out = String::from_utf8(buf).unwrap();
    assert_eq!(out, "<http://a/s> <http://a/p> \"v\" .\n");
}

#[test]
fn format_parses_names_and_aliases() {
    assert_eq!("ntriples".parse::<RdfFormat>().unwrap(), RdfFormat::NTriples);
    assert_eq!("NT".parse::<RdfFormat>().unwrap(), RdfFormat::NTriples);
    assert_eq!("ttl".parse::<RdfFormat>().unwrap(), RdfFormat::Turtle);
    assert!("rdfxml".parse::<RdfFormat>().is_err());
    assert_eq!(RdfFormat::Turtle.to_string(), "turtle");
}

#[test]
fn format_builds_matching_emitter() {
    let mut buf = Vec::new();
    {
        let mut em = RdfFormat::Turtle.emitter(&mut buf);
        em.add_prefix("ex", "http://example.org/");
        em.emit(&triple("http://example.org/s", "http://example.org/p", Term::string("v")))
            .unwrap();
        em.flush().unwrap();
    }
    let out = String::from_utf8(buf).unwrap();
    assert!(out.contains("ex:s ex:p \"v\" ."));
}
