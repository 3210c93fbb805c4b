//! N-Triples codec.
//!
//! Writing is hand-rolled and deterministic: one triple per line, full IRIs,
//! lines in canonical (sorted) order, each terminated by ` .\n`. Reading goes
//! through Sophia's N-Triples parser.
//!
//! Literal encoding:
//! - simple strings: `"PT"`
//! - typed:          `"57"^^<http://www.w3.org/2001/XMLSchema#integer>`
//! - language:       `"texto"@pt`

use crate::error::{GraphError, Result};
use crate::model::{RdfGraph, RdfLiteral, RdfNode, RdfObject, RdfTriple};
use crate::record::is_plausible_iri;
use sophia::api::prelude::*;
use sophia::api::term::TermKind;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Bytes shown by default when previewing a triple file.
pub const DEFAULT_PREVIEW_BYTES: usize = 2000;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct TermSinkError {
    message: String,
}

impl TermSinkError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Writing
// ============================================================================

fn push_iri(out: &mut String, iri: &str) -> Result<()> {
    if !is_plausible_iri(iri) {
        return Err(GraphError::InvalidIri {
            iri: iri.to_string(),
        });
    }
    out.push('<');
    out.push_str(iri);
    out.push('>');
    Ok(())
}

fn push_quoted(out: &mut String, lexical: &str) {
    out.push('"');
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn push_node(out: &mut String, node: &RdfNode) -> Result<()> {
    match node {
        RdfNode::Iri(iri) => push_iri(out, iri)?,
        RdfNode::BlankNode(bn) => {
            out.push_str("_:");
            out.push_str(bn);
        }
    }
    Ok(())
}

fn push_literal(out: &mut String, lit: &RdfLiteral) -> Result<()> {
    push_quoted(out, &lit.lexical);
    if let Some(lang) = &lit.language {
        out.push('@');
        out.push_str(lang);
    } else if let Some(dt) = &lit.datatype {
        out.push_str("^^");
        push_iri(out, dt)?;
    }
    Ok(())
}

/// One N-Triples line, including the terminating ` .\n`.
///
/// IRIs are written verbatim; one that N-Triples cannot carry (no scheme,
/// whitespace, `<>"{}|^`\`` characters) is an [`GraphError::InvalidIri`].
pub fn triple_line(triple: &RdfTriple) -> Result<String> {
    let mut out = String::with_capacity(128);
    push_node(&mut out, &triple.subject)?;
    out.push(' ');
    push_iri(&mut out, &triple.predicate)?;
    out.push(' ');
    match &triple.object {
        RdfObject::Node(node) => push_node(&mut out, node)?,
        RdfObject::Literal(lit) => push_literal(&mut out, lit)?,
    }
    out.push_str(" .\n");
    Ok(out)
}

pub fn serialize(graph: &RdfGraph) -> Result<Vec<u8>> {
    let mut out = String::new();
    for triple in graph {
        out.push_str(&triple_line(triple)?);
    }
    Ok(out.into_bytes())
}

/// Stream `graph` to `writer`. Every line is rendered before the first byte
/// is written, so an invalid IRI leaves the writer untouched.
pub fn write_ntriples<W: Write>(graph: &RdfGraph, mut writer: W) -> Result<()> {
    let lines = graph.iter().map(triple_line).collect::<Result<Vec<_>>>()?;
    for line in &lines {
        writer.write_all(line.as_bytes()).map_err(GraphError::Write)?;
    }
    writer.flush().map_err(GraphError::Write)
}

/// Write `graph` to `path`, creating parent directories.
pub fn write_ntriples_file(graph: &RdfGraph, path: &Path) -> Result<()> {
    let bytes = serialize(graph)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| GraphError::io(path, e))?;
    info!(path = %path.display(), triples = graph.len(), "N-Triples written");
    Ok(())
}

// ============================================================================
// Reading
// ============================================================================

fn node_from_term<T: Term>(term: T) -> std::result::Result<RdfNode, TermSinkError> {
    match term.kind() {
        TermKind::Iri => term
            .iri()
            .map(|iri| RdfNode::Iri(iri.as_str().to_string()))
            .ok_or_else(|| TermSinkError::new("IRI term without IRI")),
        TermKind::BlankNode => term
            .bnode_id()
            .map(|bn| RdfNode::BlankNode(bn.as_str().to_string()))
            .ok_or_else(|| TermSinkError::new("blank node term without label")),
        other => Err(TermSinkError::new(format!(
            "expected IRI or blank node, got {other:?}"
        ))),
    }
}

fn object_from_term<T: Term>(term: T) -> std::result::Result<RdfObject, TermSinkError> {
    if term.kind() != TermKind::Literal {
        return node_from_term(term).map(RdfObject::Node);
    }
    let lexical = term
        .lexical_form()
        .map(|lex| lex.to_string())
        .ok_or_else(|| TermSinkError::new("literal without lexical form"))?;
    if let Some(tag) = term.language_tag() {
        return Ok(RdfObject::Literal(RdfLiteral::lang(lexical, tag.as_str())));
    }
    Ok(RdfObject::Literal(match term.datatype() {
        Some(dt) => RdfLiteral::typed(lexical, dt.as_str()),
        None => RdfLiteral::string(lexical),
    }))
}

pub fn deserialize(bytes: &[u8]) -> Result<RdfGraph> {
    let cursor = std::io::Cursor::new(bytes);
    let reader = std::io::BufReader::new(cursor);

    let mut graph = RdfGraph::new();
    let mut parser = sophia::turtle::parser::nt::parse_bufread(reader);
    parser
        .try_for_each_triple(|t| -> std::result::Result<(), TermSinkError> {
            let subject = node_from_term(t.s())?;
            let predicate = match node_from_term(t.p())? {
                RdfNode::Iri(iri) => iri,
                RdfNode::BlankNode(bn) => {
                    return Err(TermSinkError::new(format!(
                        "blank node _:{bn} in predicate position"
                    )))
                }
            };
            let object = object_from_term(t.o())?;
            graph.insert(RdfTriple {
                subject,
                predicate,
                object,
            });
            Ok(())
        })
        .map_err(|e| GraphError::Parse {
            message: e.to_string(),
        })?;
    Ok(graph)
}

/// Read an N-Triples file. A missing file fails before anything is parsed.
pub fn read_ntriples_file(path: &Path) -> Result<RdfGraph> {
    let bytes = fs::read(path).map_err(|e| GraphError::io(path, e))?;
    let graph = deserialize(&bytes)?;
    info!(path = %path.display(), triples = graph.len(), "N-Triples loaded");
    Ok(graph)
}

// ============================================================================
// Preview
// ============================================================================

/// The longest prefix of `bytes` within `max_bytes` made of complete lines.
///
/// When everything fits, everything is returned (even without a final newline).
pub fn preview(bytes: &[u8], max_bytes: usize) -> String {
    if bytes.len() <= max_bytes {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let head = &bytes[..max_bytes];
    match head.iter().rposition(|b| *b == b'\n') {
        Some(end) => String::from_utf8_lossy(&head[..=end]).into_owned(),
        None => String::new(),
    }
}

/// Preview the first `max_bytes` of a file without reading all of it.
pub fn preview_file(path: &Path, max_bytes: usize) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| GraphError::io(path, e))?;
    let mut head = Vec::with_capacity(max_bytes.saturating_add(1));
    // One extra byte tells "fits exactly" apart from "truncated".
    file.take(max_bytes as u64 + 1)
        .read_to_end(&mut head)
        .map_err(|e| GraphError::io(path, e))?;
    Ok(preview(&head, max_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::{Predicate, XSD_INTEGER_IRI};

    fn sample() -> RdfGraph {
        let person = RdfNode::iri("https://dadosabertos.camara.leg.br/recurso/deputado/204445");
        let mut g = RdfGraph::new();
        g.insert(RdfTriple::with(
            &person,
            Predicate::Name,
            RdfLiteral::string("Fernando \"Mineiro\"\nRN\\"),
        ));
        g.insert(RdfTriple::with(&person, Predicate::Identifier, RdfLiteral::integer(204445)));
        g.insert(RdfTriple::with(
            &person,
            Predicate::AddressRegion,
            RdfNode::iri("https://dadosabertos.camara.leg.br/recurso/uf/RN"),
        ));
        g.insert(RdfTriple::new(
            RdfNode::iri("https://dadosabertos.camara.leg.br/recurso/uf/RN"),
            "http://example.org/note",
            RdfLiteral::lang("João", "pt"),
        ));
        g
    }

    #[test]
    fn typed_literal_line_shape() {
        let person = RdfNode::iri("https://example.org/deputado/1");
        let line = triple_line(&RdfTriple::with(
            &person,
            Predicate::Legislatura,
            RdfLiteral::integer(57),
        ))
        .expect("line");
        assert_eq!(
            line,
            format!(
                "<https://example.org/deputado/1> <http://purl.org/ontology/politico/legislatura> \"57\"^^<{XSD_INTEGER_IRI}> .\n"
            )
        );
    }

    #[test]
    fn round_trip_preserves_set_and_types() {
        let g = sample();
        let back = deserialize(&serialize(&g).expect("serialize")).expect("parse");
        assert_eq!(back, g);

        let person = RdfNode::iri("https://dadosabertos.camara.leg.br/recurso/deputado/204445");
        let id = back
            .objects(&person, Predicate::Identifier.iri())
            .next()
            .and_then(RdfObject::as_literal)
            .and_then(RdfLiteral::as_i64);
        assert_eq!(id, Some(204445));
    }

    #[test]
    fn empty_graph_round_trips() {
        let g = RdfGraph::new();
        assert!(serialize(&g).expect("serialize").is_empty());
        assert_eq!(deserialize(b"").expect("parse"), g);
    }

    #[test]
    fn reader_ignores_line_order_and_comments() {
        let text = "# comment\n\
            <http://ex.org/b> <http://ex.org/p> \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n\
            \n\
            <http://ex.org/a> <http://ex.org/p> \"1\"^^<http://www.w3.org/2001/XMLSchema#string> .\n";
        let g = deserialize(text.as_bytes()).expect("parse");
        assert_eq!(g.len(), 2);
        assert!(g.contains(&RdfTriple::new(
            RdfNode::iri("http://ex.org/a"),
            "http://ex.org/p",
            RdfLiteral::string("1"),
        )));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = deserialize(b"<http://ex.org/a> not-a-triple\n").unwrap_err();
        assert!(matches!(err, GraphError::Parse { .. }));
    }

    #[test]
    fn preview_cuts_at_line_boundary() {
        let bytes = serialize(&sample()).expect("serialize");
        let text = String::from_utf8(bytes.clone()).expect("utf8");
        let first_line_len = text.find('\n').expect("newline") + 1;

        let head = preview(&bytes, first_line_len + 5);
        assert_eq!(head.len(), first_line_len);
        assert!(deserialize(head.as_bytes()).is_ok());

        assert_eq!(preview(&bytes, 3), "");
        assert_eq!(preview(&bytes, bytes.len()), text);
    }

    #[test]
    fn file_round_trip_and_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("processed/deputados_legisl_57.nt");
        write_ntriples_file(&sample(), &path).expect("write");
        assert_eq!(read_ntriples_file(&path).expect("read"), sample());

        let preview = preview_file(&path, DEFAULT_PREVIEW_BYTES).expect("preview");
        assert!(preview.ends_with(" .\n"));

        let missing = dir.path().join("nope.nt");
        assert!(matches!(
            read_ntriples_file(&missing),
            Err(GraphError::FileNotFound { .. })
        ));
    }

    #[test]
    fn iri_with_space_is_rejected_on_write() {
        let mut g = sample();
        g.insert(RdfTriple::new(
            RdfNode::iri("https://example.org/deputado/1"),
            Predicate::Page.iri(),
            RdfNode::iri("https://example.org/a b"),
        ));

        let err = serialize(&g).unwrap_err();
        assert!(
            matches!(&err, GraphError::InvalidIri { iri } if iri == "https://example.org/a b"),
            "{err}"
        );

        let mut sink = Vec::new();
        assert!(write_ntriples(&g, &mut sink).is_err());
        assert!(sink.is_empty());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.nt");
        assert!(matches!(
            write_ntriples_file(&g, &path),
            Err(GraphError::InvalidIri { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn invalid_datatype_and_predicate_iris_are_rejected() {
        let person = RdfNode::iri("https://example.org/deputado/1");
        let bad_type = RdfTriple::new(
            person.clone(),
            Predicate::Identifier.iri(),
            RdfLiteral::typed("1", "not an iri"),
        );
        assert!(triple_line(&bad_type).is_err());

        let bad_predicate = RdfTriple::new(person, "http://ex.org/p{x}", RdfLiteral::string("v"));
        assert!(triple_line(&bad_predicate).is_err());
    }
}
