//! Per-legislator subgraph rendering.
//!
//! The filtered subgraph is turned into a small node/edge view: one node per
//! distinct term, one edge per triple, labelled with the predicate's local
//! name. Output formats:
//! - Graphviz DOT (`dot -Tpng` to get an image)
//! - JSON (for custom frontends)

use anyhow::{anyhow, Result};
use deputados_graph::ontology::{compact_iri, local_name};
use deputados_graph::{RdfGraph, RdfNode, RdfObject};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VizFormat {
    Dot,
    Json,
}

impl VizFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(Self::Dot),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("unknown viz format `{other}` (expected dot|json)")),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VizGraph {
    pub focus: String,
    pub nodes: Vec<VizNode>,
    pub edges: Vec<VizEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VizNode {
    pub id: usize,
    /// Full IRI, `_:label`, or literal text.
    pub term: String,
    pub label: String,
    pub kind: String, // "iri" | "blank" | "literal"
}

#[derive(Debug, Clone, Serialize)]
pub struct VizEdge {
    pub source: usize,
    pub target: usize,
    pub label: String,
    pub predicate: String,
}

/// Node/edge view of `graph` around `focus`. Equal terms share a node.
pub fn subject_view(graph: &RdfGraph, focus: &RdfNode) -> VizGraph {
    let mut nodes = NodeTable::default();
    let focus_id = nodes.node(focus);
    let mut edges = Vec::new();
    for triple in graph {
        let source = nodes.node(&triple.subject);
        let target = match &triple.object {
            RdfObject::Node(node) => nodes.node(node),
            RdfObject::Literal(lit) => nodes.intern("literal", &lit.lexical, lit.lexical.clone()),
        };
        edges.push(VizEdge {
            source,
            target,
            label: local_name(&triple.predicate).to_string(),
            predicate: triple.predicate.clone(),
        });
    }

    let nodes = nodes.nodes;
    VizGraph {
        focus: nodes[focus_id].term.clone(),
        nodes,
        edges,
    }
}

#[derive(Default)]
struct NodeTable {
    ids: BTreeMap<(&'static str, String), usize>,
    nodes: Vec<VizNode>,
}

impl NodeTable {
    fn node(&mut self, node: &RdfNode) -> usize {
        match node {
            RdfNode::Iri(iri) => self.intern("iri", iri, compact_iri(iri)),
            RdfNode::BlankNode(id) => {
                let term = format!("_:{id}");
                self.intern("blank", &term, term.clone())
            }
        }
    }

    fn intern(&mut self, kind: &'static str, term: &str, label: String) -> usize {
        if let Some(&id) = self.ids.get(&(kind, term.to_string())) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(VizNode {
            id,
            term: term.to_string(),
            label,
            kind: kind.to_string(),
        });
        self.ids.insert((kind, term.to_string()), id);
        id
    }
}

pub fn render_dot(g: &VizGraph) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    let mut out = String::new();
    out.push_str("digraph deputado {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");
    out.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    for n in &g.nodes {
        let mut attrs = vec![format!("label=\"{}\"", dot_escape(&n.label))];
        if n.term == g.focus {
            attrs.push("style=filled".to_string());
            attrs.push("fillcolor=\"#fde68a\"".to_string());
        } else if n.kind == "literal" {
            attrs.push("shape=plaintext".to_string());
        } else {
            attrs.push("shape=ellipse".to_string());
        }
        out.push_str(&format!("  n{} [{}];\n", n.id, attrs.join(", ")));
    }
    out.push('\n');
    for e in &g.edges {
        out.push_str(&format!(
            "  n{} -> n{} [label=\"{}\"];\n",
            e.source,
            e.target,
            dot_escape(&e.label)
        ));
    }
    out.push_str("}\n");
    out
}

pub fn render_json(g: &VizGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(g)?)
}

pub fn render(g: &VizGraph, format: VizFormat) -> Result<String> {
    match format {
        VizFormat::Dot => Ok(render_dot(g)),
        VizFormat::Json => render_json(g),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deputados_graph::{filter_subgraph, GraphBuilder, LegislatorRecord};

    fn mineiro_graph() -> (RdfGraph, RdfNode) {
        let rec = LegislatorRecord {
            id: 204445,
            name: "Fernando \"Mineiro\"".to_string(),
            party_acronym: "PT".to_string(),
            party_uri: "https://dadosabertos.camara.leg.br/api/v2/partidos/36844".to_string(),
            region_code: "RN".to_string(),
            legislature: 57,
            profile_uri: "https://dadosabertos.camara.leg.br/api/v2/deputados/204445".to_string(),
            photo_url: "https://www.camara.leg.br/internet/deputado/bandep/204445.jpg".to_string(),
            email: None,
        };
        let builder = GraphBuilder::default();
        let graph = builder.build([&rec]).graph;
        let person = builder.scheme().person(204445);
        (filter_subgraph(&graph, &person), person)
    }

    #[test]
    fn edges_are_labelled_by_local_name() {
        let (sub, person) = mineiro_graph();
        let view = subject_view(&sub, &person);
        assert_eq!(view.edges.len(), 8);
        let labels: Vec<&str> = view.edges.iter().map(|e| e.label.as_str()).collect();
        for expected in ["type", "name", "memberOf", "addressRegion", "identifier", "page", "image", "legislatura"] {
            assert!(labels.contains(&expected), "missing {expected}");
        }
        assert!(view.edges.iter().all(|e| e.source == 0));
        assert_eq!(view.focus, person.key());
    }

    #[test]
    fn equal_literals_share_a_node() {
        let (sub, person) = mineiro_graph();
        let view = subject_view(&sub, &person);
        // focus + 8 distinct objects
        assert_eq!(view.nodes.len(), 9);
    }

    #[test]
    fn dot_output_escapes_quotes() {
        let (sub, person) = mineiro_graph();
        let dot = render_dot(&subject_view(&sub, &person));
        assert!(dot.starts_with("digraph deputado {"));
        assert!(dot.contains(r#"label="Fernando \"Mineiro\"""#));
        assert!(dot.contains(r#"[label="memberOf"]"#));
        assert!(dot.contains("fillcolor"));
    }

    #[test]
    fn json_output_lists_nodes_and_edges() {
        let (sub, person) = mineiro_graph();
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&subject_view(&sub, &person)).expect("json"))
                .expect("parse");
        assert_eq!(json["edges"].as_array().map(Vec::len), Some(8));
        assert_eq!(json["nodes"][0]["kind"], "iri");
    }

    #[test]
    fn format_parsing() {
        assert_eq!(VizFormat::parse("DOT").expect("dot"), VizFormat::Dot);
        assert_eq!(VizFormat::parse("json").expect("json").extension(), "json");
        assert!(VizFormat::parse("html").is_err());
    }
}
