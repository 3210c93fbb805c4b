//! In-memory RDF graph: terms, triples and a set-semantics graph.
//!
//! The graph is a `BTreeSet`, so iteration order is the canonical triple
//! order and duplicate insertions collapse.

use crate::ontology::{Predicate, RDF_LANG_STRING_IRI, XSD_INTEGER_IRI, XSD_STRING_IRI};
use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

/// Subject-position term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RdfNode {
    Iri(String),
    BlankNode(String),
}

impl RdfNode {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            Self::BlankNode(_) => None,
        }
    }

    /// The IRI or blank node label, without N-Triples decoration.
    pub fn key(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::BlankNode(bn) => bn,
        }
    }
}

impl fmt::Display for RdfNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => write!(f, "<{iri}>"),
            Self::BlankNode(bn) => write!(f, "_:{bn}"),
        }
    }
}

/// A literal value. `datatype` is `None` for simple strings (`xsd:string`)
/// and for language-tagged strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RdfLiteral {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl RdfLiteral {
    pub fn string(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::typed(value.to_string(), XSD_INTEGER_IRI)
    }

    pub fn unsigned(value: u64) -> Self {
        Self::typed(value.to_string(), XSD_INTEGER_IRI)
    }

    /// Typed literal; `xsd:string` is normalized to a simple literal.
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        if datatype == XSD_STRING_IRI || datatype == RDF_LANG_STRING_IRI {
            return Self::string(lexical);
        }
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into().to_ascii_lowercase()),
        }
    }

    pub fn is_integer(&self) -> bool {
        self.datatype.as_deref() == Some(XSD_INTEGER_IRI)
    }

    pub fn as_i64(&self) -> Option<i64> {
        if self.is_integer() {
            self.lexical.trim().parse().ok()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RdfObject {
    Node(RdfNode),
    Literal(RdfLiteral),
}

impl RdfObject {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Node(RdfNode::Iri(iri.into()))
    }

    pub fn as_node(&self) -> Option<&RdfNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&RdfLiteral> {
        match self {
            Self::Node(_) => None,
            Self::Literal(lit) => Some(lit),
        }
    }

    /// IRI / blank node label, or the literal's lexical form.
    pub fn value(&self) -> &str {
        match self {
            Self::Node(node) => node.key(),
            Self::Literal(lit) => &lit.lexical,
        }
    }
}

impl From<RdfNode> for RdfObject {
    fn from(node: RdfNode) -> Self {
        Self::Node(node)
    }
}

impl From<RdfLiteral> for RdfObject {
    fn from(lit: RdfLiteral) -> Self {
        Self::Literal(lit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RdfTriple {
    pub subject: RdfNode,
    pub predicate: String,
    pub object: RdfObject,
}

impl RdfTriple {
    pub fn new(subject: RdfNode, predicate: impl Into<String>, object: impl Into<RdfObject>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Triple over one of the ontology's predicates.
    pub fn with(subject: &RdfNode, predicate: Predicate, object: impl Into<RdfObject>) -> Self {
        Self::new(subject.clone(), predicate.iri(), object)
    }
}

/// A set of triples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdfGraph {
    triples: BTreeSet<RdfTriple>,
}

impl RdfGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the triple was not already present.
    pub fn insert(&mut self, triple: RdfTriple) -> bool {
        self.triples.insert(triple)
    }

    pub fn contains(&self, triple: &RdfTriple) -> bool {
        self.triples.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, RdfTriple> {
        self.triples.iter()
    }

    /// Add every triple of `other` (set union).
    pub fn merge(&mut self, other: RdfGraph) {
        self.triples.extend(other.triples);
    }

    /// Distinct subjects, in canonical order.
    pub fn subjects(&self) -> BTreeSet<&RdfNode> {
        self.triples.iter().map(|t| &t.subject).collect()
    }

    /// Triples of `subject`, in canonical order.
    pub fn triples_of<'a>(&'a self, subject: &'a RdfNode) -> impl Iterator<Item = &'a RdfTriple> + 'a {
        self.triples.iter().filter(move |t| &t.subject == subject)
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(
        &'a self,
        subject: &'a RdfNode,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a RdfObject> + 'a {
        self.triples_of(subject)
            .filter(move |t| t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// Subjects typed with `class_iri`.
    pub fn instances_of<'a>(&'a self, class_iri: &'a str) -> impl Iterator<Item = &'a RdfNode> + 'a {
        self.triples
            .iter()
            .filter(move |t| {
                t.predicate == Predicate::Type.iri()
                    && t.object.as_node().and_then(RdfNode::as_iri) == Some(class_iri)
            })
            .map(|t| &t.subject)
    }
}

impl FromIterator<RdfTriple> for RdfGraph {
    fn from_iter<I: IntoIterator<Item = RdfTriple>>(iter: I) -> Self {
        Self {
            triples: iter.into_iter().collect(),
        }
    }
}

impl Extend<RdfTriple> for RdfGraph {
    fn extend<I: IntoIterator<Item = RdfTriple>>(&mut self, iter: I) {
        self.triples.extend(iter);
    }
}

impl IntoIterator for RdfGraph {
    type Item = RdfTriple;
    type IntoIter = btree_set::IntoIter<RdfTriple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.into_iter()
    }
}

impl<'a> IntoIterator for &'a RdfGraph {
    type Item = &'a RdfTriple;
    type IntoIter = btree_set::Iter<'a, RdfTriple>;

    fn into_iter(self) -> Self::IntoIter {
        self.triples.iter()
    }
}

/// The triples of `graph` whose subject is exactly `subject`.
///
/// Used for focused per-legislator views; the result is empty when `subject`
/// is not a subject of any triple.
pub fn filter_subgraph(graph: &RdfGraph, subject: &RdfNode) -> RdfGraph {
    graph.triples_of(subject).cloned().collect()
}
