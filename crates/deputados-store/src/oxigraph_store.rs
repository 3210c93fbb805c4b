//! Embedded store backed by oxigraph.

use crate::{GraphStore, LoadReport, QueryTable, StoreError};
use deputados_graph::{RdfGraph, RdfLiteral, RdfNode, RdfObject, RdfTriple};
use oxigraph::model::{BlankNode, GraphName, Literal, NamedNode, Quad, Subject, Term};
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::{StorageError, Store};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct OxigraphStore {
    store: Store,
    location: Option<PathBuf>,
}

impl OxigraphStore {
    /// Open (or create) a store directory.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = Store::open(path).map_err(|e| StoreError::Unavailable {
            location: path.display().to_string(),
            message: e.to_string(),
        })?;
        info!(path = %path.display(), "graph store opened");
        Ok(Self {
            store,
            location: Some(path.to_path_buf()),
        })
    }

    /// Open a store directory that a previous load created. A missing
    /// directory is [`StoreError::Unavailable`] and nothing is created.
    pub fn open_existing(path: &Path) -> Result<Self, StoreError> {
        if !path.is_dir() {
            return Err(StoreError::Unavailable {
                location: path.display().to_string(),
                message: "no graph store here; run `load` first".to_string(),
            });
        }
        Self::open(path)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let store = Store::new().map_err(|e| StoreError::Unavailable {
            location: "memory".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            store,
            location: None,
        })
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Every stored triple whose subject is `subject`.
    pub fn subject_triples(&self, subject: &RdfNode) -> Result<RdfGraph, StoreError> {
        let subject = to_subject(subject)?;
        let mut graph = RdfGraph::new();
        for quad in self
            .store
            .quads_for_pattern(Some(subject.as_ref()), None, None, None)
        {
            let quad = quad.map_err(|e| StoreError::Query(e.to_string()))?;
            graph.insert(RdfTriple::new(
                from_subject(&quad.subject),
                quad.predicate.as_str(),
                from_term(&quad.object),
            ));
        }
        Ok(graph)
    }
}

impl GraphStore for OxigraphStore {
    fn bulk_load(&self, graph: &RdfGraph) -> Result<LoadReport, StoreError> {
        let quads = graph.iter().map(to_quad).collect::<Result<Vec<_>, _>>()?;

        let inserted = self
            .store
            .transaction(|mut tx| {
                let mut inserted = 0usize;
                for quad in &quads {
                    if tx.insert(quad)? {
                        inserted += 1;
                    }
                }
                Ok::<_, StorageError>(inserted)
            })
            .map_err(|e| StoreError::Load(e.to_string()))?;

        let report = LoadReport {
            inserted,
            already_present: quads.len() - inserted,
        };
        info!(
            inserted = report.inserted,
            already_present = report.already_present,
            "graph loaded"
        );
        Ok(report)
    }

    fn query(&self, text: &str) -> Result<QueryTable, StoreError> {
        // Updates do not parse as queries, so this also keeps the call read-only.
        let query = Query::parse(text, None).map_err(|e| StoreError::InvalidQuery(e.to_string()))?;
        let results = self
            .store
            .query(query)
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let table = match results {
            QueryResults::Solutions(solutions) => {
                let variables = solutions.variables().to_vec();
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| StoreError::Query(e.to_string()))?;
                    rows.push(
                        variables
                            .iter()
                            .map(|v| solution.get(v.as_str()).map(term_text))
                            .collect(),
                    );
                }
                QueryTable {
                    columns: variables.iter().map(|v| v.as_str().to_string()).collect(),
                    rows,
                }
            }
            QueryResults::Boolean(answer) => QueryTable {
                columns: vec!["result".to_string()],
                rows: vec![vec![Some(answer.to_string())]],
            },
            QueryResults::Graph(triples) => {
                let mut rows = Vec::new();
                for triple in triples {
                    let triple = triple.map_err(|e| StoreError::Query(e.to_string()))?;
                    rows.push(vec![
                        Some(node_text(&from_subject(&triple.subject))),
                        Some(triple.predicate.as_str().to_string()),
                        Some(term_text(&triple.object)),
                    ]);
                }
                QueryTable {
                    columns: ["subject", "predicate", "object"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    rows,
                }
            }
        };
        debug!(rows = table.len(), columns = table.columns.len(), "query answered");
        Ok(table)
    }

    fn triple_count(&self) -> Result<usize, StoreError> {
        self.store.len().map_err(|e| StoreError::Query(e.to_string()))
    }
}

// ----------------------------------------------------------------------------
// Term conversion
// ----------------------------------------------------------------------------

fn named(iri: &str) -> Result<NamedNode, StoreError> {
    NamedNode::new(iri).map_err(|e| StoreError::InvalidTerm(format!("<{iri}>: {e}")))
}

fn to_subject(node: &RdfNode) -> Result<Subject, StoreError> {
    Ok(match node {
        RdfNode::Iri(iri) => Subject::NamedNode(named(iri)?),
        RdfNode::BlankNode(id) => Subject::BlankNode(
            BlankNode::new(id).map_err(|e| StoreError::InvalidTerm(format!("_:{id}: {e}")))?,
        ),
    })
}

fn to_term(object: &RdfObject) -> Result<Term, StoreError> {
    Ok(match object {
        RdfObject::Node(node) => match to_subject(node)? {
            Subject::NamedNode(n) => Term::NamedNode(n),
            Subject::BlankNode(b) => Term::BlankNode(b),
            #[allow(unreachable_patterns)]
            other => return Err(StoreError::InvalidTerm(other.to_string())),
        },
        RdfObject::Literal(lit) => Term::Literal(to_literal(lit)?),
    })
}

fn to_literal(lit: &RdfLiteral) -> Result<Literal, StoreError> {
    if let Some(lang) = &lit.language {
        return Literal::new_language_tagged_literal(&lit.lexical, lang)
            .map_err(|e| StoreError::InvalidTerm(format!("@{lang}: {e}")));
    }
    Ok(match &lit.datatype {
        Some(dt) => Literal::new_typed_literal(&lit.lexical, named(dt)?),
        None => Literal::new_simple_literal(&lit.lexical),
    })
}

fn to_quad(triple: &RdfTriple) -> Result<Quad, StoreError> {
    Ok(Quad::new(
        to_subject(&triple.subject)?,
        named(&triple.predicate)?,
        to_term(&triple.object)?,
        GraphName::DefaultGraph,
    ))
}

fn from_subject(subject: &Subject) -> RdfNode {
    match subject {
        Subject::NamedNode(n) => RdfNode::Iri(n.as_str().to_string()),
        Subject::BlankNode(b) => RdfNode::BlankNode(b.as_str().to_string()),
        #[allow(unreachable_patterns)]
        other => RdfNode::BlankNode(other.to_string()),
    }
}

fn from_term(term: &Term) -> RdfObject {
    match term {
        Term::NamedNode(n) => RdfObject::iri(n.as_str()),
        Term::BlankNode(b) => RdfObject::Node(RdfNode::BlankNode(b.as_str().to_string())),
        Term::Literal(l) => RdfObject::Literal(match l.language() {
            Some(lang) => RdfLiteral::lang(l.value(), lang),
            None => RdfLiteral::typed(l.value(), l.datatype().as_str()),
        }),
        #[allow(unreachable_patterns)]
        other => RdfObject::Literal(RdfLiteral::string(other.to_string())),
    }
}

fn node_text(node: &RdfNode) -> String {
    match node {
        RdfNode::Iri(iri) => iri.clone(),
        RdfNode::BlankNode(id) => format!("_:{id}"),
    }
}

/// Cell text: bare IRI, `_:label`, or the literal's lexical form.
fn term_text(term: &Term) -> String {
    match term {
        Term::NamedNode(n) => n.as_str().to_string(),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        Term::Literal(l) => l.value().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}
