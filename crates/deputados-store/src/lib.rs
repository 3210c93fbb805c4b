//! Graph store adapter.
//!
//! ```text
//! RdfGraph ──bulk_load──► GraphStore ──query(text)──► QueryTable
//! ```
//!
//! The store is embedded ([`OxigraphStore`]): a directory on disk, or memory
//! when no path is configured. Loads are additive and run in one transaction;
//! queries are read-only SPARQL and always come back as a table.

pub mod oxigraph_store;
pub mod queries;

pub use deputados_graph::filter_subgraph;
pub use oxigraph_store::OxigraphStore;
pub use queries::CannedQuery;

use deputados_graph::RdfGraph;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store directory; `None` keeps everything in memory.
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }

    pub fn open(&self) -> Result<OxigraphStore, StoreError> {
        match &self.path {
            Some(path) => OxigraphStore::open(path),
            None => OxigraphStore::in_memory(),
        }
    }

    /// Like [`StoreConfig::open`], but a configured directory must already
    /// exist. The in-memory configuration always starts empty.
    pub fn open_existing(&self) -> Result<OxigraphStore, StoreError> {
        match &self.path {
            Some(path) => OxigraphStore::open_existing(path),
            None => OxigraphStore::in_memory(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("graph store unavailable ({location}): {message}")]
    Unavailable { location: String, message: String },

    #[error("load failed: {0}")]
    Load(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("term cannot be stored: {0}")]
    InvalidTerm(String),
}

impl StoreError {
    /// Store-side failures may clear up; bad input will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Load(_) | Self::Query(_)
        )
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub already_present: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.inserted + self.already_present
    }
}

/// Query answer: one column per result variable, `None` for unbound cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Non-empty cells of one column, in row order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        let Some(idx) = self.column(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|c| c.as_deref()))
            .collect()
    }

    /// Rows as JSON objects keyed by column; unbound cells become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, cell)| {
                        let v = cell
                            .as_ref()
                            .map(|s| serde_json::Value::String(s.clone()))
                            .unwrap_or(serde_json::Value::Null);
                        (col.clone(), v)
                    })
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    /// Aligned plain-text table.
    pub fn render_text(&self) -> String {
        let cells: Vec<Vec<&str>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|c| c.as_deref().unwrap_or("")).collect())
            .collect();
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (w, c) in widths.iter_mut().zip(row) {
                *w = (*w).max(c.chars().count());
            }
        }
        let line = |row: Vec<&str>| -> String {
            row.iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}", w = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(self.columns.iter().map(String::as_str).collect());
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.push('\n');
        for row in cells {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

// ============================================================================
// Store trait
// ============================================================================

pub trait GraphStore {
    /// Add every triple in one transaction. Nothing is removed.
    fn bulk_load(&self, graph: &RdfGraph) -> Result<LoadReport, StoreError>;

    /// Run a read-only query.
    fn query(&self, text: &str) -> Result<QueryTable, StoreError>;

    /// Number of stored triples.
    fn triple_count(&self) -> Result<usize, StoreError>;
}
