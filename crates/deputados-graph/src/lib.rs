//! Legislator records → RDF graph (the transformation core).
//!
//! This crate owns the parts of the pipeline with real data-modeling rules:
//!
//! - [`ontology`]: the fixed vocabulary (namespaces, predicates, classes).
//! - [`identity`]: deterministic entity keys, so repeated runs agree.
//! - [`record`]: the validated record produced at the table boundary.
//! - [`builder`]: record → triples, with shared party/state nodes.
//! - [`ntriples`]: the on-disk format (deterministic writer, Sophia reader).
//!
//! Nothing here does network or store I/O; file I/O is limited to the
//! N-Triples helpers.
//!
//! ```text
//! LegislatorRecord ──GraphBuilder──► RdfGraph ──ntriples::serialize──► .nt
//!                                       ▲                                │
//!                                       └──────ntriples::deserialize─────┘
//! ```

pub mod builder;
pub mod error;
pub mod identity;
pub mod model;
pub mod ntriples;
pub mod ontology;
pub mod record;

pub use builder::{BuildOutput, BuildReport, GraphBuilder};
pub use error::{GraphError, Result};
pub use identity::IdentityScheme;
pub use model::{filter_subgraph, RdfGraph, RdfLiteral, RdfNode, RdfObject, RdfTriple};
pub use ontology::{EntityKind, Predicate};
pub use record::{LegislatorRecord, MalformedReason, MalformedRecord};
