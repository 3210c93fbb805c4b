//! Extraction side of the pipeline.
//!
//! - [`source`]: paginated fetch from the open-data API, reporting whether
//!   the listing was read to the end.
//! - [`table`]: the tabular store (CSV on disk) and row validation into
//!   [`deputados_graph::LegislatorRecord`].

pub mod source;
pub mod table;

pub use source::{
    fetch_all, ApiConfig, CamaraApiSource, FetchCompletion, FetchOutcome, RecordSource,
    SourceError,
};
pub use table::{RecordTable, TableError, ValidatedRows};
