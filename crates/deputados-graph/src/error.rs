use crate::record::MalformedRecord;
use std::path::PathBuf;

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A required input artifact is absent. Raised before any processing.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An IRI that cannot be written between `<` and `>` in N-Triples.
    #[error("invalid IRI for N-Triples output: <{iri}>")]
    InvalidIri { iri: String },

    #[error("failed to write N-Triples: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse N-Triples: {message}")]
    Parse { message: String },

    #[error("malformed record: {0}")]
    MalformedRecord(#[from] MalformedRecord),
}

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
