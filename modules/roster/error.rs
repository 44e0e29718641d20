use std::path::PathBuf;

use thiserror::Error;

/// Roster and supplementary loading failures.
#[derive(Debug, Error)]
pub enum RosterError {
    /// File could not be read.
    #[error("reading {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Malformed CSV.
    #[error("parsing roster {path}: {source}")]
    Csv {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
    /// Malformed supplementary JSON.
    #[error("parsing supplementary {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// No row contains the header marker.
    #[error("no header row containing {marker:?} in {path}")]
    HeaderNotFound {
        /// File path.
        path: PathBuf,
        /// Marker searched for.
        marker: String,
    },
    /// A mapped column is absent from the header row.
    #[error("column {column:?} missing from header of {path}")]
    MissingColumn {
        /// File path.
        path: PathBuf,
        /// Source header name.
        column: String,
    },
}
