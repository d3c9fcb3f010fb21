use std::path::PathBuf;

use thiserror::Error;

/// Failures that prevent a record set from being obtained at all.
///
/// Field-level problems never show up here; they are folded into the
/// `Unknown` sentinel during normalization.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unable to read source {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("source unavailable: {0}")]
    Unavailable(String),
}
