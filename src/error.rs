use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a whole import attempt. Nothing is written when one occurs.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the text encoding of {}. Try saving it as UTF-8.", .0.display())]
    Encoding(PathBuf),

    #[error("The CSV file has no header row or is empty.")]
    Empty,

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}
