//! Domain error types for the diff state engine.
//!
//! Only transport failures are escalated as errors. Missing files, lines
//! and match-line boundaries are expected while batches are still arriving,
//! so write paths treat them as no-ops instead of returning one of these.

use thiserror::Error;

/// Errors surfaced by the diff state engine.
#[derive(Debug, Error)]
pub enum DiffsError {
    #[error("Failed to fetch diff batch at page {page}: {source}")]
    PageFetch {
        page: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to fetch context lines for file {file_hash}: {source}")]
    LinesFetch {
        file_hash: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to fetch diff file from {url}: {source}")]
    FileFetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Diff file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid location fragment: {0}")]
    InvalidFragment(String),
}

impl DiffsError {
    /// True when the error came from the transport collaborator.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            DiffsError::PageFetch { .. } | DiffsError::LinesFetch { .. } | DiffsError::FileFetch { .. }
        )
    }
}
