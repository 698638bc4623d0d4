//! Error types for search operations.

use tantivy::TantivyError;
use thiserror::Error;

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Error types for search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Index initialization failed
    #[error("failed to initialize search index: {0}")]
    IndexInitialization(String),

    /// Query parsing failed
    #[error("invalid search query: {0}")]
    QueryParsing(String),

    /// Search execution failed
    #[error("search execution failed: {0}")]
    SearchExecution(String),

    /// Indexing operation failed
    #[error("indexing failed for document {doc_id}: {message}")]
    IndexingFailed { doc_id: String, message: String },

    /// Document not found
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Tantivy error wrapper
    #[error("tantivy error: {0}")]
    Tantivy(#[from] TantivyError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for SearchError {
    fn from(error: anyhow::Error) -> Self {
        SearchError::Other(error.to_string())
    }
}
