//! Full-text search over completed crawl output.
//!
//! The bridge reads the CSV index into a tantivy index; the query layer
//! serves ranked search with highlights, prefix autocomplete, and direct
//! document lookup for the read-only HTTP façade.

pub mod bridge;
pub mod engine;
pub mod errors;
pub mod query;
pub mod schema;

pub use bridge::{BridgeReport, DEFAULT_BATCH_SIZE, index_csv};
pub use engine::{DocRecord, SearchEngine};
pub use errors::{SearchError, SearchResult};
pub use query::{SearchHit, SearchResults, search, suggest};
pub use schema::{SCHEMA_VERSION, SearchSchema};
