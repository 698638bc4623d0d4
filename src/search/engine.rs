//! Core Tantivy search engine.
//!
//! Manages the index directory, handles document upserts keyed by logical
//! URL, and owns the boosted query parser: `inurl` matches far outrank
//! `intitle`, which outranks `intext`.

use std::path::{Path, PathBuf};

use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, IndexReader, IndexSettings, TantivyDocument, Term, directory::MmapDirectory};
use tracing::warn;

use super::errors::{SearchError, SearchResult};
use super::schema::SearchSchema;

/// Index writer heap, per tantivy writer.
const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// One record as it travels into or out of the index.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    pub filetype: String,
    pub ext: String,
    pub timestamp: u64,
    pub server: String,
    pub share: String,
}

/// Main search engine managing Tantivy index operations.
#[derive(Clone)]
pub struct SearchEngine {
    index: Index,
    schema: SearchSchema,
    reader: IndexReader,
    query_parser: QueryParser,
    index_path: PathBuf,
}

impl SearchEngine {
    /// Open or create the index at `index_dir`.
    ///
    /// An existing index with a different field count is stale from an older
    /// schema version and is recreated from scratch.
    pub fn open(index_dir: &Path) -> SearchResult<Self> {
        std::fs::create_dir_all(index_dir)?;
        let schema = SearchSchema::create();

        let index = if index_dir.join("meta.json").exists() {
            let existing = Index::open_in_dir(index_dir)?;
            if existing.schema().num_fields() != schema.schema.num_fields() {
                warn!(
                    existing = existing.schema().num_fields(),
                    expected = schema.schema.num_fields(),
                    "schema mismatch detected - recreating index"
                );
                drop(existing);
                std::fs::remove_dir_all(index_dir)?;
                std::fs::create_dir_all(index_dir)?;
                let dir = MmapDirectory::open(index_dir)
                    .map_err(|e| SearchError::IndexInitialization(e.to_string()))?;
                Index::create(dir, schema.schema.clone(), IndexSettings::default())?
            } else {
                existing
            }
        } else {
            let dir = MmapDirectory::open(index_dir)
                .map_err(|e| SearchError::IndexInitialization(e.to_string()))?;
            Index::create(dir, schema.schema.clone(), IndexSettings::default())?
        };

        SearchSchema::register_tokenizers(index.tokenizers());

        let reader = index.reader()?;

        let mut query_parser = QueryParser::for_index(
            &index,
            vec![schema.inurl, schema.intitle, schema.intext],
        );
        // Relevance contract: inurl >> intitle >> intext.
        query_parser.set_field_boost(schema.inurl, 10.0);
        query_parser.set_field_boost(schema.intitle, 4.0);
        query_parser.set_field_boost(schema.intext, 1.0);

        Ok(Self {
            index,
            schema,
            reader,
            query_parser,
            index_path: index_dir.to_path_buf(),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    #[must_use]
    pub fn query_parser(&self) -> &QueryParser {
        &self.query_parser
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Upsert a batch of records in one commit. The logical URL is the
    /// document identity: an existing document with the same URL is
    /// replaced.
    pub fn upsert_batch(&self, records: &[DocRecord]) -> SearchResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut writer = self.index.writer::<TantivyDocument>(WRITER_MEMORY_BYTES)?;

        for record in records {
            writer.delete_term(Term::from_field_text(self.schema.id, &record.url));

            let mut doc = TantivyDocument::default();
            doc.add_text(self.schema.id, &record.url);
            doc.add_text(self.schema.inurl, &record.url);
            doc.add_text(self.schema.intitle, &record.title);
            doc.add_text(self.schema.intext, &record.content);
            doc.add_text(self.schema.filetype, &record.filetype);
            doc.add_text(self.schema.ext, &record.ext);
            doc.add_u64(self.schema.timestamp, record.timestamp);
            doc.add_text(self.schema.server, &record.server);
            doc.add_text(self.schema.share, &record.share);
            writer.add_document(doc).map_err(|e| {
                SearchError::IndexingFailed {
                    doc_id: record.url.clone(),
                    message: e.to_string(),
                }
            })?;
        }

        writer.commit()?;
        self.reader.reload()?;
        Ok(records.len())
    }

    /// Fetch one stored document by its logical URL.
    pub fn doc_by_url(&self, url: &str) -> SearchResult<DocRecord> {
        use tantivy::collector::TopDocs;
        use tantivy::query::TermQuery;
        use tantivy::schema::IndexRecordOption;

        let searcher = self.reader.searcher();
        let query = TermQuery::new(
            Term::from_field_text(self.schema.id, url),
            IndexRecordOption::Basic,
        );
        let hits = searcher.search(&query, &TopDocs::with_limit(1))?;
        let (_, address) = hits
            .first()
            .ok_or_else(|| SearchError::DocumentNotFound(url.to_string()))?;
        let doc: TantivyDocument = searcher.doc(*address)?;
        Ok(self.record_from_doc(&doc))
    }

    pub(crate) fn record_from_doc(&self, doc: &TantivyDocument) -> DocRecord {
        let text = |field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        DocRecord {
            url: text(self.schema.inurl),
            title: text(self.schema.intitle),
            content: text(self.schema.intext),
            filetype: text(self.schema.filetype),
            ext: text(self.schema.ext),
            timestamp: doc
                .get_first(self.schema.timestamp)
                .and_then(|v| v.as_u64())
                .unwrap_or(0),
            server: text(self.schema.server),
            share: text(self.schema.share),
        }
    }

    /// Total number of documents across segments.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
