//! Query execution: ranked search with highlighted snippets, and prefix
//! autocomplete over the indexed title and URL terms.

use std::collections::BTreeSet;

use tantivy::TantivyDocument;
use tantivy::collector::{Count, TopDocs};
use tantivy::snippet::SnippetGenerator;

use super::engine::SearchEngine;
use super::errors::{SearchError, SearchResult};

/// One ranked hit.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub filetype: String,
    pub server: String,
    pub share: String,
    pub score: f32,
    /// Content excerpt with `<b>` highlight markers.
    pub excerpt: String,
}

/// A page of ranked results.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub query: String,
}

impl SearchResults {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset + self.hits.len() < self.total_count
    }

    /// Offset of the next page, advanced by the hits actually returned.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more() {
            Some(self.offset + self.hits.len())
        } else {
            None
        }
    }
}

/// Execute a ranked query with pagination and snippet highlights.
pub fn search(
    engine: &SearchEngine,
    query_str: &str,
    offset: usize,
    limit: usize,
) -> SearchResult<SearchResults> {
    let query_str = query_str.trim();
    if query_str.is_empty() {
        return Ok(SearchResults {
            hits: Vec::new(),
            total_count: 0,
            offset: 0,
            limit,
            query: String::new(),
        });
    }

    let query = engine
        .query_parser()
        .parse_query(query_str)
        .map_err(|e| SearchError::QueryParsing(e.to_string()))?;

    let searcher = engine.reader().searcher();
    let total_count = searcher
        .search(&query, &Count)
        .map_err(|e| SearchError::SearchExecution(e.to_string()))?;
    let top_docs = searcher
        .search(&query, &TopDocs::with_limit(limit).and_offset(offset))
        .map_err(|e| SearchError::SearchExecution(e.to_string()))?;

    let mut snippet_generator =
        SnippetGenerator::create(&searcher, &*query, engine.schema().intext)
            .map_err(|e| SearchError::SearchExecution(e.to_string()))?;
    snippet_generator.set_max_num_chars(200);

    let mut hits = Vec::with_capacity(top_docs.len());
    for (score, address) in top_docs {
        let doc: TantivyDocument = searcher
            .doc(address)
            .map_err(|e| SearchError::SearchExecution(e.to_string()))?;
        let record = engine.record_from_doc(&doc);
        let excerpt = snippet_generator.snippet_from_doc(&doc).to_html();
        hits.push(SearchHit {
            url: record.url,
            title: record.title,
            filetype: record.filetype,
            server: record.server,
            share: record.share,
            score,
            excerpt,
        });
    }

    Ok(SearchResults {
        hits,
        total_count,
        offset,
        limit,
        query: query_str.to_string(),
    })
}

/// Prefix autocomplete over the indexed `intitle` and `inurl` terms.
pub fn suggest(engine: &SearchEngine, prefix: &str, limit: usize) -> SearchResult<Vec<String>> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Ok(Vec::new());
    }

    let searcher = engine.reader().searcher();
    let mut suggestions: BTreeSet<String> = BTreeSet::new();

    'outer: for field in [engine.schema().intitle, engine.schema().inurl] {
        for segment_reader in searcher.segment_readers() {
            let inverted = segment_reader
                .inverted_index(field)
                .map_err(|e| SearchError::SearchExecution(e.to_string()))?;
            let dict = inverted.terms();
            let mut stream = dict
                .range()
                .ge(prefix.as_bytes())
                .into_stream()
                .map_err(|e| SearchError::SearchExecution(e.to_string()))?;
            while stream.advance() {
                let Ok(term) = std::str::from_utf8(stream.key()) else {
                    continue;
                };
                if !term.starts_with(&prefix) {
                    break;
                }
                suggestions.insert(term.to_string());
                if suggestions.len() >= limit {
                    break 'outer;
                }
            }
        }
    }

    Ok(suggestions.into_iter().collect())
}
