//! Tantivy schema for the document index.
//!
//! One document per CSV record. Dual text treatment: `inurl` keeps exact
//! tokens for path-shaped queries while `intitle` and `intext` go through
//! lowercasing, alphanumeric filtering and English stemming for natural
//! language search. Facet-like fields (`filetype`, `ext`, `server`,
//! `share`) are raw strings for filtering.

use tantivy::schema::{
    Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};
use tantivy::tokenizer::{
    AlphaNumOnlyFilter, Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer,
    TokenizerManager,
};

/// Tokenizer name constants.
const EXACT_MATCH_TOKENIZER: &str = "exact_match";
const CONTENT_SEARCH_TOKENIZER: &str = "content_search";

/// Schema version - increment when adding/removing/modifying fields.
/// Version history:
/// - v1: 8-field schema mirroring the CSV record.
pub const SCHEMA_VERSION: u32 = 1;

/// Search schema with one field per CSV record attribute.
#[derive(Debug, Clone)]
pub struct SearchSchema {
    pub schema: Schema,
    /// Raw untokenized URL: the document identity used for upserts and
    /// direct lookup. `inurl` is its searchable counterpart.
    pub id: Field,
    pub inurl: Field,
    pub intitle: Field,
    pub intext: Field,
    pub filetype: Field,
    pub ext: Field,
    pub timestamp: Field,
    pub server: Field,
    pub share: Field,
}

impl SearchSchema {
    /// Build the schema with production defaults.
    #[must_use]
    pub fn create() -> Self {
        let mut builder = Schema::builder();

        let id = builder.add_text_field("id", STRING | STORED);

        let exact_indexing = TextFieldIndexing::default()
            .set_tokenizer(EXACT_MATCH_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let inurl = builder.add_text_field(
            "inurl",
            TextOptions::default()
                .set_stored()
                .set_indexing_options(exact_indexing.clone()),
        );

        let content_indexing = TextFieldIndexing::default()
            .set_tokenizer(CONTENT_SEARCH_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        let intitle = builder.add_text_field(
            "intitle",
            TextOptions::default()
                .set_stored()
                .set_indexing_options(content_indexing.clone()),
        );
        let intext = builder.add_text_field(
            "intext",
            TextOptions::default()
                .set_stored()
                .set_indexing_options(content_indexing),
        );

        let filetype = builder.add_text_field("filetype", STRING | STORED);
        let ext = builder.add_text_field("ext", STRING | STORED);
        let timestamp = builder.add_u64_field("timestamp", INDEXED | STORED);
        let server = builder.add_text_field("server", STRING | STORED);
        let share = builder.add_text_field("share", STRING | STORED);

        let schema = builder.build();
        Self {
            schema,
            id,
            inurl,
            intitle,
            intext,
            filetype,
            ext,
            timestamp,
            server,
            share,
        }
    }

    /// Register the custom tokenizers with an index's tokenizer manager.
    pub fn register_tokenizers(manager: &TokenizerManager) {
        let exact = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .build();
        manager.register(EXACT_MATCH_TOKENIZER, exact);

        let content = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(AlphaNumOnlyFilter)
            .filter(Stemmer::new(Language::English))
            .build();
        manager.register(CONTENT_SEARCH_TOKENIZER, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_the_contract_fields() {
        let schema = SearchSchema::create();
        for name in [
            "id", "inurl", "intitle", "intext", "filetype", "ext", "timestamp", "server", "share",
        ] {
            assert!(
                schema.schema.get_field(name).is_ok(),
                "missing field {name}"
            );
        }
        assert_eq!(schema.schema.fields().count(), 9);
    }
}
