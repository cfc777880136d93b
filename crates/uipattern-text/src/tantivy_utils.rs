use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::Index;

use crate::tokenizer::{PatternTokenizer, TOKENIZER_NAME};

pub const ID_FIELD: &str = "id";
pub const TEXT_FIELD: &str = "text";

/// `id` is stored verbatim; `text` holds the weighted document and is indexed
/// with term frequencies (BM25 needs no positions).
pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER_NAME)
        .set_index_option(IndexRecordOption::WithFreqs);
    schema_builder.add_text_field(TEXT_FIELD, TextOptions::default().set_indexing_options(text_indexing));
    schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
    let analyzer = TextAnalyzer::builder(PatternTokenizer::default()).build();
    index.tokenizers().register(TOKENIZER_NAME, analyzer);
}
