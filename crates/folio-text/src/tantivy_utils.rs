use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::TextAnalyzer;
use tantivy::Index;

use folio_core::error::{Error, Result};

use crate::tokenizer::PlayTokenizer;

pub const TOKENIZER_NAME: &str = "folio_play";

/// Writer heap for a single indexing thread.
pub const WRITER_HEAP_BYTES: usize = 50_000_000;

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field("row", STORED);
	schema_builder.add_text_field("chunk_id", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER_NAME).set_index_option(IndexRecordOption::WithFreqs);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing);
	schema_builder.add_text_field("text", text_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(PlayTokenizer).build();
	index.tokenizers().register(TOKENIZER_NAME, tokenizer);
}

#[derive(Debug, Clone, Copy)]
pub struct LexicalFields {
	pub row: Field,
	pub chunk_id: Field,
	pub text: Field,
}

impl LexicalFields {
	pub fn from_schema(schema: &Schema) -> Result<Self> {
		Ok(Self {
			row: schema.get_field("row").map_err(lexical_err)?,
			chunk_id: schema.get_field("chunk_id").map_err(lexical_err)?,
			text: schema.get_field("text").map_err(lexical_err)?,
		})
	}
}

pub fn lexical_err(e: tantivy::TantivyError) -> Error {
	Error::Lexical(e.to_string())
}
