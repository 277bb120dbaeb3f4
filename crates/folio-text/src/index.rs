use std::path::Path;
use std::time::Instant;

use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher};
use tracing::info;

use folio_core::error::{Error, Result};
use folio_core::types::Chunk;

use crate::tantivy_utils::{build_schema, lexical_err, register_tokenizer, LexicalFields, WRITER_HEAP_BYTES};

/// BM25 index over chunk texts. Document `row` fields mirror the row order of
/// the chunk list the index was built from.
pub struct LexicalIndex {
	pub(crate) searcher: Searcher,
	pub(crate) fields: LexicalFields,
	// Held so the searcher's segments stay pinned for the life of the index.
	_reader: IndexReader,
}

impl LexicalIndex {
	/// Build an in-memory index (tests, throwaway corpora).
	pub fn create_in_ram(chunks: &[Chunk]) -> Result<Self> {
		if chunks.is_empty() { return Err(Error::EmptyCorpus); }
		let index = Index::create_in_ram(build_schema());
		Self::populate(index, chunks)
	}

	/// Build a fresh index inside `index_dir`, which must not already hold one.
	pub fn create_in_dir(index_dir: &Path, chunks: &[Chunk]) -> Result<Self> {
		if chunks.is_empty() { return Err(Error::EmptyCorpus); }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema()).map_err(lexical_err)?;
		Self::populate(index, chunks)
	}

	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir).map_err(lexical_err)?;
		Self::from_index(index)
	}

	fn populate(index: Index, chunks: &[Chunk]) -> Result<Self> {
		let start = Instant::now();
		register_tokenizer(&index);
		let fields = LexicalFields::from_schema(&index.schema())?;
		// One thread keeps segment layout, and with it tie order, reproducible.
		let mut index_writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES).map_err(lexical_err)?;
		for (row, chunk) in chunks.iter().enumerate() {
			let doc = doc!(
				fields.row => row as u64,
				fields.chunk_id => chunk.chunk_id.clone(),
				fields.text => chunk.text.clone(),
			);
			index_writer.add_document(doc).map_err(lexical_err)?;
		}
		index_writer.commit().map_err(lexical_err)?;
		index_writer.wait_merging_threads().map_err(lexical_err)?;
		info!(docs = chunks.len(), elapsed_ms = start.elapsed().as_millis() as u64, "built lexical index");
		Self::from_index(index)
	}

	fn from_index(index: Index) -> Result<Self> {
		register_tokenizer(&index);
		let fields = LexicalFields::from_schema(&index.schema())?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(lexical_err)?;
		let searcher = reader.searcher();
		Ok(Self { searcher, fields, _reader: reader })
	}

	/// Number of indexed chunks.
	pub fn len(&self) -> usize {
		self.searcher.num_docs() as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
