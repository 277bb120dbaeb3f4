use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{TantivyDocument, Term};
use tracing::debug;

use folio_core::error::{Error, Result};
use folio_core::types::{SearchHit, SourceKind};

use crate::index::LexicalIndex;
use crate::tantivy_utils::lexical_err;

impl LexicalIndex {
	/// Top-`k` rows by BM25 score for already tokenized query terms.
	///
	/// Every query token contributes, repeats included. Rows sharing no token
	/// with the query never appear. Ties keep ascending row order.
	pub fn search(&self, tokens: &[String], k: usize) -> Result<Vec<SearchHit>> {
		if tokens.is_empty() || k == 0 { return Ok(Vec::new()); }
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
			.iter()
			.map(|token| {
				let term = Term::from_field_text(self.fields.text, token);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let query = BooleanQuery::new(clauses);
		let top_docs = self.searcher.search(&query, &TopDocs::with_limit(k)).map_err(lexical_err)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			if score <= 0.0 { continue; }
			let doc: TantivyDocument = self.searcher.doc(addr).map_err(lexical_err)?;
			let row = doc
				.get_first(self.fields.row)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| Error::IndexCorrupt("lexical document without a row number".into()))?;
			hits.push(SearchHit { row: row as usize, score, source: SourceKind::Lexical });
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
		debug!(tokens = tokens.len(), hits = hits.len(), "lexical search");
		Ok(hits)
	}
}
