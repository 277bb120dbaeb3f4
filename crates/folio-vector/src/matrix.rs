use std::cmp::Ordering;

use tracing::debug;

use folio_core::error::{Error, Result};
use folio_core::types::{SearchHit, SourceKind};

/// Row-major `(rows, dim)` matrix of unit-length embeddings. Row `i` is the
/// chunk at row `i` of the corpus index, so cosine similarity is a dot product.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dim: usize,
    data: Vec<f32>,
}

/// Scale `v` to unit L2 norm. A zero vector stays zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

impl VectorIndex {
    /// Build from one embedding per chunk, normalizing every row.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).ok_or(Error::EmptyCorpus)?;
        if dim == 0 {
            return Err(Error::Embedding("embeddings have zero dimensions".into()));
        }
        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(Error::Embedding(format!("row {i} has {} dimensions, expected {dim}", row.len())));
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(Error::Embedding(format!("row {i} contains non-finite values")));
            }
            l2_normalize(&mut row);
            data.extend_from_slice(&row);
        }
        Ok(Self { dim, data })
    }

    /// Wrap an already normalized flat matrix (as read back from disk).
    pub fn from_raw(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(Error::IndexCorrupt(format!("{} values do not form rows of {dim}", data.len())));
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[cfg(test)]
    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub(crate) fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Top-`k` rows by dot product with `query` (normalized here), best first,
    /// ties in ascending row order. No threshold is applied.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::Embedding(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dim
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let mut q = query.to_vec();
        l2_normalize(&mut q);

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim)
            .map(|row| row.iter().zip(&q).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering { b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)) };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);
        debug!(rows = self.len(), hits = scored.len(), "vector search");
        Ok(scored
            .into_iter()
            .map(|(row, score)| SearchHit { row, score, source: SourceKind::Vector })
            .collect())
    }
}
