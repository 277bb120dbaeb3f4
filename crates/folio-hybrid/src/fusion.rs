//! Score fusion over the union of lexical and vector candidates.

use std::collections::{BTreeMap, HashMap};

use folio_core::types::{ScoreBreakdown, SearchHit, SourceKind};

/// Guard for a zero score range during min-max normalization.
pub const NORM_EPS: f32 = 1e-9;

/// Min-max scale `scores` into `[0, 1]` relative to each other.
///
/// All-equal inputs map to zero.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(lo) = scores.iter().copied().reduce(f32::min) else { return Vec::new() };
    let hi = scores.iter().copied().fold(lo, f32::max);
    let range = (hi - lo).max(NORM_EPS);
    scores.iter().map(|s| (s - lo) / range).collect()
}

/// A candidate row with its fused score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub row: usize,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

/// Raw per-signal scores for one query, as parallel arrays over the
/// candidate rows in ascending row order. A row missing from a signal's pool
/// scores 0 for that signal.
#[derive(Debug, Default, Clone)]
pub struct CandidatePool {
    rows: Vec<usize>,
    lexical: Vec<f32>,
    vector: Vec<f32>,
}

impl CandidatePool {
    /// Union both signals' hits, keeping only rows accepted by `keep`.
    pub fn collect<'a>(hits: impl IntoIterator<Item = &'a SearchHit>, keep: impl Fn(usize) -> bool) -> Self {
        let mut by_row: BTreeMap<usize, (f32, f32)> = BTreeMap::new();
        for hit in hits {
            if !keep(hit.row) {
                continue;
            }
            let entry = by_row.entry(hit.row).or_insert((0.0, 0.0));
            match hit.source {
                SourceKind::Lexical => entry.0 = hit.score,
                SourceKind::Vector => entry.1 = hit.score,
            }
        }
        let mut pool = Self::default();
        for (row, (lexical, vector)) in by_row {
            pool.rows.push(row);
            pool.lexical.push(lexical);
            pool.vector.push(vector);
        }
        pool
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Candidates the lexical search contributed.
    pub fn lexical_hits(&self) -> usize {
        self.lexical.iter().filter(|&&s| s > 0.0).count()
    }

    /// Weighted sum of the per-signal normalized scores, in row order.
    pub fn fuse(&self, lexical_weight: f32, vector_weight: f32) -> Vec<Scored> {
        let lexical_norm = min_max_normalize(&self.lexical);
        let vector_norm = min_max_normalize(&self.vector);
        (0..self.rows.len())
            .map(|i| {
                let breakdown = ScoreBreakdown {
                    lexical_raw: self.lexical[i],
                    vector_raw: self.vector[i],
                    lexical_norm: lexical_norm[i],
                    vector_norm: vector_norm[i],
                    phrase_boost: 0.0,
                };
                Scored { row: self.rows[i], score: lexical_weight * lexical_norm[i] + vector_weight * vector_norm[i], breakdown }
            })
            .collect()
    }
}

/// Add `boost` to every row in `matched`; rows that were not candidates join
/// with no signal contribution.
pub fn apply_phrase_boost(scored: &mut Vec<Scored>, matched: &[usize], boost: f32) {
    let positions: HashMap<usize, usize> = scored.iter().enumerate().map(|(i, s)| (s.row, i)).collect();
    for &row in matched {
        match positions.get(&row) {
            Some(&i) => {
                scored[i].score += boost;
                scored[i].breakdown.phrase_boost = boost;
            }
            None => scored.push(Scored {
                row,
                score: boost,
                breakdown: ScoreBreakdown { phrase_boost: boost, ..ScoreBreakdown::default() },
            }),
        }
    }
}

/// Drop rows that surfaced only through the vector pool at its floor: no
/// lexical hit, no phrase boost and a fused score of zero.
pub fn drop_unsupported(scored: &mut Vec<Scored>) {
    scored.retain(|s| s.score > 0.0 || s.breakdown.lexical_raw > 0.0 || s.breakdown.phrase_boost > 0.0);
}

/// Best first; ties by ascending row.
pub fn rank(scored: &mut [Scored]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
}
