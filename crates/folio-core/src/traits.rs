/// A text embedding function.
///
/// Implementations must be deterministic for a fixed model and return
/// L2-normalized vectors of length `dim()`.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the backend/model (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn embedder_id(&self) -> String;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}
