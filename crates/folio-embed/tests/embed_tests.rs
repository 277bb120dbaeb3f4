use folio_core::config::{EmbeddingBackend, EmbeddingSettings};
use folio_core::traits::Embedder;
use folio_embed::{get_default_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_words_score_higher_than_disjoint_text() {
    let embedder = HashEmbedder::new(256);
    let query = embedder.embed("the witches on the heath").unwrap();
    let near = embedder.embed("Three witches meet upon the heath").unwrap();
    let far = embedder.embed("Romeo climbs into the orchard").unwrap();
    assert!(cosine(&query, &near) > cosine(&query, &far));
}

#[test]
fn empty_text_embeds_to_zero_vector() {
    let v = HashEmbedder::new(16).embed("  ,; ").unwrap();
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn hash_backend_needs_no_model() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, dim: 64, ..EmbeddingSettings::default() };
    let embedder = get_default_embedder(&settings, None).expect("embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.embedder_id(), "hash:xxh64:d64");
}
