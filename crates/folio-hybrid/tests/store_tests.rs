use std::fs;

use folio_core::config::RetrievalConfig;
use folio_core::corpus::write_chunks;
use folio_core::error::Error;
use folio_core::traits::Embedder;
use folio_core::types::Chunk;
use folio_embed::HashEmbedder;
use folio_hybrid::store::FORMAT_VERSION;
use folio_hybrid::{IndexBuilder, IndexStore, RetrievalContext};

const DIM: usize = 128;

fn chunk(id: &str, work: &str, scene: u32, text: &str) -> Chunk {
    Chunk {
        chunk_id: id.into(),
        work: work.into(),
        act: 1,
        scene,
        speaker: Some("FIRST WITCH".into()),
        line_start: Some(1),
        line_end: Some(4),
        text: text.into(),
        source_path: "raw/macbeth.html".into(),
    }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk("MAC_1_1_0001", "Macbeth", 1, "When shall we three meet again in thunder, lightning, or in rain?"),
        chunk("MAC_1_1_0002", "Macbeth", 1, "When the hurlyburly's done, when the battle's lost and won."),
        chunk("MAC_1_1_0003", "Macbeth", 1, "Fair is foul, and foul is fair: Hover through the fog and filthy air."),
        chunk("MAC_1_3_0001", "Macbeth", 3, "So foul and fair a day I have not seen."),
    ]
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn embedder_id(&self) -> String {
        "broken".into()
    }
    fn dim(&self) -> usize {
        DIM
    }
    fn max_len(&self) -> usize {
        16
    }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model weights unavailable")
    }
}

#[test]
fn save_and_reload_reproduces_scores() {
    let tmp = tempfile::tempdir().unwrap();
    let chunks_path = tmp.path().join("chunks.jsonl");
    let store = IndexStore::new(tmp.path().join("index"));
    let chunks = corpus();
    write_chunks(&chunks_path, &chunks).unwrap();

    let embedder = HashEmbedder::new(DIM);
    let built = store.build(&chunks, &IndexBuilder::new(&embedder, 3)).unwrap();
    assert_eq!(built.len(), 4);
    assert_eq!(built.manifest.format_version, FORMAT_VERSION);
    assert_eq!(built.manifest.embedder_id, embedder.embedder_id());
    let fresh = RetrievalContext::new(built, chunks, Box::new(HashEmbedder::new(DIM)), RetrievalConfig::default()).unwrap();
    let before = fresh.retrieve("foul and fair", 8, None).unwrap();
    drop(fresh);

    let reopened =
        RetrievalContext::open(&store, &chunks_path, Box::new(HashEmbedder::new(DIM)), RetrievalConfig::default()).unwrap();
    let after = reopened.retrieve("foul and fair", 8, None).unwrap();
    assert_eq!(before, after);
    assert_eq!(after[0].meta.speaker.as_deref(), Some("FIRST WITCH"));
    assert_eq!(reopened.manifest().chunk_count, 4);
}

#[test]
fn missing_artifacts_are_reported_by_name() {
    let tmp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(tmp.path().join("index"));
    let embedder = HashEmbedder::new(DIM);
    store.build(&corpus(), &IndexBuilder::new(&embedder, 8)).unwrap();

    fs::remove_file(store.dir().join("vectors.bin")).unwrap();
    match store.load() {
        Err(err @ Error::IndexMissing { .. }) => {
            assert!(err.needs_rebuild());
            assert!(err.to_string().contains("vectors.bin"), "{err}");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("loaded an index without vectors"),
    }

    fs::remove_dir_all(store.dir().join("lexical")).unwrap();
    assert!(matches!(store.load(), Err(Error::IndexMissing { artifact, .. }) if artifact == "lexical/meta.json"));
}

#[test]
fn mismatched_artifact_lengths_are_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(tmp.path().join("index"));
    let embedder = HashEmbedder::new(DIM);
    store.build(&corpus(), &IndexBuilder::new(&embedder, 8)).unwrap();

    let metadata = store.dir().join("metadata.json");
    let mut metas: Vec<serde_json::Value> = serde_json::from_str(&fs::read_to_string(&metadata).unwrap()).unwrap();
    metas.pop();
    fs::write(&metadata, serde_json::to_string(&metas).unwrap()).unwrap();

    assert!(matches!(store.load(), Err(Error::IndexCorrupt(msg)) if msg.contains("metadata")));
}

#[test]
fn rebuild_replaces_the_previous_index() {
    let tmp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(tmp.path().join("index"));
    let embedder = HashEmbedder::new(DIM);
    let builder = IndexBuilder::new(&embedder, 2);
    store.build(&corpus(), &builder).unwrap();

    let smaller: Vec<Chunk> = corpus().into_iter().take(2).collect();
    let rebuilt = store.build(&smaller, &builder).unwrap();
    assert_eq!(rebuilt.len(), 2);
    assert_eq!(store.load().unwrap().manifest.chunk_count, 2);

    let leftovers: Vec<String> = fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["index".to_string()]);
}

#[test]
fn failed_build_keeps_the_published_index() {
    let tmp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(tmp.path().join("index"));
    let embedder = HashEmbedder::new(DIM);
    store.build(&corpus(), &IndexBuilder::new(&embedder, 8)).unwrap();

    let err = store.build(&corpus()[..1], &IndexBuilder::new(&BrokenEmbedder, 8)).err().expect("embedding fails");
    assert!(matches!(err, Error::Embedding(ref msg) if msg.contains("model weights unavailable")), "{err}");
    assert_eq!(store.load().unwrap().len(), 4);
    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1, "staging directory cleaned up");
}

#[test]
fn empty_corpus_publishes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let store = IndexStore::new(tmp.path().join("index"));
    let embedder = HashEmbedder::new(DIM);
    assert!(matches!(store.build(&[], &IndexBuilder::new(&embedder, 8)), Err(Error::EmptyCorpus)));
    assert!(!store.dir().exists());
}

#[test]
fn edited_chunk_file_requires_rebuild() {
    let tmp = tempfile::tempdir().unwrap();
    let chunks_path = tmp.path().join("chunks.jsonl");
    let store = IndexStore::new(tmp.path().join("index"));
    let mut chunks = corpus();
    let embedder = HashEmbedder::new(DIM);
    store.build(&chunks, &IndexBuilder::new(&embedder, 8)).unwrap();

    chunks[2].text = "Fair is foul.".into();
    write_chunks(&chunks_path, &chunks).unwrap();
    let err = RetrievalContext::open(&store, &chunks_path, Box::new(HashEmbedder::new(DIM)), RetrievalConfig::default())
        .err()
        .expect("stale index");
    assert!(err.needs_rebuild(), "{err}");
}
