use figment::providers::{Format, Serialized, Toml};
use figment::Figment;

use folio_cli::{exit_status, App};
use folio_core::config::{Config, Settings};
use folio_core::corpus::write_chunks;
use folio_core::types::Chunk;

fn chunk(id: &str, work: &str, act: u32, scene: u32, speaker: &str, text: &str) -> Chunk {
    Chunk {
        chunk_id: id.into(),
        work: work.into(),
        act,
        scene,
        speaker: Some(speaker.into()),
        line_start: None,
        line_end: None,
        text: text.into(),
        source_path: String::new(),
    }
}

fn app_in(dir: &std::path::Path) -> App {
    let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(
        r#"
        [embedding]
        backend = "hash"
        dim = 96
        batch_size = 2
        "#,
    ));
    App::from_config(&Config::from_figment(figment, dir)).unwrap()
}

#[test]
fn index_then_query_from_configured_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_in(tmp.path());
    assert_eq!(app.paths.chunks_path, tmp.path().join("data/chunks.jsonl"));
    std::fs::create_dir_all(tmp.path().join("data")).unwrap();
    write_chunks(
        &app.paths.chunks_path,
        &[
            chunk("ROMEO_2_2_0001", "Romeo and Juliet", 2, 2, "JULIET", "O Romeo, Romeo, wherefore art thou Romeo?"),
            chunk("ROMEO_2_2_0002", "Romeo and Juliet", 2, 2, "JULIET", "What's in a name? That which we call a rose"),
            chunk("LEAR_1_1_0001", "King Lear", 1, 1, "CORDELIA", "Nothing, my lord."),
        ],
    )
    .unwrap();

    let index = app.build_index(false).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(app.store().read_manifest().unwrap().embedder_id, "hash:xxh64:d96");

    let ctx = app.open_context().unwrap();
    let sources = ctx.retrieve("wherefore art thou Romeo", 8, None).unwrap();
    assert_eq!(sources[0].chunk_id, "ROMEO_2_2_0001");
    assert_eq!(sources[0].to_string(), "[S1] Romeo and Juliet 2.2 — JULIET");
}

#[test]
fn missing_index_exits_with_rebuild_status() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app_in(tmp.path());
    let err = app.open_context().err().expect("no index yet");
    assert_eq!(exit_status(&err), 2);
    assert!(format!("{err:#}").contains("folio index"));

    let err = app.build_index(false).err().expect("no chunk file");
    assert_eq!(exit_status(&err), 1);
}
