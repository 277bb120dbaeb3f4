use std::fs;
use tempfile::TempDir;

use folio_core::corpus::{load_chunks, parse_chunks, write_chunks};
use folio_core::Error;

const TWO_CHUNKS: &str = r#"{"chunk_id":"HAMLET_3_1_0000","play":"Hamlet","act":3,"scene":1,"speaker":"HAMLET","line_start":56,"line_end":60,"text":"To be, or not to be, that is the question:","source_path":"raw/hamlet.html"}

{"chunk_id":"MACBETH_1_1_0000","play":"Macbeth","act":1,"scene":1,"text":"Fair is foul, and foul is fair"}
"#;

#[test]
fn load_chunks_keeps_file_order_and_skips_blank_lines() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chunks.jsonl");
    fs::write(&path, TWO_CHUNKS).unwrap();

    let chunks = load_chunks(&path).expect("load");

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chunk_id, "HAMLET_3_1_0000");
    assert_eq!(chunks[1].work, "Macbeth");
    assert_eq!(chunks[1].speaker, None, "optional fields default to None");
    assert_eq!(chunks[1].line_start, None);
}

#[test]
fn missing_chunk_file_is_reported() {
    let tmp = TempDir::new().unwrap();
    let err = load_chunks(&tmp.path().join("nope.jsonl")).unwrap_err();
    assert!(matches!(err, Error::CorpusMissing(_)));
}

#[test]
fn malformed_line_reports_line_number() {
    let err = parse_chunks("{\"chunk_id\":\"A\"}\n").unwrap_err();
    match err {
        Error::Corpus(msg) => assert!(msg.starts_with("line 1"), "got {msg}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn write_then_load_preserves_records() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chunks.jsonl");
    let chunks = parse_chunks(TWO_CHUNKS).unwrap();
    write_chunks(&path, &chunks).unwrap();
    assert_eq!(load_chunks(&path).unwrap(), chunks);
}
