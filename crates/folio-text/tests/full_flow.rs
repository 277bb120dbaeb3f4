use folio_core::types::Chunk;
use folio_text::{tokenize, LexicalIndex};

fn chunk(id: &str, text: &str) -> Chunk {
    Chunk {
        chunk_id: id.into(),
        work: "Hamlet".into(),
        act: 1,
        scene: 2,
        speaker: None,
        line_start: None,
        line_end: None,
        text: text.into(),
        source_path: "raw/hamlet.html".into(),
    }
}

#[test]
fn lexical_full_flow_on_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("lexical");
    let chunks = vec![
        chunk("H_1", "O, that this too too solid flesh would melt"),
        chunk("H_2", "Frailty, thy name is woman"),
        chunk("H_3", "'Tis an unweeded garden that grows to seed"),
    ];

    let built = LexicalIndex::create_in_dir(&dir, &chunks).expect("build");
    let fresh = built.search(&tokenize("flesh woman"), 10).expect("search");
    drop(built);

    let reopened = LexicalIndex::open(&dir).expect("open");
    assert_eq!(reopened.len(), 3);
    let again = reopened.search(&tokenize("flesh woman"), 10).expect("search");
    assert_eq!(fresh, again, "reopened index scores identically");
    let rows: Vec<usize> = again.iter().map(|h| h.row).collect();
    assert!(rows.contains(&0) && rows.contains(&1));

    let tis = reopened.search(&tokenize("'tis"), 10).expect("search");
    assert_eq!(tis.len(), 1, "apostrophe tokens index and match as a unit");
    assert_eq!(tis[0].row, 2);
}
