use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};

use folio_cli::{init_tracing, report, App};

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (mut chunks, mut index_dir) = (None, None);
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--index-dir" | "-o" => {
                i += 1;
                index_dir = Some(PathBuf::from(args.get(i).context("--index-dir requires a path")?));
            }
            flag if flag.starts_with('-') => bail!("Usage: folio-indexer [chunks.jsonl] [--index-dir DIR]"),
            path => chunks = Some(PathBuf::from(path)),
        }
        i += 1;
    }
    let app = App::load()?.with_paths(chunks, index_dir);
    println!("Folio Indexer\n=============");
    println!("Chunk file:      {}", app.paths.chunks_path.display());
    println!("Index directory: {}", app.paths.index_dir.display());
    println!("Embedding:       {:?} (batch {})", app.settings.embedding.backend, app.settings.embedding.batch_size);

    let index = app.build_index(true)?;
    println!("\n✅ Indexing completed successfully!");
    println!("📊 {} chunks, {} dims, embedder {}", index.len(), index.manifest.embedding_dim, index.manifest.embedder_id);
    println!("🔑 corpus fingerprint {}", index.manifest.corpus_fingerprint);
    println!("\n💡 To search, use: cargo run --bin folio -- query '<question>'");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}
