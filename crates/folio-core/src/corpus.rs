//! Chunk-file loading.
//!
//! The chunk file is JSON Lines, one [`Chunk`] per line, in the row order the
//! index is built with. Blank lines are skipped.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::types::Chunk;

pub fn load_chunks(path: &Path) -> Result<Vec<Chunk>> {
    if !path.exists() {
        return Err(Error::CorpusMissing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let chunks = parse_chunks(&content)?;
    info!(chunks = chunks.len(), path = %path.display(), "loaded chunk file");
    Ok(chunks)
}

pub fn parse_chunks(content: &str) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let chunk: Chunk = serde_json::from_str(line)
            .map_err(|e| Error::Corpus(format!("line {}: {}", line_no + 1, e)))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}

pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let mut out = String::new();
    for chunk in chunks {
        out.push_str(&serde_json::to_string(chunk)?);
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}
