//! Domain types used by the lexical, vector and hybrid engines.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type ChunkId = String;

/// A citeable passage of a play, as produced by the chunking step.
///
/// - `chunk_id`: globally unique, derived from work code, act, scene and sequence
/// - `work`: display title of the play (stored as `play` on disk)
/// - `speaker`: one name, or a comma-joined list when the passage spans speeches
/// - `line_start`/`line_end`: 1-based line range when the source numbers lines
/// - `source_path`: provenance of the passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub chunk_id: ChunkId,
    #[serde(rename = "play")]
    pub work: String,
    pub act: u32,
    pub scene: u32,
    #[serde(default)]
    pub speaker: Option<String>,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub source_path: String,
}

impl Chunk {
    pub fn meta(&self) -> ChunkMeta {
        ChunkMeta {
            chunk_id: self.chunk_id.clone(),
            work: self.work.clone(),
            act: self.act,
            scene: self.scene,
            speaker: self.speaker.clone(),
            line_start: self.line_start,
            line_end: self.line_end,
        }
    }
}

/// The part of a chunk ranking needs, kept apart from the text body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMeta {
    pub chunk_id: ChunkId,
    #[serde(rename = "play")]
    pub work: String,
    pub act: u32,
    pub scene: u32,
    pub speaker: Option<String>,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
}

/// Grouping key used by the diversity cap.
pub type SceneKey<'a> = (&'a str, u32, u32);

impl ChunkMeta {
    pub fn scene_key(&self) -> SceneKey<'_> {
        (self.work.as_str(), self.act, self.scene)
    }

    /// `Hamlet 3.1 — HAMLET (lines 56-88)`; speaker and lines only when known.
    pub fn location(&self) -> String {
        let mut out = format!("{} {}.{}", self.work, self.act, self.scene);
        if let Some(speaker) = self.speaker.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(" — ");
            out.push_str(speaker);
        }
        if let Some(start) = self.line_start {
            let end = self.line_end.unwrap_or(start);
            out.push_str(&format!(" (lines {start}-{end})"));
        }
        out
    }
}

/// Indicates which signal proposed a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Lexical,
    Vector,
}

/// A candidate proposed by one signal.
///
/// `row` is the position of the chunk inside the loaded index and is only
/// meaningful for that index generation. `score` is signal-specific; higher
/// is always better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub row: usize,
    pub score: f32,
    pub source: SourceKind,
}

/// Per-signal contributions behind a fused score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub lexical_raw: f32,
    pub vector_raw: f32,
    pub lexical_norm: f32,
    pub vector_norm: f32,
    pub phrase_boost: f32,
}

/// One retrieved passage as handed to answer synthesis.
///
/// `sid` ("S1", "S2", ...) is positional within a single response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub sid: String,
    pub chunk_id: ChunkId,
    pub meta: ChunkMeta,
    pub text: String,
    pub score: f32,
    pub breakdown: ScoreBreakdown,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.sid, self.meta.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ChunkMeta {
        ChunkMeta {
            chunk_id: "HAMLET_3_1_0002".into(),
            work: "Hamlet".into(),
            act: 3,
            scene: 1,
            speaker: Some("HAMLET".into()),
            line_start: Some(56),
            line_end: Some(88),
        }
    }

    #[test]
    fn location_includes_known_parts_only() {
        assert_eq!(meta().location(), "Hamlet 3.1 — HAMLET (lines 56-88)");
        let bare = ChunkMeta { speaker: None, line_start: None, line_end: None, ..meta() };
        assert_eq!(bare.location(), "Hamlet 3.1");
    }

    #[test]
    fn chunk_reads_play_field_as_work() {
        let line = r#"{"chunk_id":"MACBETH_1_1_0000","play":"Macbeth","act":1,"scene":1,"speaker":"FIRST WITCH","line_start":1,"line_end":12,"text":"When shall we three meet again","source_path":"raw/macbeth.html"}"#;
        let chunk: Chunk = serde_json::from_str(line).expect("parse");
        assert_eq!(chunk.work, "Macbeth");
        assert_eq!(chunk.meta().scene_key(), ("Macbeth", 1, 1));
    }
}
