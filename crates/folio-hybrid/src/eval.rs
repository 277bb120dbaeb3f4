//! Retrieval checks over a question set.
//!
//! Questions are a JSON array of
//! `{"id", "type", "question", "must_include"?, "expected_play"?}`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use folio_core::error::{Error, Result};
use folio_core::types::Source;

use crate::retriever::RetrievalContext;

/// Sources retrieved per question.
pub const EVAL_K: usize = 8;
/// The expected work must appear among this many leading sources.
pub const PLAY_MATCH_DEPTH: usize = 3;
/// Share of phrase tokens a source must contain when the phrase itself is absent.
pub const MIN_TOKEN_OVERLAP: f32 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub question: String,
    #[serde(default)]
    pub must_include: Vec<String>,
    #[serde(default)]
    pub expected_play: Option<String>,
}

impl Question {
    pub fn is_quote_lookup(&self) -> bool {
        self.kind == "quote_lookup"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checks {
    pub grounding: bool,
    pub play_match: bool,
}

impl Checks {
    pub fn passed(&self) -> bool {
        self.grounding && self.play_match
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub id: String,
    pub kind: String,
    pub checks: Checks,
    pub top: Vec<String>,
}

pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::InvalidConfig(format!("question file {} not found", path.display())),
        _ => Error::Io(e),
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Fraction of the phrase's distinct whitespace tokens present in `text`,
/// case-insensitive.
pub fn token_overlap(phrase: &str, text: &str) -> f32 {
    let phrase = phrase.to_lowercase();
    let text = text.to_lowercase();
    let wanted: HashSet<&str> = phrase.split_whitespace().collect();
    if wanted.is_empty() {
        return 0.0;
    }
    let have: HashSet<&str> = text.split_whitespace().collect();
    wanted.intersection(&have).count() as f32 / wanted.len() as f32
}

/// True when some source contains the joined `must_include` phrase or most
/// of its tokens. Vacuously true without a phrase.
pub fn check_grounding(sources: &[Source], must_include: &[String]) -> bool {
    if must_include.is_empty() {
        return true;
    }
    let phrase = must_include.join(" ");
    let needle = phrase.to_lowercase();
    sources
        .iter()
        .any(|s| s.text.to_lowercase().contains(&needle) || token_overlap(&phrase, &s.text) >= MIN_TOKEN_OVERLAP)
}

/// True when the expected work leads the ranking. Vacuously true without an
/// expectation or without sources.
pub fn check_play(sources: &[Source], expected: Option<&str>) -> bool {
    match expected {
        Some(play) if !sources.is_empty() => {
            let play = play.to_lowercase();
            sources.iter().take(PLAY_MATCH_DEPTH).any(|s| s.meta.work.to_lowercase().contains(&play))
        }
        _ => true,
    }
}

pub fn evaluate_one(ctx: &RetrievalContext, question: &Question) -> Result<QuestionResult> {
    let sources = ctx.retrieve(&question.question, EVAL_K, None)?;
    let grounding = !question.is_quote_lookup() || check_grounding(&sources, &question.must_include);
    let checks = Checks { grounding, play_match: check_play(&sources, question.expected_play.as_deref()) };
    Ok(QuestionResult {
        id: question.id.clone(),
        kind: question.kind.clone(),
        checks,
        top: sources.iter().take(PLAY_MATCH_DEPTH).map(|s| s.to_string()).collect(),
    })
}

pub fn evaluate(ctx: &RetrievalContext, questions: &[Question]) -> Result<Vec<QuestionResult>> {
    let results = questions.iter().map(|q| evaluate_one(ctx, q)).collect::<Result<Vec<_>>>()?;
    let passed = results.iter().filter(|r| r.checks.passed()).count();
    info!(questions = results.len(), passed, "evaluation finished");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::types::{ChunkMeta, ScoreBreakdown};

    fn source(work: &str, text: &str) -> Source {
        Source {
            sid: "S1".into(),
            chunk_id: "X".into(),
            meta: ChunkMeta {
                chunk_id: "X".into(),
                work: work.into(),
                act: 1,
                scene: 1,
                speaker: None,
                line_start: None,
                line_end: None,
            },
            text: text.into(),
            score: 1.0,
            breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn overlap_counts_distinct_tokens() {
        assert_eq!(token_overlap("the the rest", "The rest is silence"), 1.0);
        assert_eq!(token_overlap("rest silence grave", "the rest is silence."), 1.0 / 3.0);
        assert_eq!(token_overlap("", "anything"), 0.0);
    }

    #[test]
    fn grounding_accepts_substring_or_overlap() {
        let sources = vec![source("Hamlet", "Alas, poor Yorick! I knew him, Horatio")];
        assert!(check_grounding(&sources, &["poor".into(), "yorick".into()]));
        assert!(check_grounding(&sources, &["Alas, poor Yorick".into()]));
        assert!(!check_grounding(&sources, &["I loved him well".into()]));
        assert!(check_grounding(&sources, &[]));
    }

    #[test]
    fn play_must_lead_the_ranking() {
        let sources = vec![
            source("Macbeth", "a"),
            source("Macbeth", "b"),
            source("Othello", "c"),
            source("Hamlet", "d"),
        ];
        assert!(check_play(&sources, Some("othello")));
        assert!(!check_play(&sources, Some("Hamlet")));
        assert!(check_play(&sources, None));
        assert!(check_play(&[], Some("Hamlet")));
    }

    #[test]
    fn questions_parse_with_optional_fields() {
        let qs: Vec<Question> = serde_json::from_str(
            r#"[{"id":"q1","type":"quote_lookup","question":"Who says 'to be or not to be'?","must_include":["to be or not to be"],"expected_play":"Hamlet"},
                {"id":"q2","type":"unanswerable","question":"What is the capital of France?"}]"#,
        )
        .unwrap();
        assert!(qs[0].is_quote_lookup());
        assert!(qs[1].must_include.is_empty());
        assert_eq!(qs[1].expected_play, None);
    }
}
