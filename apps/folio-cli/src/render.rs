use std::fmt::Write;

use folio_core::types::Source;

/// Characters of chunk text shown per source unless full context is asked for.
pub const SNIPPET_CHARS: usize = 240;

/// Whitespace-collapsed text, cut to `max_chars` with an ellipsis.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// One source as printed by `folio query`.
pub fn format_source(source: &Source, show_context: bool, explain: bool) -> String {
    let mut out = format!("{source}  score={:.4}\n", source.score);
    if show_context {
        for line in source.text.lines() {
            let _ = writeln!(out, "    {line}");
        }
    } else {
        let _ = writeln!(out, "    {}", snippet(&source.text, SNIPPET_CHARS));
    }
    if explain {
        let b = &source.breakdown;
        let _ = writeln!(
            out,
            "    lexical={:.4} (norm {:.3})  vector={:.4} (norm {:.3})  phrase_boost={:.1}",
            b.lexical_raw, b.lexical_norm, b.vector_raw, b.vector_norm, b.phrase_boost
        );
    }
    out
}
