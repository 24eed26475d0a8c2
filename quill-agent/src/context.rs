//! Assemble retrieved chunks into prompt context.

use quill_index::SearchResult;

/// Separator between chunks in assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Concatenate chunk texts in ranking order, dropping scores.
///
/// Pure; an empty result set yields an empty string, which callers treat
/// as "no local answer available".
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use quill_index::Chunk;

    use super::*;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                text: text.to_string(),
                source: "src".to_string(),
                page: Some(0),
                sequence_index: 0,
            },
            score,
        }
    }

    #[test]
    fn empty_results_build_empty_context() {
        assert_eq!(build_context(&[]), "");
    }

    #[test]
    fn chunks_join_in_order_with_separator() {
        let results = vec![result("first", 0.1), result("second", 0.4)];
        assert_eq!(build_context(&results), "first\n\n---\n\nsecond");
    }
}
