use crate::index::overlap_score;
use crate::models::{ContextSelection, IndexedChunk, RetrievalOptions, ScoredChunk, SelectionStrategy};
use crate::tokenizer::tokenize;
use tracing::{debug, info, warn};

/// Chunks with a nonzero overlap score, best first. Equal scores keep their
/// original relative order.
pub fn rank_chunks<'a>(query_terms: &[String], chunks: &'a [IndexedChunk]) -> Vec<ScoredChunk<'a>> {
    let mut ranked: Vec<ScoredChunk<'a>> = chunks
        .iter()
        .enumerate()
        .map(|(position, chunk)| ScoredChunk {
            position,
            text: &chunk.text,
            score: overlap_score(&chunk.tf_index, query_terms),
        })
        .filter(|scored| scored.score > 0)
        .collect();

    // `sort_by` is stable.
    ranked.sort_by(|left, right| right.score.cmp(&left.score));
    ranked
}

pub fn assemble_context(
    query: &str,
    chunks: &[IndexedChunk],
    options: &RetrievalOptions,
) -> ContextSelection {
    let query_terms = tokenize(query);
    if query_terms.is_empty() || chunks.is_empty() {
        debug!(
            query_terms = query_terms.len(),
            chunks = chunks.len(),
            "nothing to select context from"
        );
        return ContextSelection::empty();
    }

    let ranked = rank_chunks(&query_terms, chunks);
    if ranked.is_empty() {
        warn!(
            fallback_chunks = options.fallback_chunk_count,
            "no chunk matched the query terms, using leading chunks"
        );
        let leading: Vec<&str> = chunks
            .iter()
            .take(options.fallback_chunk_count)
            .map(|chunk| chunk.text.as_str())
            .collect();

        return ContextSelection {
            included_chunks: leading.len(),
            text: leading.join(&options.separator),
            strategy: SelectionStrategy::Fallback,
        };
    }

    let separator_len = options.separator.chars().count();
    let mut text = String::new();
    let mut used = 0usize;
    let mut included = 0usize;

    for scored in &ranked {
        let chunk_len = scored.text.chars().count();
        let needed = if included == 0 {
            chunk_len
        } else {
            separator_len + chunk_len
        };

        if used + needed > options.max_context_chars {
            debug!(
                position = scored.position,
                score = scored.score,
                used,
                "context budget reached"
            );
            break;
        }

        if included > 0 {
            text.push_str(&options.separator);
        }
        text.push_str(scored.text);
        used += needed;
        included += 1;
    }

    info!(
        matched = ranked.len(),
        included,
        chars = used,
        budget = options.max_context_chars,
        "selected context"
    );

    ContextSelection {
        text,
        strategy: SelectionStrategy::Ranked,
        included_chunks: included,
    }
}

/// Context string for `query` bounded by `max_context_chars` (in the ranked
/// path), using the default fallback count and separator.
pub fn select_context(query: &str, chunks: &[IndexedChunk], max_context_chars: usize) -> String {
    let options = RetrievalOptions {
        max_context_chars,
        ..RetrievalOptions::default()
    };
    assemble_context(query, chunks, &options).text
}
