use crate::models::RetrievalOptions;
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 1_800;

const BLOCK_SEPARATOR: &str = "\n\n";
const UNIT_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_MAX_CHARS,
        }
    }
}

impl From<&RetrievalOptions> for ChunkingConfig {
    fn from(value: &RetrievalOptions) -> Self {
        Self {
            max_chars: value.chunk_max_chars,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticBlock {
    pub kind: BlockKind,
    pub text: String,
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

fn list_item_regex() -> Option<&'static Regex> {
    static LIST_ITEM: OnceLock<Option<Regex>> = OnceLock::new();
    LIST_ITEM
        .get_or_init(|| Regex::new(r"^\s*(?:[*+-]|\d+\.|[A-Za-z0-9_]\))\s+").ok())
        .as_ref()
}

fn sentence_regex() -> Option<&'static Regex> {
    static SENTENCE: OnceLock<Option<Regex>> = OnceLock::new();
    SENTENCE
        .get_or_init(|| Regex::new(r"[^.!?]*[.!?]+|[^.!?]+").ok())
        .as_ref()
}

/// Bullet (`*`, `+`, `-`), numbered (`1.`) or lettered (`a)`) item start.
pub fn is_list_item(line: &str) -> bool {
    list_item_regex().is_some_and(|re| re.is_match(line))
}

fn line_kind(line: &str) -> BlockKind {
    if is_list_item(line) {
        BlockKind::List
    } else {
        BlockKind::Text
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn semantic_blocks(text: &str) -> Vec<SemanticBlock> {
    fn flush(blocks: &mut Vec<SemanticBlock>, lines: &mut Vec<&str>, kind: &mut Option<BlockKind>) {
        if let Some(block_kind) = kind.take() {
            let joined = lines.join("\n");
            let trimmed = joined.trim();
            if !trimmed.is_empty() {
                blocks.push(SemanticBlock {
                    kind: block_kind,
                    text: trimmed.to_string(),
                });
            }
        }
        lines.clear();
    }

    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut kind: Option<BlockKind> = None;

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut blocks, &mut lines, &mut kind);
            continue;
        }

        let current = line_kind(line);
        if kind.is_some_and(|open| open != current) {
            flush(&mut blocks, &mut lines, &mut kind);
        }
        kind.get_or_insert(current);
        lines.push(line);
    }

    flush(&mut blocks, &mut lines, &mut kind);
    blocks
}

/// Splits a list block between items; continuation lines stay with their item.
pub fn split_list_items(block: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();

    for line in block.lines() {
        if is_list_item(line) && !current.is_empty() {
            items.push(current.trim().to_string());
            current.clear();
        } else if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.trim().is_empty() {
        items.push(current.trim().to_string());
    }

    items
}

/// Runs of text ending in `.`, `!` or `?` (or end of input). Every character
/// of `block` lands in exactly one sentence. Abbreviations such as "Dr." or
/// "Sr." end a sentence too.
pub fn split_sentences(block: &str) -> Vec<String> {
    let Some(re) = sentence_regex() else {
        return vec![block.to_string()];
    };

    let sentences: Vec<String> = re
        .find_iter(block)
        .map(|found| found.as_str().to_string())
        .collect();

    if sentences.is_empty() {
        vec![block.to_string()]
    } else {
        sentences
    }
}

fn append_bounded(
    accumulator: &mut String,
    piece: &str,
    separator: &str,
    max_chars: usize,
    chunks: &mut Vec<String>,
) {
    if accumulator.is_empty() {
        accumulator.push_str(piece);
        return;
    }

    if char_len(accumulator) + char_len(separator) + char_len(piece) > max_chars {
        chunks.push(std::mem::take(accumulator));
        accumulator.push_str(piece);
    } else {
        accumulator.push_str(separator);
        accumulator.push_str(piece);
    }
}

fn pack_units(units: Vec<String>, max_chars: usize, chunks: &mut Vec<String>) {
    let mut accumulator = String::new();

    for unit in units {
        let unit = unit.trim();
        if unit.is_empty() {
            continue;
        }

        if char_len(unit) > max_chars {
            if !accumulator.is_empty() {
                chunks.push(std::mem::take(&mut accumulator));
            }
            chunks.push(unit.to_string());
            continue;
        }

        append_bounded(&mut accumulator, unit, UNIT_SEPARATOR, max_chars, chunks);
    }

    if !accumulator.is_empty() {
        chunks.push(accumulator);
    }
}

/// Splits a document into ordered, trimmed, non-empty chunks of at most
/// `config.max_chars` characters, except for single oversized sentences or
/// list items which are emitted whole.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let max_chars = config.max_chars;
    let mut chunks = Vec::new();
    let mut current = String::new();

    for block in semantic_blocks(text) {
        if char_len(&block.text) > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            let units = match block.kind {
                BlockKind::List => split_list_items(&block.text),
                BlockKind::Text => split_sentences(&block.text),
            };
            pack_units(units, max_chars, &mut chunks);
        } else {
            append_bounded(&mut current, &block.text, BLOCK_SEPARATOR, max_chars, &mut chunks);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .map(|chunk| chunk.trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
