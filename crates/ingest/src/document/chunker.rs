//! Chunk assembly: greedy forward merge of header-delimited segments.
//!
//! Layout analysis produces many small sections (a heading plus a paragraph
//! or two). Embedding each one separately loses context, while embedding
//! whole documents dilutes retrieval. The assembler merges
//! consecutive segments until each chunk lands inside a character band that
//! embeds well, carrying the heading hierarchy and table/figure annotations
//! along.

use super::{Heading, Segment};

/// Inline markup emitted by layout analysis for table regions.
pub const TABLE_MARKER: &str = "<table>";
/// Inline markup emitted by layout analysis for figure regions.
pub const FIGURE_MARKER: &str = "<figure>";

// ── Configuration ───────────────────────────────────────────────────────────

/// Size band for assembled chunks, measured in characters.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Stop merging once a chunk has at least this many characters.
    pub min_chars: usize,
    /// Never let a merge push a chunk past this many characters.
    pub max_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            min_chars: 500,
            max_chars: 1000,
        }
    }
}

// ── Chunk output ────────────────────────────────────────────────────────────

/// A merged run of consecutive segments, ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Heading hierarchy of the first segment merged into this chunk.
    pub heading_path: Vec<Heading>,
    /// True when any merged segment contained a table region.
    pub has_table: bool,
    /// True when any merged segment contained a figure region.
    pub has_figure: bool,
    /// Concatenated segment contents, in document order, no separator.
    pub text: String,
}

impl Chunk {
    /// Heading titles joined for display ("Results > Ablations").
    /// Empty string when the chunk sits above the first heading.
    pub fn heading_line(&self) -> String {
        self.heading_path
            .iter()
            .map(|h| h.title.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// The serialized form fed to embedding and storage: heading line,
    /// `{Table}` / `{Figure}` annotation lines when present, then the text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + 64);
        out.push_str(&self.heading_line());
        out.push('\n');
        if self.has_table {
            out.push_str("{Table}\n");
        }
        if self.has_figure {
            out.push_str("{Figure}\n");
        }
        out.push_str(&self.text);
        out
    }
}

// ── Assembly ────────────────────────────────────────────────────────────────

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Merge consecutive segments into chunks inside the configured band.
///
/// Each chunk starts from the next unconsumed segment and keeps absorbing
/// the following one while it is still under `min_chars` and the merge would
/// not push it past `max_chars`. A single segment already larger than
/// `max_chars` passes through untouched as its own chunk, never truncated
/// or re-split. The heading path of a merged chunk is the first
/// segment's; table/figure detection runs over the final merged text.
pub fn assemble_chunks(segments: Vec<Segment>, config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut iter = segments.into_iter().peekable();

    while let Some(seed) = iter.next() {
        let heading_path = seed.heading_path;
        let mut text = seed.content;
        let mut text_chars = char_len(&text);

        while text_chars < config.min_chars {
            let next_chars = match iter.peek() {
                Some(next) => char_len(&next.content),
                None => break,
            };
            if text_chars + next_chars > config.max_chars {
                break;
            }
            if let Some(next) = iter.next() {
                text.push_str(&next.content);
                text_chars += next_chars;
            }
        }

        let has_table = text.contains(TABLE_MARKER);
        let has_figure = text.contains(FIGURE_MARKER);

        chunks.push(Chunk {
            heading_path,
            has_table,
            has_figure,
            text,
        });
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────────────
