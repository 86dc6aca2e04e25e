//! Recursive character splitting for the non-semantic fallback path.
//!
//! When layout analysis is skipped, page text is flattened and cut by
//! separator preference: paragraph breaks first, then line breaks, then
//! spaces, with a raw character window as the last resort. Adjacent chunks
//! share a configurable overlap so sentences cut at a boundary stay
//! retrievable.

use std::collections::VecDeque;

/// Separators tried from coarsest to finest.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_level(text, SEPARATORS)
    }

    fn split_level(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let Some((sep, finer)) = separators.split_first() else {
            return self.window_split(text);
        };
        if !text.contains(sep) {
            return self.split_level(text, finer);
        }

        let mut fragments = Vec::new();
        for piece in text.split(sep) {
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            if char_len(piece) <= self.chunk_size {
                fragments.push(piece.to_string());
            } else {
                fragments.extend(self.split_level(piece, finer));
            }
        }
        self.pack(fragments, sep)
    }

    /// Greedily join fragments up to `chunk_size`, then restart the next
    /// chunk from a tail of at most `chunk_overlap` characters.
    fn pack(&self, fragments: Vec<String>, sep: &str) -> Vec<String> {
        let sep_chars = char_len(sep);
        let mut chunks = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut window_chars = 0usize;

        for fragment in fragments {
            let fragment_chars = char_len(&fragment);

            if !window.is_empty()
                && joined_len(window_chars, fragment_chars, sep_chars) > self.chunk_size
            {
                chunks.push(join_window(&window, sep));
                while window_chars > self.chunk_overlap
                    || (window_chars > 0
                        && joined_len(window_chars, fragment_chars, sep_chars) > self.chunk_size)
                {
                    match window.pop_front() {
                        Some((_, dropped)) => {
                            window_chars = if window.is_empty() {
                                0
                            } else {
                                window_chars - dropped - sep_chars
                            };
                        }
                        None => break,
                    }
                }
            }

            window_chars = joined_len(window_chars, fragment_chars, sep_chars);
            window.push_back((fragment, fragment_chars));
        }

        if !window.is_empty() {
            chunks.push(join_window(&window, sep));
        }
        chunks
    }

    /// Last resort: fixed character windows advancing by size minus overlap.
    fn window_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn joined_len(window_chars: usize, extra: usize, sep_chars: usize) -> usize {
    if window_chars == 0 {
        extra
    } else {
        window_chars + sep_chars + extra
    }
}

fn join_window(window: &VecDeque<(String, usize)>, sep: &str) -> String {
    window
        .iter()
        .map(|(s, _)| s.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}
