//! Recursive character splitting.
//!
//! Text is split on the first separator (in preference order) that occurs in
//! it; pieces still longer than the chunk size are split again with the
//! remaining separators. Small pieces are then merged back into chunks of at
//! most `chunk_size` characters, carrying up to `chunk_overlap` characters of
//! trailing context into the next chunk. Separators stay attached to the
//! start of the piece that follows them.

use super::{Chunker, ContentChunk};
use std::collections::VecDeque;
use tracing::warn;

/// Paragraph breaks, line breaks, spaces, then single characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Length-and-separator-aware text splitter.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Split text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator present in the text wins; "" always matches.
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, s) in separators.iter().enumerate() {
            if s.is_empty() {
                separator = "";
                break;
            }
            if text.contains(s.as_str()) {
                separator = s;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Merge small pieces into chunks, keeping an overlap window between them.
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = join_pieces(&current) {
                        docs.push(doc);
                    }

                    // Drop pieces from the front until the carried window fits
                    // both the overlap and the incoming piece.
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some((_, front_len)) => total -= front_len,
                            None => break,
                        }
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

impl Chunker for RecursiveCharacterSplitter {
    fn chunk(&self, text: &str) -> Vec<ContentChunk> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(order, content)| ContentChunk::new(content, order))
            .collect()
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_pieces(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(p, _)| *p).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split on `separator`, attaching each separator to the piece after it.
/// Empty pieces are dropped. An empty separator splits into characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{:04}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200);
        let chunks = splitter.split_text("Hello there, general Kenobi.");
        assert_eq!(chunks, vec!["Hello there, general Kenobi."]);
    }

    #[test]
    fn test_whitespace_only_text_yields_nothing() {
        let splitter = RecursiveCharacterSplitter::new(1000, 200);
        assert!(splitter.split_text("   \n\n  ").is_empty());
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        // 600 words of 5 chars plus spaces: ~3600 characters.
        let text = words(600);
        let splitter = RecursiveCharacterSplitter::new(1000, 200);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() >= 4, "got {} chunks", chunks.len());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 1000);
        }

        // Adjacent chunks share trailing context.
        for pair in chunks.windows(2) {
            let last_word = pair[0].split(' ').last().unwrap();
            assert!(pair[1].contains(last_word), "no overlap between chunks");
            let first_word = pair[1].split(' ').next().unwrap();
            let overlap_start = pair[0].find(first_word).unwrap();
            let overlap = pair[0].len() - overlap_start;
            assert!(overlap <= 200, "overlap {} exceeds 200", overlap);
        }

        // Every word survives, in order.
        assert!(chunks[0].starts_with("w0000"));
        assert!(chunks.last().unwrap().ends_with("w0599"));
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let para_a = "a".repeat(30);
        let para_b = "b".repeat(30);
        let text = format!("{}\n\n{}", para_a, para_b);

        let splitter = RecursiveCharacterSplitter::new(40, 0);
        let chunks = splitter.split_text(&text);
        assert_eq!(chunks, vec![para_a, para_b]);
    }

    #[test]
    fn test_long_token_falls_back_to_characters() {
        let text = "x".repeat(25);
        let splitter = RecursiveCharacterSplitter::new(10, 2);
        let chunks = splitter.split_text(&text);

        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0], "x".repeat(10));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "ü".repeat(30);
        let splitter = RecursiveCharacterSplitter::new(10, 0);
        let chunks = splitter.split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() == 10));
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\n\n\nb", "\n\n"),
            vec!["a", "\n\n", "\n\nb"]
        );
        assert_eq!(split_keeping_separator("one two", " "), vec!["one", " two"]);
        assert_eq!(split_keeping_separator("ab", ""), vec!["a", "b"]);
    }

    #[test]
    fn test_chunker_orders_chunks() {
        let splitter = RecursiveCharacterSplitter::new(20, 5);
        let chunks = splitter.chunk(&words(20));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
        }
    }
}
