//! Recursive text chunking with size/overlap control and offset tracking
//!
//! Text is split on a priority of separators (paragraph, line, sentence,
//! word, character) into atoms no larger than the chunk size, then the atoms
//! are merged back into chunks that carry `overlap` trailing characters into
//! their successor. No input character is ever dropped: every chunk records
//! its byte span within the segment, and the spans tile the segment.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, ChunkMetadata, TextSegment};

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl RecursiveChunker {
    /// Create a new chunker. The overlap is clamped below the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split all segments of one document into chunks with continuous
    /// indices, tagging each chunk with the document source name.
    pub fn split(&self, source: &str, segments: &[TextSegment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for segment in segments {
            let start_index = chunks.len() as u32;
            chunks.extend(self.split_segment(source, segment, start_index));
        }
        chunks
    }

    /// Split a single segment into chunks.
    pub fn split_segment(
        &self,
        source: &str,
        segment: &TextSegment,
        start_index: u32,
    ) -> Vec<Chunk> {
        let text = segment.text.as_str();
        let mut atoms = Vec::new();
        self.collect_atoms(text, 0, &mut atoms);

        self.merge_spans(text, &atoms)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| {
                Chunk::new(
                    text[start..end].to_string(),
                    ChunkMetadata {
                        source: source.to_string(),
                        page: segment.page,
                        chunk_index: start_index + i as u32,
                        char_start: start,
                        char_end: end,
                    },
                )
            })
            .collect()
    }

    /// Recursively break `text` into pieces of at most `chunk_size` bytes,
    /// trying coarser separators first. Pieces concatenate back to `text`.
    fn collect_atoms<'a>(&self, text: &'a str, level: usize, out: &mut Vec<&'a str>) {
        if text.is_empty() {
            return;
        }
        if text.len() <= self.chunk_size {
            out.push(text);
            return;
        }

        match level {
            0 => {
                for piece in text.split_inclusive("\n\n") {
                    self.collect_atoms(piece, 1, out);
                }
            }
            1 => {
                for piece in text.split_inclusive('\n') {
                    self.collect_atoms(piece, 2, out);
                }
            }
            2 => {
                for piece in text.split_sentence_bounds() {
                    self.collect_atoms(piece, 3, out);
                }
            }
            3 => {
                for piece in text.split_word_bounds() {
                    self.collect_atoms(piece, 4, out);
                }
            }
            _ => {
                // Fixed-size windows at character boundaries, for text with
                // no usable separators at all.
                let mut start = 0;
                while start < text.len() {
                    let mut end = (start + self.chunk_size).min(text.len());
                    while end > start && !text.is_char_boundary(end) {
                        end -= 1;
                    }
                    if end == start {
                        // A single character wider than the chunk size.
                        end = start + 1;
                        while end < text.len() && !text.is_char_boundary(end) {
                            end += 1;
                        }
                    }
                    out.push(&text[start..end]);
                    start = end;
                }
            }
        }
    }

    /// Merge atoms into chunk spans of at most `chunk_size` bytes, carrying
    /// up to `overlap` trailing bytes of each chunk into the next.
    fn merge_spans(&self, text: &str, atoms: &[&str]) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        let mut current_start = 0usize;
        let mut pos = 0usize;

        for atom in atoms {
            let current_len = pos - current_start;
            if current_len > 0 && current_len + atom.len() > self.chunk_size {
                spans.push((current_start, pos));

                // New chunk starts inside the previous one; shrink the carry
                // so the incoming atom still fits under the size bound.
                let carry = self
                    .overlap
                    .min(self.chunk_size.saturating_sub(atom.len()))
                    .min(current_len);
                let mut overlap_start = pos - carry;
                while !text.is_char_boundary(overlap_start) {
                    overlap_start += 1;
                }
                current_start = overlap_start;
            }
            pos += atom.len();
        }

        if pos > current_start {
            spans.push((current_start, pos));
        }
        spans
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}
