//! Fixed-size overlapping character windows.
//!
//! Lengths are counted in Unicode scalar values, so a window never splits a
//! UTF-8 sequence. For a text of `n > size` characters the window starts are
//! `0, step, 2·step, …` with `step = size − overlap`, and the last window ends
//! at `n`; this gives `ceil((n − overlap) / step)` chunks.

use lexdraft_core::{Chunk, DocumentRecord};

use crate::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker; requires `overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, StoreError> {
        if size == 0 || overlap >= size {
            return Err(StoreError::InvalidChunking { size, overlap });
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split one document into ordered, overlapping chunks.
    ///
    /// Empty documents produce no chunks; documents of at most `size`
    /// characters produce a single chunk holding the whole text.
    pub fn chunk(&self, doc: &DocumentRecord) -> Vec<Chunk> {
        // Byte offset of every char boundary, plus the end of the text.
        let bounds: Vec<usize> = doc
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(doc.text.len()))
            .collect();
        let n = bounds.len() - 1;
        if n == 0 {
            return Vec::new();
        }

        let step = self.size - self.overlap;
        let mut chunks = Vec::with_capacity(n.div_ceil(step));
        let mut start = 0;
        loop {
            let end = (start + self.size).min(n);
            let text = &doc.text[bounds[start]..bounds[end]];
            chunks.push(Chunk::new(&doc.id, chunks.len(), text));
            if end == n {
                break;
            }
            start += step;
        }
        chunks
    }

    /// Chunk every document, preserving document order.
    pub fn chunk_all(&self, docs: &[DocumentRecord]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.chunk(d)).collect()
    }
}
