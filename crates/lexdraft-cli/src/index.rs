//! Index pipeline: reads the template corpus, chunks it, embeds every chunk,
//! and writes the Arrow IPC index.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::Context;
use lexdraft_core::Embed;
use lexdraft_store::{Chunker, VectorIndex, load_corpus};

pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
    pub elapsed_secs: f64,
}

/// Wraps an embedder to report batch progress on stderr.
struct Progress<'a> {
    inner: &'a dyn Embed,
    done: AtomicUsize,
    total: usize,
}

impl Embed for Progress<'_> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let vectors = self.inner.embed_batch(texts)?;
        let done = self.done.fetch_add(texts.len(), Ordering::Relaxed) + texts.len();
        eprint!(
            "\r  Embedded {done}/{} ({:.1}%)",
            self.total,
            done as f64 / self.total.max(1) as f64 * 100.0
        );
        Ok(vectors)
    }
}

/// Run the full index pipeline: load corpus → chunk → embed → persist.
pub fn run_index_pipeline(
    corpus_dir: &Path,
    index_dir: &Path,
    chunker: &Chunker,
    embedder: &dyn Embed,
    batch_size: usize,
) -> anyhow::Result<IndexStats> {
    let start = Instant::now();

    // 1. Read source documents.
    let docs = load_corpus(corpus_dir);
    eprintln!("  Read {} documents from {}", docs.len(), corpus_dir.display());

    // 2. Chunk.
    let chunks = chunker.chunk_all(&docs);
    let total = chunks.len();
    eprintln!(
        "  Split into {total} chunks (size {}, overlap {})",
        chunker.size(),
        chunker.overlap()
    );

    // 3. Embed in sub-batches.
    let progress = Progress {
        inner: embedder,
        done: AtomicUsize::new(0),
        total,
    };
    let index =
        VectorIndex::build_batched(chunks, &progress, batch_size).context("generating embeddings")?;
    if total > 0 {
        eprintln!();
    }

    // 4. Persist, replacing any previous index.
    let path = index.persist(index_dir).context("writing index")?;
    eprintln!("  Wrote {}", path.display());

    Ok(IndexStats {
        documents: docs.len(),
        chunks: total,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
