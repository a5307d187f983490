//! Brute-force cosine vector index over chunks, persisted as an Arrow IPC file.
//!
//! The index is immutable once built. Queries take `&self`, so one index can be
//! shared across concurrent readers behind an `Arc`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{
    Array, FixedSizeListArray, FixedSizeListBuilder, Float32Array, Float32Builder, StringArray,
    UInt64Array,
};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use lexdraft_core::schema::index::{DIM_KEY, MODEL_KEY, chunk_index_schema};
use lexdraft_core::{Chunk, Embed};
use tracing::{info, warn};

use crate::chunker::Chunker;
use crate::loader::load_corpus;
use crate::StoreError;

/// File name of the persisted index inside its directory.
pub const INDEX_FILE: &str = "index.arrow";

const DEFAULT_BATCH_SIZE: usize = 256;

/// A retrieved chunk with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Chunks and their embeddings, in insertion order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model: String,
    dim: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Embed every chunk and build an index.
    ///
    /// Either all chunks are embedded or the build fails; no partial index
    /// is returned.
    pub fn build(chunks: Vec<Chunk>, embedder: &dyn Embed) -> Result<Self, StoreError> {
        Self::build_batched(chunks, embedder, DEFAULT_BATCH_SIZE)
    }

    /// [`VectorIndex::build`] with an explicit embedding batch size.
    pub fn build_batched(
        chunks: Vec<Chunk>,
        embedder: &dyn Embed,
        batch_size: usize,
    ) -> Result<Self, StoreError> {
        let start = Instant::now();
        let dim = embedder.dim();
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size.max(1)) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embedded = embedder
                .embed_batch(&texts)
                .map_err(|e| StoreError::Embedding(format!("{e:#}")))?;
            if embedded.len() != texts.len() {
                return Err(StoreError::Embedding(format!(
                    "expected {} vectors, embedding function returned {}",
                    texts.len(),
                    embedded.len()
                )));
            }
            for v in embedded {
                check_dim(dim, v.len())?;
                vectors.push(v);
            }
        }

        info!(
            chunks = chunks.len(),
            dim,
            model = embedder.model_name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built vector index"
        );
        Ok(Self {
            model: embedder.model_name().to_string(),
            dim,
            chunks,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Name of the embedding model the vectors came from.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Embed `text` and return the `k` most similar chunks.
    pub fn query(
        &self,
        text: &str,
        k: usize,
        embedder: &dyn Embed,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        if k == 0 {
            return Err(StoreError::InvalidTopK);
        }
        let query_vector = embedder
            .embed(text)
            .map_err(|e| StoreError::Embedding(format!("{e:#}")))?;
        self.search(&query_vector, k)
    }

    /// Return the `k` chunks nearest to `query_vector`, by descending cosine
    /// similarity. Equal scores keep insertion order.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        if k == 0 {
            return Err(StoreError::InvalidTopK);
        }
        check_dim(self.dim, query_vector.len())?;

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(v, query_vector)))
            .collect();
        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    // ── Persistence ──

    /// Write the index to `dir/index.arrow`, creating `dir` if needed.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(INDEX_FILE);
        let schema = Arc::new(chunk_index_schema(self.dim, &self.model));

        let file = File::create(&path)?;
        let mut writer = FileWriter::try_new(file, &schema)?;
        if !self.chunks.is_empty() {
            writer.write(&self.to_record_batch(&schema)?)?;
        }
        writer.finish()?;

        info!(
            path = %path.display(),
            rows = self.chunks.len(),
            "persisted vector index"
        );
        Ok(path)
    }

    /// Read an index previously written by [`VectorIndex::persist`].
    ///
    /// Missing or corrupt files fail with [`StoreError::Load`].
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(INDEX_FILE);
        let load_err = |reason: String| StoreError::Load {
            path: path.clone(),
            reason,
        };

        let file = File::open(&path).map_err(|e| load_err(e.to_string()))?;
        let reader = FileReader::try_new(file, None).map_err(|e| load_err(e.to_string()))?;

        let schema = reader.schema();
        let metadata = schema.metadata();
        let model = metadata
            .get(MODEL_KEY)
            .cloned()
            .ok_or_else(|| load_err(format!("missing '{MODEL_KEY}' metadata")))?;
        let dim: usize = metadata
            .get(DIM_KEY)
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| load_err(format!("missing or invalid '{DIM_KEY}' metadata")))?;

        let mut index = Self {
            model,
            dim,
            chunks: Vec::new(),
            vectors: Vec::new(),
        };
        for batch in reader {
            let batch = batch.map_err(|e| load_err(e.to_string()))?;
            index.extend_from_batch(&batch).map_err(load_err)?;
        }

        info!(
            path = %path.display(),
            rows = index.len(),
            dim,
            "loaded vector index"
        );
        Ok(index)
    }

    /// Load the persisted index, or rebuild it from the corpus.
    ///
    /// Rebuilds when the index file is missing or corrupt, or when it was
    /// built with a different embedding model. The rebuilt index is persisted
    /// to `index_dir`, embedding `batch_size` chunks at a time.
    pub fn open_or_build(
        index_dir: &Path,
        corpus_dir: &Path,
        chunker: &Chunker,
        embedder: &dyn Embed,
        batch_size: usize,
    ) -> Result<Self, StoreError> {
        match Self::load(index_dir) {
            Ok(index) if index.model() == embedder.model_name() && index.dim() == embedder.dim() => {
                return Ok(index);
            }
            Ok(index) => warn!(
                persisted = index.model(),
                current = embedder.model_name(),
                "embedding model changed, rebuilding index"
            ),
            Err(e) => warn!(error = %e, "no usable persisted index, rebuilding from corpus"),
        }

        let docs = load_corpus(corpus_dir);
        let index = Self::build_batched(chunker.chunk_all(&docs), embedder, batch_size)?;
        index.persist(index_dir)?;
        Ok(index)
    }

    // ── Internal ──

    fn to_record_batch(
        &self,
        schema: &Arc<arrow::datatypes::Schema>,
    ) -> Result<RecordBatch, StoreError> {
        let ids = StringArray::from_iter_values(self.chunks.iter().map(|c| c.id.as_str()));
        let doc_ids =
            StringArray::from_iter_values(self.chunks.iter().map(|c| c.document_id.as_str()));
        let ordinals = UInt64Array::from_iter_values(self.chunks.iter().map(|c| c.ordinal as u64));
        let texts = StringArray::from_iter_values(self.chunks.iter().map(|c| c.text.as_str()));

        let mut emb_builder = FixedSizeListBuilder::new(Float32Builder::new(), self.dim as i32);
        for v in &self.vectors {
            emb_builder.values().append_slice(v);
            emb_builder.append(true);
        }

        Ok(RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(ids),
                Arc::new(doc_ids),
                Arc::new(ordinals),
                Arc::new(texts),
                Arc::new(emb_builder.finish()),
            ],
        )?)
    }

    fn extend_from_batch(&mut self, batch: &RecordBatch) -> Result<(), String> {
        let ids = string_column(batch, "chunk_id")?;
        let doc_ids = string_column(batch, "document_id")?;
        let texts = string_column(batch, "text")?;
        let ordinals = batch
            .column_by_name("ordinal")
            .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
            .ok_or("missing or mistyped 'ordinal' column")?;
        let emb = batch
            .column_by_name("embedding")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or("missing or mistyped 'embedding' column")?;

        let dim = emb.value_length() as usize;
        if dim != self.dim {
            return Err(format!(
                "embedding column has dimension {dim}, metadata says {}",
                self.dim
            ));
        }

        // The underlying values are a single flat Float32Array.
        let flat = emb
            .values()
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or("embedding values are not Float32")?;

        for row in 0..batch.num_rows() {
            let offset = emb.value_offset(row) as usize;
            self.vectors.push(flat.values()[offset..offset + dim].to_vec());
            self.chunks.push(Chunk {
                id: ids.value(row).to_string(),
                document_id: doc_ids.value(row).to_string(),
                ordinal: ordinals.value(row) as usize,
                text: texts.value(row).to_string(),
            });
        }
        Ok(())
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, String> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| format!("missing or mistyped '{name}' column"))
}

fn check_dim(expected: usize, actual: usize) -> Result<(), StoreError> {
    if expected != actual {
        return Err(StoreError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
