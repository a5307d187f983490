//! Shared, swappable reference to the live vector index.

use std::path::Path;
use std::sync::Arc;

use lexdraft_core::Embed;
use lexdraft_store::{Chunker, StoreError, VectorIndex, load_corpus};
use tokio::sync::RwLock;
use tracing::info;

use crate::PipelineError;

/// Readers take a snapshot and query it without holding the lock; a rebuild
/// holds the write lock until the new index is in place.
pub struct IndexHandle {
    current: RwLock<Arc<VectorIndex>>,
}

impl IndexHandle {
    pub fn new(index: VectorIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The index as of now. Later rebuilds do not affect the snapshot.
    pub async fn snapshot(&self) -> Arc<VectorIndex> {
        self.current.read().await.clone()
    }

    /// Swap in an already built index.
    pub async fn replace(&self, index: VectorIndex) {
        *self.current.write().await = Arc::new(index);
    }

    /// Rebuild from `corpus_dir`, persist to `index_dir` when given, and swap in.
    ///
    /// Loading, embedding and persisting run on the blocking pool, so a slow
    /// embedder does not stall the async workers. On failure the previous
    /// index stays live.
    pub async fn rebuild(
        &self,
        corpus_dir: &Path,
        chunker: Chunker,
        embedder: Arc<dyn Embed>,
        batch_size: usize,
        index_dir: Option<&Path>,
    ) -> Result<Arc<VectorIndex>, PipelineError> {
        let mut current = self.current.write().await;
        let corpus_dir = corpus_dir.to_path_buf();
        let index_dir = index_dir.map(Path::to_path_buf);
        let (documents, index) = tokio::task::spawn_blocking(move || {
            let docs = load_corpus(&corpus_dir);
            let index =
                VectorIndex::build_batched(chunker.chunk_all(&docs), embedder.as_ref(), batch_size)?;
            if let Some(dir) = &index_dir {
                index.persist(dir)?;
            }
            Ok::<_, StoreError>((docs.len(), index))
        })
        .await??;
        let index = Arc::new(index);
        *current = index.clone();
        info!(documents, chunks = index.len(), "index rebuilt");
        Ok(index)
    }
}
