//! Storage layer: corpus loading, chunking, and the persisted vector index.

pub mod chunker;
mod error;
pub mod index;
pub mod loader;

pub use chunker::Chunker;
pub use error::StoreError;
pub use index::{INDEX_FILE, ScoredChunk, VectorIndex};
pub use loader::{CorpusLoader, TextExtractor, load_corpus, require_documents};
