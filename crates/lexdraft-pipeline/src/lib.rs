//! Contract drafting pipeline: retrieval-augmented generation, translation,
//! feedback revision, and result history.

mod error;
pub mod feedback;
mod handle;
pub mod history;
pub mod rag;
#[cfg(test)]
mod testing;

pub use error::PipelineError;
pub use handle::IndexHandle;
pub use history::{HistoryError, HistoryLog};
pub use rag::{Language, RagPipeline};
