use std::path::PathBuf;

use lexdraft_ai::GenerationError;
use lexdraft_store::StoreError;
use thiserror::Error;

use crate::history::HistoryError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] StoreError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("no client documents found in {0:?}")]
    EmptyCorpus(PathBuf),

    #[error("correction text is empty")]
    EmptyCorrection,

    #[error("unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("history: {0}")]
    History(#[from] HistoryError),

    #[error("index rebuild task failed: {0}")]
    RebuildTask(#[from] tokio::task::JoinError),
}
