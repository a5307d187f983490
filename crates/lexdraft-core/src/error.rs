use std::path::PathBuf;

use thiserror::Error;

/// Configuration failures: keyword registry and pipeline settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no required keywords registered for category '{0}'")]
    UnknownCategory(String),

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
