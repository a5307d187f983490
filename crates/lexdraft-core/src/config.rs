//! Pipeline configuration shared by every entry point.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default sentence-transformers model (384 dimensions).
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-MiniLM-L6-v2";

/// One parameterised configuration for indexing, retrieval and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub embedding_model: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Chunks retrieved per query.
    pub top_k: usize,
    /// Weight of grammar issues per sentence in the formality score.
    pub penalty_factor: f64,
    /// Texts per embedding call while building an index.
    pub embed_batch_size: usize,
    /// Contract categories offered for drafting.
    pub categories: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            top_k: 3,
            penalty_factor: 0.5,
            embed_batch_size: 256,
            categories: vec![
                "Non-Disclosure Agreement".into(),
                "Master Services Agreement".into(),
                "Employment Agreement".into(),
                "Sponsorship Agreement".into(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be positive".into()));
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embed_batch_size must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.penalty_factor) {
            return Err(ConfigError::Invalid(format!(
                "penalty_factor must be within [0, 1], got {}",
                self.penalty_factor
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.embedding_model, "all-MiniLM-L6-v2");
    }

    #[test]
    fn partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"chunk_size": 800, "chunk_overlap": 80}"#)
            .unwrap();
        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 80);
        assert_eq!(config.top_k, 3);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let config = PipelineConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_top_k_rejected() {
        let config = PipelineConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn penalty_out_of_range_rejected() {
        let config = PipelineConfig {
            penalty_factor: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
