//! Inference collaborators: ONNX Runtime embeddings, LLM generation, and ACTQM scoring.

#[cfg(feature = "onnx")]
mod embedder;
mod generator;
#[cfg(feature = "http")]
mod languagetool;
pub mod score;

#[cfg(feature = "onnx")]
pub use embedder::Embedder;
#[cfg(feature = "http")]
pub use generator::ChatGenerator;
pub use generator::{GenerationError, Generator, GeneratorConfig, Provider};
#[cfg(feature = "http")]
pub use languagetool::{DEFAULT_LANGUAGETOOL_URL, LanguageToolChecker};
pub use score::{GrammarChecker, GrammarError, RuleSegmenter, ScoreError, Scorer, SentenceSegmenter};
