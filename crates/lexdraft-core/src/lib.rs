pub mod config;
pub mod embed;
mod error;
pub mod keywords;
pub mod record;
pub mod schema;

pub use config::PipelineConfig;
pub use embed::Embed;
pub use error::ConfigError;
pub use keywords::KeywordRegistry;
pub use record::{
    Chunk, ContractParams, DocumentRecord, GeneratedResult, QualityReport, QueryRequest,
};
