//! Deterministic collaborators shared by the pipeline tests.

use std::sync::Mutex;

use async_trait::async_trait;
use lexdraft_ai::{GenerationError, Generator};
use lexdraft_core::{DocumentRecord, Embed};
use lexdraft_store::{Chunker, VectorIndex};

const VOCAB: &[&str] = &[
    "confidential",
    "information",
    "disclosure",
    "services",
    "payment",
    "salary",
    "termination",
    "sponsor",
];

/// Bag-of-words embedder over a fixed legal vocabulary.
pub struct VocabEmbedder;

impl Embed for VocabEmbedder {
    fn model_name(&self) -> &str {
        "vocab-test"
    }

    fn dim(&self) -> usize {
        VOCAB.len()
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let lowered = t.to_lowercase();
                VOCAB
                    .iter()
                    .map(|term| lowered.matches(term).count() as f32)
                    .collect()
            })
            .collect())
    }
}

/// Records every prompt and replies with a fixed text.
pub struct RecordingGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Server {
            status: 429,
            body: "rate limited".into(),
        })
    }
}

pub fn corpus() -> Vec<DocumentRecord> {
    vec![
        DocumentRecord::new("nda", "confidential confidential information"),
        DocumentRecord::new("msa", "services payment"),
        DocumentRecord::new("employment", "salary confidential"),
    ]
}

pub fn index() -> VectorIndex {
    let chunker = Chunker::new(1000, 100).unwrap();
    VectorIndex::build(chunker.chunk_all(&corpus()), &VocabEmbedder).unwrap()
}
