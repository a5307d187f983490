//! Retrieval-augmented generation over the contract index.
//!
//! Every request follows the same shape: retrieve the top-k chunks for the
//! rendered request, "stuff" them into a single prompt, and make exactly one
//! generator call. The pipeline holds no per-call state.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use lexdraft_ai::Generator;
use lexdraft_core::keywords::expand_category;
use lexdraft_core::{ContractParams, Embed, GeneratedResult, PipelineConfig, QueryRequest};
use lexdraft_store::{Chunker, ScoredChunk, StoreError, VectorIndex, require_documents};
use tracing::{debug, info};

use crate::PipelineError;

pub const STYLE_ANALYSIS_INSTRUCTION: &str = "Analyze the client's contract style. Extract common clause types, writing tone, preferred keywords, and jurisdiction references. Return them in bullet points.";

/// Assemble the single "stuff" prompt from retrieved context and the request.
pub fn stuff_prompt(context: &str, request: &str) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\
         \n\n{context}\n\nQuestion: {request}\nHelpful Answer:"
    )
}

/// Retrieved chunk texts, best match first, separated by blank lines.
fn join_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Target languages for contract translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    German,
    Spanish,
    French,
    Dutch,
    English,
    Chinese,
    Japanese,
    Italian,
    Portuguese,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Self::German,
        Self::Spanish,
        Self::French,
        Self::Dutch,
        Self::English,
        Self::Chinese,
        Self::Japanese,
        Self::Italian,
        Self::Portuguese,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::French => "French",
            Self::Dutch => "Dutch",
            Self::English => "English",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Italian => "Italian",
            Self::Portuguese => "Portuguese",
        }
    }

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Self::German => "de",
            Self::Spanish => "es",
            Self::French => "fr",
            Self::Dutch => "nl",
            Self::English => "en",
            Self::Chinese => "zh",
            Self::Japanese => "ja",
            Self::Italian => "it",
            Self::Portuguese => "pt",
        }
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.name().eq_ignore_ascii_case(s) || l.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| PipelineError::UnknownLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Retrieval-augmented generation pipeline.
#[derive(Clone)]
pub struct RagPipeline {
    generator: Arc<dyn Generator>,
    embedder: Arc<dyn Embed>,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embed>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            generator,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn embedder(&self) -> &dyn Embed {
        self.embedder.as_ref()
    }

    /// The `top_k` chunks most similar to `text`.
    pub fn retrieve(&self, text: &str, index: &VectorIndex) -> Result<Vec<ScoredChunk>, StoreError> {
        index.query(text, self.config.top_k, self.embedder.as_ref())
    }

    /// Build the prompt `answer` would send for `request`.
    pub fn prompt_for(
        &self,
        request: &QueryRequest,
        index: &VectorIndex,
    ) -> Result<String, PipelineError> {
        let rendered = request.render();
        let hits = self.retrieve(&rendered, index)?;
        debug!(
            retrieved = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved context"
        );
        Ok(stuff_prompt(&join_context(&hits), &rendered))
    }

    /// Answer `request` from the retrieved context with one generator call.
    pub async fn answer(
        &self,
        request: &QueryRequest,
        index: &VectorIndex,
    ) -> Result<GeneratedResult, PipelineError> {
        let prompt = self.prompt_for(request, index)?;
        let text = self.generator.generate(&prompt).await?;
        let result = GeneratedResult::new(text, request.clone());
        info!(id = %result.id, chars = result.text.len(), "generated answer");
        Ok(result)
    }

    /// The drafting request for a contract template of `category`.
    ///
    /// Short aliases such as `NDA` are expanded. When a client style profile
    /// is given the template is asked to follow it.
    pub fn template_request(
        category: &str,
        params: ContractParams,
        style: Option<&str>,
    ) -> QueryRequest {
        let category = expand_category(category);
        let mut instruction = format!("Create a detailed contract template for {category}.");
        if let Some(style) = style.map(str::trim).filter(|s| !s.is_empty()) {
            instruction.push_str(&format!(
                " Make sure that the generated template is based on {style}."
            ));
        }
        instruction.push_str(
            " Make sure it is formal, general-purpose, and does not include any party names.",
        );
        QueryRequest::new(instruction).with_params(ContractParams {
            category: Some(category),
            ..params
        })
    }

    /// Summarise the drafting style of a client's own contracts.
    ///
    /// Builds a throwaway index over `client_dir` and asks for a style
    /// profile. Fails before any generator call when the folder holds no
    /// readable documents, or only documents with no text.
    pub async fn analyze_client_style(
        &self,
        client_dir: &Path,
        chunker: &Chunker,
    ) -> Result<String, PipelineError> {
        let docs = require_documents(client_dir).map_err(|e| match e {
            StoreError::EmptyCorpus(path) => PipelineError::EmptyCorpus(path),
            other => PipelineError::Retrieval(other),
        })?;
        let chunks = chunker.chunk_all(&docs);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyCorpus(client_dir.to_path_buf()));
        }
        let index = VectorIndex::build_batched(
            chunks,
            self.embedder.as_ref(),
            self.config.embed_batch_size,
        )?;
        info!(
            documents = docs.len(),
            chunks = index.len(),
            dir = %client_dir.display(),
            "indexed client documents"
        );
        let profile = self
            .answer(&QueryRequest::new(STYLE_ANALYSIS_INSTRUCTION), &index)
            .await?;
        Ok(profile.text)
    }

    /// Translate a contract, grounding terminology in the reference index.
    pub async fn translate(
        &self,
        document_text: &str,
        language: Language,
        index: &VectorIndex,
    ) -> Result<GeneratedResult, PipelineError> {
        let target = language.name().to_uppercase();
        let instruction = format!(
            "Translate the following contract into {target} using similar legal structure \
             and terminology as seen in the reference documents:\n\n{document_text}"
        );
        self.answer(&QueryRequest::new(instruction), index).await
    }
}
