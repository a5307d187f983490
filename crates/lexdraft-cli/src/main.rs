mod display;
mod index;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lexdraft_ai::{
    ChatGenerator, DEFAULT_LANGUAGETOOL_URL, Embedder, GeneratorConfig, LanguageToolChecker,
    Provider, Scorer,
};
use lexdraft_core::keywords::expand_category;
use lexdraft_core::{
    ContractParams, Embed, GeneratedResult, KeywordRegistry, PipelineConfig, QueryRequest,
};
use lexdraft_pipeline::{HistoryLog, Language, RagPipeline};
use lexdraft_store::{Chunker, VectorIndex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Retrieval-augmented contract drafting, translation and quality scoring
#[derive(Parser)]
#[command(name = "lexdraft")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration file (JSON); missing fields take defaults
    #[arg(long, global = true, env = "LEXDRAFT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the persisted index
    #[arg(long, global = true, env = "LEXDRAFT_INDEX_DIR", default_value = "vector_index")]
    index_dir: PathBuf,

    /// Reference contract corpus
    #[arg(long, global = true, env = "LEXDRAFT_CORPUS_DIR", default_value = "templates")]
    corpus_dir: PathBuf,

    /// Embedding model directory (model.onnx + tokenizer.json)
    #[arg(
        long,
        global = true,
        env = "LEXDRAFT_MODEL_DIR",
        default_value = "models/all-MiniLM-L6-v2"
    )]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed and persist the reference corpus
    Index,

    /// Show the chunks retrieved for a query
    Search {
        query: String,
        /// Number of chunks (defaults to the configured top_k)
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Answer a free-form question from the reference corpus
    Ask {
        question: String,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Draft a contract template
    Draft {
        /// Contract category or alias (NDA, MSA, Employment, Sponsorship)
        #[arg(long)]
        category: String,
        #[arg(long)]
        jurisdiction: Option<String>,
        #[arg(long)]
        governing_law: Option<String>,
        #[arg(long)]
        value: Option<f64>,
        /// YYYY-MM-DD
        #[arg(long)]
        effective_date: Option<NaiveDate>,
        /// Folder of the client's own contracts to match their style
        #[arg(long)]
        client_dir: Option<PathBuf>,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Translate a contract using the corpus for terminology
    Translate {
        /// Plain-text contract to translate
        file: PathBuf,
        /// Target language name or ISO code
        #[arg(short, long)]
        language: Language,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Revise a previous result with feedback
    Revise {
        correction: String,
        /// Result to revise (defaults to the latest)
        #[arg(long)]
        id: Option<Uuid>,
        #[command(flatten)]
        llm: LlmArgs,
        #[command(flatten)]
        out: OutputArgs,
    },

    /// Compute the ACTQM quality score of a contract
    Score {
        file: PathBuf,
        #[arg(long)]
        category: String,
        /// Category → required keywords (JSON)
        #[arg(
            long,
            env = "LEXDRAFT_KEYWORDS",
            default_value = "contract_clause_keyword.json"
        )]
        keywords: PathBuf,
        /// Grammar penalty factor in [0, 1] (defaults to the configured value)
        #[arg(long)]
        penalty: Option<f64>,
        #[arg(long, env = "LANGUAGETOOL_URL", default_value = DEFAULT_LANGUAGETOOL_URL)]
        languagetool_url: String,
    },

    /// List generated results, or one revision chain
    History {
        #[arg(long)]
        chain: Option<Uuid>,
        #[arg(long, env = "LEXDRAFT_HISTORY", default_value = "lexdraft_history.json")]
        history: PathBuf,
    },
}

#[derive(Args)]
struct LlmArgs {
    /// openai (also OpenRouter and other compatible APIs) or azure
    #[arg(long, env = "LEXDRAFT_LLM_PROVIDER", default_value = "openai")]
    provider: Provider,
    #[arg(long, env = "LEXDRAFT_LLM_BASE_URL", default_value = "https://api.openai.com")]
    base_url: String,
    #[arg(long = "llm-model", env = "LEXDRAFT_LLM_MODEL", default_value = "gpt-4o-mini")]
    model: String,
    /// Azure deployment name (defaults to the model name)
    #[arg(long, env = "LEXDRAFT_LLM_DEPLOYMENT")]
    deployment: Option<String>,
    #[arg(long, env = "LEXDRAFT_LLM_API_VERSION", default_value = "2025-01-01-preview")]
    api_version: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,
    #[arg(long, default_value_t = 0.3)]
    temperature: f32,
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

impl From<LlmArgs> for GeneratorConfig {
    fn from(args: LlmArgs) -> Self {
        Self {
            provider: args.provider,
            base_url: args.base_url,
            deployment: args.deployment,
            api_version: args.api_version,
            model: args.model,
            api_key: args.api_key,
            temperature: args.temperature,
            timeout_secs: args.timeout_secs,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Write the generated text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, env = "LEXDRAFT_HISTORY", default_value = "lexdraft_history.json")]
    history: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    info!("lexdraft v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;

    match cli.command {
        Command::Index => {
            let embedder = load_embedder(&cli.model_dir, &config)?;
            eprintln!("Indexing {} → {}", cli.corpus_dir.display(), cli.index_dir.display());
            let stats = index::run_index_pipeline(
                &cli.corpus_dir,
                &cli.index_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            eprintln!(
                "Indexed {} documents ({} chunks) in {:.1}s",
                stats.documents, stats.chunks, stats.elapsed_secs
            );
        }
        Command::Search { query, k } => {
            let embedder = load_embedder(&cli.model_dir, &config)?;
            let index = open_index(
                &cli.index_dir,
                &cli.corpus_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            let hits = index.query(&query, k.unwrap_or(config.top_k), embedder.as_ref())?;
            display::print_hits(&hits)?;
        }
        Command::Ask { question, llm, out } => {
            let embedder = load_embedder(&cli.model_dir, &config)?;
            let index = open_index(
                &cli.index_dir,
                &cli.corpus_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            let rag = pipeline(llm, embedder, config)?;
            let result = rag.answer(&QueryRequest::new(question), &index).await?;
            emit(result, &out)?;
        }
        Command::Draft {
            category,
            jurisdiction,
            governing_law,
            value,
            effective_date,
            client_dir,
            llm,
            out,
        } => {
            let embedder = load_embedder(&cli.model_dir, &config)?;
            let index = open_index(
                &cli.index_dir,
                &cli.corpus_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            let rag = pipeline(llm, embedder, config)?;

            let style = match &client_dir {
                Some(dir) => {
                    eprintln!("Analysing client style in {}", dir.display());
                    Some(rag.analyze_client_style(dir, &chunker).await?)
                }
                None => None,
            };
            let params = ContractParams {
                category: None,
                jurisdiction,
                governing_law,
                contract_value: value,
                effective_date,
            };
            let request = RagPipeline::template_request(&category, params, style.as_deref());
            let result = rag.answer(&request, &index).await?;
            emit(result, &out)?;
        }
        Command::Translate {
            file,
            language,
            llm,
            out,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let embedder = load_embedder(&cli.model_dir, &config)?;
            let index = open_index(
                &cli.index_dir,
                &cli.corpus_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            let rag = pipeline(llm, embedder, config)?;
            let result = rag.translate(&text, language, &index).await?;
            emit(result, &out)?;
        }
        Command::Revise {
            correction,
            id,
            llm,
            out,
        } => {
            let history = HistoryLog::load(&out.history)?;
            let previous = match id {
                Some(id) => history
                    .get(id)
                    .with_context(|| format!("no history entry {id}"))?,
                None => history
                    .latest()
                    .context("history is empty; nothing to revise")?,
            }
            .clone();

            let embedder = load_embedder(&cli.model_dir, &config)?;
            let index = open_index(
                &cli.index_dir,
                &cli.corpus_dir,
                &chunker,
                embedder.as_ref(),
                config.embed_batch_size,
            )?;
            let rag = pipeline(llm, embedder, config)?;
            let result = rag.revise(&previous, &correction, &index).await?;
            emit(result, &out)?;
        }
        Command::Score {
            file,
            category,
            keywords,
            penalty,
            languagetool_url,
        } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let registry = KeywordRegistry::from_json_file(&keywords)?;
            let category = match registry.required(&category) {
                Ok(_) => category,
                Err(_) => expand_category(&category),
            };
            let scorer =
                Scorer::with_rule_segmenter(Arc::new(LanguageToolChecker::new(&languagetool_url)));
            let report = scorer
                .score(
                    &text,
                    &category,
                    &registry,
                    penalty.unwrap_or(config.penalty_factor),
                )
                .await?;
            display::print_report(&category, &report);
        }
        Command::History { chain, history } => {
            let log = HistoryLog::load(&history)?;
            match chain {
                Some(id) => display::print_history(log.revision_chain(id)?)?,
                None => display::print_history(log.iter())?,
            }
        }
    }

    Ok(())
}

fn load_embedder(model_dir: &Path, config: &PipelineConfig) -> anyhow::Result<Arc<dyn Embed>> {
    let embedder = Embedder::load(model_dir)
        .with_context(|| format!("loading embedding model from {}", model_dir.display()))?;
    if embedder.model_name() != config.embedding_model {
        warn!(
            configured = %config.embedding_model,
            loaded = embedder.model_name(),
            "embedding model differs from configuration"
        );
    }
    Ok(Arc::new(embedder))
}

fn open_index(
    index_dir: &Path,
    corpus_dir: &Path,
    chunker: &Chunker,
    embedder: &dyn Embed,
    batch_size: usize,
) -> anyhow::Result<VectorIndex> {
    VectorIndex::open_or_build(index_dir, corpus_dir, chunker, embedder, batch_size)
        .with_context(|| format!("opening index in {}", index_dir.display()))
}

fn pipeline(
    llm: LlmArgs,
    embedder: Arc<dyn Embed>,
    config: PipelineConfig,
) -> anyhow::Result<RagPipeline> {
    let generator = ChatGenerator::new(llm.into())?;
    Ok(RagPipeline::new(Arc::new(generator), embedder, config))
}

/// Write the result, then append it to the history log.
fn emit(result: GeneratedResult, out: &OutputArgs) -> anyhow::Result<()> {
    match &out.output {
        Some(path) => {
            std::fs::write(path, &result.text)
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{}", result.text),
    }

    let id = result.id;
    let mut history = HistoryLog::load(&out.history)?;
    history.push(result)?;
    history.persist(&out.history)?;
    eprintln!("Saved as {id} in {}", out.history.display());
    Ok(())
}
