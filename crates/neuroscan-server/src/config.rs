//! Runtime configuration, parsed from CLI flags with environment fallbacks.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "neuroscan-server", about = "Brain MRI inference and explanation service")]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "NEUROSCAN_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Path to the primary ONNX classifier.
    #[arg(long, env = "NEUROSCAN_MODEL", default_value = "models/model.onnx")]
    pub model: PathBuf,

    /// Optional alternate classifier whose probabilities are averaged with
    /// the primary's.
    #[arg(long, env = "NEUROSCAN_ALT_MODEL")]
    pub alt_model: Option<PathBuf>,

    /// Class-index to label catalog.
    #[arg(long, env = "NEUROSCAN_LABELS", default_value = "models/labels.json")]
    pub labels: PathBuf,

    /// Optional model evaluation summary echoed in predict payloads.
    #[arg(
        long,
        env = "NEUROSCAN_MODELS_EVAL",
        default_value = "models/models_evaluation.json"
    )]
    pub models_evaluation: PathBuf,

    /// Directory for per-session artifacts and batch predictions.
    #[arg(long, env = "NEUROSCAN_OUTPUTS", default_value = "outputs")]
    pub outputs: PathBuf,

    /// Redis URL for durable sessions; the in-memory store is used when
    /// unset or unreachable.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Enable the delegated LLM chat path (still requires an API key).
    #[arg(
        long,
        env = "LLM_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub llm_enabled: bool,

    /// OpenAI-compatible API base URL.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// API key for the text-generation service; the LLM path stays disabled
    /// when unset.
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Model name for the text-generation service.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-3.5-turbo")]
    pub openai_model: String,

    /// Chat-path rate limit per session per minute.
    #[arg(long, env = "LLM_RATE_LIMIT_PER_MIN", default_value_t = 6)]
    pub rate_limit_per_min: u64,

    /// Canned QA table; defaults to `<outputs>/batch/global_qa.json`.
    #[arg(long, env = "NEUROSCAN_QA")]
    pub canned_qa: Option<PathBuf>,
}
