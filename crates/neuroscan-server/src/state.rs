//! Application context constructed once at startup and shared by every
//! handler; no ambient globals.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use neuroscan_ai::EnsembleAdapter;
use neuroscan_chat::{CannedQa, ChatResponder, LlmClient};
use neuroscan_core::LabelCatalog;
use neuroscan_store::SessionStore;

use crate::config::Config;

pub struct AppContext {
    /// Absent when no classifier could be loaded; predict reports
    /// service-unavailable in that case.
    pub ensemble: Option<EnsembleAdapter>,
    pub store: SessionStore,
    pub responder: ChatResponder,
    pub models_evaluation: serde_json::Value,
    pub outputs_dir: PathBuf,
    pub rate_limit: u64,
}

pub type SharedContext = Arc<AppContext>;

impl AppContext {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(match LabelCatalog::load(&config.labels) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(%err, "label catalog unavailable, falling back to class indices");
                LabelCatalog::default()
            }
        });

        let ensemble = build_ensemble(config, catalog);
        let store = build_store(config).await;

        let qa_path = config
            .canned_qa
            .clone()
            .unwrap_or_else(|| config.outputs.join("batch").join("global_qa.json"));
        let canned = CannedQa::load_or_builtin(&qa_path);

        let llm = if config.llm_enabled {
            config.openai_api_key.as_ref().map(|key| {
                LlmClient::new(
                    config.openai_base_url.clone(),
                    key.clone(),
                    config.openai_model.clone(),
                )
            })
        } else {
            None
        };
        if llm.is_none() {
            info!("LLM chat path disabled, using the rule-based responder");
        }
        let responder = ChatResponder::new(canned, llm);

        let models_evaluation = std::fs::read_to_string(&config.models_evaluation)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(|| serde_json::json!({}));

        Ok(Self {
            ensemble,
            store,
            responder,
            models_evaluation,
            outputs_dir: config.outputs.clone(),
            rate_limit: config.rate_limit_per_min,
        })
    }
}

#[cfg(feature = "onnx")]
fn build_ensemble(config: &Config, catalog: Arc<LabelCatalog>) -> Option<EnsembleAdapter> {
    use neuroscan_ai::{Classifier, OnnxClassifier};

    let primary = match OnnxClassifier::load(&config.model) {
        Ok(classifier) => Box::new(classifier),
        Err(err) => {
            warn!(%err, "failed to load primary classifier; predict will be unavailable");
            return None;
        }
    };

    let alternate = config.alt_model.as_ref().and_then(|path| {
        match OnnxClassifier::load(path) {
            Ok(classifier) => Some(Box::new(classifier) as Box<dyn Classifier>),
            Err(err) => {
                warn!(%err, "failed to load alternate classifier, continuing without it");
                None
            }
        }
    });

    Some(EnsembleAdapter::new(primary, alternate, catalog))
}

#[cfg(not(feature = "onnx"))]
fn build_ensemble(_config: &Config, _catalog: Arc<LabelCatalog>) -> Option<EnsembleAdapter> {
    warn!("built without the onnx feature; predict will be unavailable");
    None
}

async fn build_store(config: &Config) -> SessionStore {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        match neuroscan_store::RedisStore::connect(url).await {
            Ok(store) => return SessionStore::new(Box::new(store)),
            Err(err) => warn!(%err, "redis unavailable, falling back to in-memory sessions"),
        }
    }
    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        warn!("built without the redis feature, using in-memory sessions");
    }
    SessionStore::in_memory()
}
