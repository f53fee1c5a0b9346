//! Canned question/answer table, consulted before every other chat rule.
//!
//! Questions are normalized (lowercase, non-alphanumerics stripped,
//! whitespace collapsed) both at load time and at lookup. An exact match
//! short-circuits; otherwise the closest entry above a similarity threshold
//! wins.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use strsim::normalized_levenshtein;
use thiserror::Error;
use tracing::info;

/// Minimum normalized Levenshtein similarity for a fuzzy hit.
const FUZZY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Error)]
pub enum CannedQaError {
    #[error("failed to read canned QA file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse canned QA file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct QaEntry {
    question: String,
    answer: String,
}

/// Static table of normalized questions mapped to fixed answers.
#[derive(Debug, Clone, Default)]
pub struct CannedQa {
    entries: HashMap<String, String>,
}

impl CannedQa {
    /// Built-in answers about the assistant itself.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            normalize("what is this"),
            "This is a brain tumor detection assistant.".to_string(),
        );
        entries.insert(
            normalize("how does it work"),
            "Upload a brain MRI image for analysis using AI models.".to_string(),
        );
        entries.insert(
            normalize("is this accurate"),
            "This is for research purposes only; consult a doctor for medical advice."
                .to_string(),
        );
        Self { entries }
    }

    /// Load a `[{question, answer}]` JSON file, replacing the built-in table.
    pub fn load(path: &Path) -> Result<Self, CannedQaError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: Vec<QaEntry> = serde_json::from_str(&raw)?;
        let entries: HashMap<String, String> = parsed
            .into_iter()
            .filter(|e| !e.question.is_empty() && !e.answer.is_empty())
            .map(|e| (normalize(&e.question), e.answer))
            .collect();
        info!(count = entries.len(), path = %path.display(), "loaded canned QA table");
        Ok(Self { entries })
    }

    /// Load from `path` when it exists, otherwise fall back to the built-in
    /// table.
    pub fn load_or_builtin(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(qa) => return qa,
                Err(err) => tracing::warn!(%err, "canned QA load failed, using built-in table"),
            }
        }
        Self::builtin()
    }

    /// Answer for a message: exact normalized match first, then the best
    /// fuzzy match at or above the threshold.
    pub fn lookup(&self, message: &str) -> Option<&str> {
        let norm = normalize(message);
        if norm.is_empty() {
            return None;
        }
        if let Some(answer) = self.entries.get(&norm) {
            return Some(answer);
        }

        self.entries
            .iter()
            .map(|(question, answer)| (normalized_levenshtein(&norm, question), answer))
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, answer)| answer.as_str())
    }
}

/// Lowercase, strip non-alphanumerics, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
