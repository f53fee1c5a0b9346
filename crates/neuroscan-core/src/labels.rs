//! Class-index → label-name catalog, loaded once at startup.
//!
//! The catalog is a flat JSON object mapping class indices (as strings) to
//! human-readable names, e.g. `{"0": "glioma_tumor", "1": "meningioma_tumor"}`.
//! It is read-only for the lifetime of the process.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::info;

/// Labels the explain operation accepts. Anything else, including the
/// invalid-image sentinel, is rejected with a client error.
pub const EXPLAINABLE_LABELS: &[&str] =
    &["glioma_tumor", "meningioma_tumor", "pituitary_tumor", "no_tumor"];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read label catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse label catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Static class-index → label lookup.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    labels: HashMap<String, String>,
}

impl LabelCatalog {
    /// Load the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let labels: HashMap<String, String> = serde_json::from_str(&raw)?;
        info!(count = labels.len(), path = %path.display(), "loaded label catalog");
        Ok(Self { labels })
    }

    /// Build a catalog from an in-memory mapping.
    pub fn from_map(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }

    /// Label for a class index; the index rendered as a string when unmapped.
    pub fn name(&self, index: usize) -> String {
        self.labels
            .get(&index.to_string())
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// True when `label` belongs to the closed set the explain operation serves.
pub fn is_explainable(label: &str) -> bool {
    let lower = label.to_lowercase();
    EXPLAINABLE_LABELS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LabelCatalog {
        let mut m = HashMap::new();
        m.insert("0".to_string(), "no_tumor".to_string());
        m.insert("1".to_string(), "glioma".to_string());
        LabelCatalog::from_map(m)
    }

    #[test]
    fn name_resolves_known_index() {
        assert_eq!(catalog().name(1), "glioma");
    }

    #[test]
    fn name_falls_back_to_index_string() {
        assert_eq!(catalog().name(7), "7");
    }

    #[test]
    fn explainable_set_is_closed() {
        assert!(is_explainable("glioma_tumor"));
        assert!(is_explainable("Pituitary_Tumor"));
        assert!(is_explainable("no_tumor"));
        assert!(!is_explainable("invalid image"));
        assert!(!is_explainable("glioma"));
    }
}
