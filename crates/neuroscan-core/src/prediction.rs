//! Classifier output passed between the ensemble adapter and the orchestrator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One `(label, probability)` entry of the top-k ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPrediction {
    pub label: String,
    pub probability: f32,
}

/// Result of classifying one image.
///
/// `confidence` always equals `probs[label]`. When two models are ensembled
/// the probabilities are elementwise means of the constituent vectors and are
/// deliberately not renormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    /// Highest-probability entries, descending; ties broken by class index.
    pub top_k: Vec<TopPrediction>,
    /// Label → probability over every class.
    pub probs: HashMap<String, f32>,
}
