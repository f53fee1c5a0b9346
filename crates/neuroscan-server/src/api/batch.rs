//! Batch prediction readout: serves a precomputed artifact in the predict
//! response schema, enriched with explanations and knowledge payloads.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use neuroscan_core::TopPrediction;
use neuroscan_core::knowledge;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedContext;

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    #[serde(default)]
    include_qa: bool,
}

#[derive(Debug, Deserialize, Default)]
struct BatchRecord {
    #[serde(default)]
    label: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    top_k: Vec<TopPrediction>,
    #[serde(default)]
    probs: HashMap<String, f32>,
    #[serde(default)]
    image_size: Option<Value>,
    #[serde(default)]
    preprocessing: Option<Value>,
    #[serde(default)]
    cam_image: Option<String>,
}

pub async fn predict_batch(
    State(ctx): State<SharedContext>,
    Query(query): Query<BatchQuery>,
) -> ApiResult<Json<Value>> {
    let path = ctx
        .outputs_dir
        .join("batch")
        .join("batch_predictions.json");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| ApiError::NoBatchPredictions)?;
    let parsed: Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse batch predictions: {e}"))?;

    // The artifact is normally an array; tolerate a single object.
    let records: Vec<BatchRecord> = match parsed {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        single => serde_json::from_value(single).ok().into_iter().collect(),
    };

    let mut predictions = Vec::with_capacity(records.len());
    for record in records {
        let explanation = ctx
            .responder
            .explanation(&record.label, record.confidence, &record.top_k)
            .await;
        let qa = if query.include_qa {
            ctx.responder
                .suggested_qa(&record.label, record.confidence)
                .await
        } else {
            Vec::new()
        };

        predictions.push(json!({
            "model_type": "onnx",
            "is_scan": true,
            "label": record.label,
            "confidence": record.confidence,
            "top_k": record.top_k,
            "probs": record.probs,
            "image_size": record.image_size,
            "preprocessing": record.preprocessing,
            "cam_image": record.cam_image,
            "explanation": explanation,
            "medical_analysis": knowledge::tumor_analysis(&record.label, record.confidence),
            "medication_side_effects": knowledge::medication_side_effects(&record.label),
            "lifestyle_recommendations": knowledge::lifestyle_recommendations(&record.label),
            "qa": qa,
            "used_model": ctx.ensemble.as_ref().map(|e| e.model_name()),
            "models_evaluation": ctx.models_evaluation,
        }));
    }

    Ok(Json(json!({
        "count": predictions.len(),
        "predictions": predictions,
    })))
}
