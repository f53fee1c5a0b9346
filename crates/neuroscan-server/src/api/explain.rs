//! Explain operation: the five-section report for the last prediction,
//! restricted to the closed set of valid labels.

use std::path::Path;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use neuroscan_core::labels::is_explainable;
use neuroscan_core::report;
use neuroscan_core::{Role, is_invalid_label};

use crate::api::session_token;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedContext;

pub async fn explain(
    State(ctx): State<SharedContext>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let token = session_token(&headers).ok_or(ApiError::NoSession)?;

    if !ctx.store.check_and_increment(&token, ctx.rate_limit).await {
        return Err(ApiError::RateLimited);
    }

    let mut session = ctx.store.read(&token).await;
    let mut last_prediction = session.last_prediction.clone();
    let mut last_confidence = session.last_confidence;

    // Sessions that predate a restart may only have the persisted artifact.
    if last_prediction.is_none() {
        if let Some((label, confidence)) =
            read_persisted_prediction(&ctx.outputs_dir, &token).await
        {
            last_prediction = Some(label);
            last_confidence = last_confidence.or(confidence);
        }
    }

    let Some(label) = last_prediction else {
        return Err(ApiError::NoPrediction);
    };
    if is_invalid_label(&label) {
        return Err(ApiError::InvalidImage);
    }
    if !is_explainable(&label) {
        return Err(ApiError::InvalidPrediction);
    }

    let sections = report::explanation_sections(&label, last_confidence.unwrap_or(0.0));

    session.push_turn(
        Role::Assistant,
        format!(
            "Comprehensive Explanation Report\n\n{}",
            report::render_plain(&sections)
        ),
    );
    ctx.store.write(&token, &session).await;

    Ok(Json(json!({ "explanation_sections": sections })))
}

/// Recover label and confidence from the persisted `predict.json`, if any.
async fn read_persisted_prediction(outputs: &Path, session_id: &str) -> Option<(String, Option<f64>)> {
    let path = outputs.join(session_id).join("predict.json");
    let raw = tokio::fs::read_to_string(&path).await.ok()?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    let label = value.get("label")?.as_str()?.to_string();
    let confidence = value.get("confidence").and_then(Value::as_f64);
    Some((label, confidence))
}
