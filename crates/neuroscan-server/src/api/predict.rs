//! Predict operation: gate the upload, run the ensemble, render saliency,
//! persist artifacts, and assemble the enriched response.

use std::collections::HashMap;
use std::path::Path;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use neuroscan_ai::{saliency, validate};
use neuroscan_chat::QaPair;
use neuroscan_core::knowledge::{self, TumorAnalysis};
use neuroscan_core::report::{self, ReportSection};
use neuroscan_core::{INVALID_IMAGE_SENTINEL, Role, TopPrediction};

use crate::api::{session_token, with_session_cookie};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppContext, SharedContext};

/// Fixed message returned (and stored as the prediction sentinel) for
/// rejected uploads.
const INVALID_IMAGE_MESSAGE: &str =
    "Please upload a valid brain MRI image. Only grayscale MRI scans are supported.";

#[derive(Serialize)]
struct ImageSize {
    width: u32,
    height: u32,
}

#[derive(Serialize)]
struct Preprocessing {
    input_shape: (u32, u32),
    scale: &'static str,
}

#[derive(Serialize)]
struct PredictResponse {
    model_type: &'static str,
    is_scan: bool,
    label: String,
    confidence: f64,
    top_k: Vec<TopPrediction>,
    probs: HashMap<String, f32>,
    image_size: ImageSize,
    preprocessing: Preprocessing,
    cam_image: String,
    session_id: String,
    explanation: String,
    explanation_messages: Vec<ReportSection>,
    medical_analysis: TumorAnalysis,
    medication_side_effects: Vec<&'static str>,
    lifestyle_recommendations: Vec<&'static str>,
    qa: Vec<QaPair>,
    used_model: String,
    models_evaluation: serde_json::Value,
}

pub async fn predict(
    State(ctx): State<SharedContext>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Response> {
    let bytes = read_image_field(&mut multipart).await?;
    let token = session_token(&headers);
    let ensemble = ctx.ensemble.as_ref().ok_or(ApiError::ModelUnavailable)?;

    // Undecodable uploads fail the domain gate, not the server.
    let Ok(image) = image::load_from_memory(&bytes) else {
        return invalid_image_response(&ctx, token.as_deref()).await;
    };
    if !validate::validate(&image) {
        return invalid_image_response(&ctx, token.as_deref()).await;
    }

    let outcome = ensemble.infer(&image)?;
    let prediction = outcome.prediction;
    let label = prediction.label.clone();
    let confidence = prediction.confidence as f64;

    let session_id = ctx.store.get_or_create(token.as_deref()).await;

    let cam_png = saliency::render_or_plain(&image, outcome.features.as_ref());
    let cam_b64 = BASE64.encode(&cam_png);

    let mut session = ctx.store.read(&session_id).await;
    session.record_prediction(label.clone(), confidence);
    session.push_turn(
        Role::Assistant,
        format!("Prediction: {label} (confidence: {confidence:.4})"),
    );
    ctx.store.write(&session_id, &session).await;

    let analysis = knowledge::tumor_analysis(&label, confidence);
    let explanation = ctx
        .responder
        .explanation(&label, confidence, &prediction.top_k)
        .await;
    let explanation_messages = report::prediction_messages(&label, confidence, &analysis);
    let qa = ctx.responder.suggested_qa(&label, confidence).await;

    let payload = PredictResponse {
        model_type: "onnx",
        is_scan: true,
        label: label.clone(),
        confidence,
        top_k: prediction.top_k,
        probs: prediction.probs,
        image_size: ImageSize {
            width: image.width(),
            height: image.height(),
        },
        preprocessing: Preprocessing {
            input_shape: outcome.input_size,
            scale: "pixel/255.0",
        },
        cam_image: cam_b64,
        session_id: session_id.clone(),
        explanation,
        explanation_messages,
        medical_analysis: analysis,
        medication_side_effects: knowledge::medication_side_effects(&label),
        lifestyle_recommendations: knowledge::lifestyle_recommendations(&label),
        qa,
        used_model: ensemble.model_name().to_string(),
        models_evaluation: ctx.models_evaluation.clone(),
    };

    persist_artifacts(&ctx.outputs_dir, &session_id, &payload, &cam_png).await;

    let response = Json(&payload).into_response();
    Ok(with_session_cookie(response, &session_id))
}

/// Reject the upload: store the sentinel prediction and answer 400.
async fn invalid_image_response(ctx: &AppContext, token: Option<&str>) -> ApiResult<Response> {
    let session_id = ctx.store.get_or_create(token).await;

    let mut session = ctx.store.read(&session_id).await;
    session.record_prediction(INVALID_IMAGE_SENTINEL, 0.0);
    ctx.store.write(&session_id, &session).await;

    let body = json!({
        "is_scan": false,
        "message": INVALID_IMAGE_MESSAGE,
        "confidence": 0.0,
        "models_evaluation": ctx.models_evaluation,
        "session_id": session_id,
    });
    let response = (StatusCode::BAD_REQUEST, Json(body)).into_response();
    Ok(with_session_cookie(response, &session_id))
}

/// Pull the `image` field out of the multipart body.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(ApiError::BadRequest(
        "missing 'image' upload field".to_string(),
    ))
}

/// Persist the response JSON and saliency image under the session's output
/// directory; failures never fail the request.
async fn persist_artifacts(
    outputs: &Path,
    session_id: &str,
    payload: &PredictResponse,
    cam_png: &[u8],
) {
    let dir = outputs.join(session_id);
    if let Err(err) = tokio::fs::create_dir_all(&dir).await {
        warn!(%err, dir = %dir.display(), "failed to create session output directory");
        return;
    }

    match serde_json::to_vec_pretty(payload) {
        Ok(raw) => {
            if let Err(err) = tokio::fs::write(dir.join("predict.json"), raw).await {
                warn!(%err, "failed to persist predict.json");
            }
        }
        Err(err) => warn!(%err, "failed to serialize predict payload"),
    }

    if let Err(err) = tokio::fs::write(dir.join("cam.png"), cam_png).await {
        warn!(%err, "failed to persist cam.png");
    }
}
