//! Chat operation: canned short-circuit, PII guard, rate limit, then the
//! responder.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use neuroscan_chat::{PII_REFUSAL, RATE_LIMITED_REPLY, contains_pii};
use neuroscan_core::Role;

use crate::api::{session_token, with_session_cookie};
use crate::error::ApiResult;
use crate::state::SharedContext;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    message: Option<String>,
}

pub async fn chat(
    State(ctx): State<SharedContext>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> ApiResult<Response> {
    let token = session_token(&headers);
    let session_id = ctx.store.get_or_create(token.as_deref()).await;
    let mut session = ctx.store.read(&session_id).await;
    let message = body.message.unwrap_or_default();

    // Canned answers short-circuit every other rule, including the guards.
    let reply = if let Some(canned) = ctx.responder.canned_reply(&message) {
        canned.to_string()
    } else if contains_pii(&message) {
        info!(%session_id, "PII detected in message");
        PII_REFUSAL.to_string()
    } else if !ctx
        .store
        .check_and_increment(&session_id, ctx.rate_limit)
        .await
    {
        info!(%session_id, "rate limit exceeded");
        RATE_LIMITED_REPLY.to_string()
    } else {
        ctx.responder
            .reply(
                &message,
                session.last_prediction.as_deref(),
                session.last_confidence,
            )
            .await
    };

    session.push_turn(Role::User, message);
    session.push_turn(Role::Assistant, reply.clone());
    ctx.store.write(&session_id, &session).await;

    let response = Json(json!({ "reply": reply })).into_response();
    Ok(with_session_cookie(response, &session_id))
}
