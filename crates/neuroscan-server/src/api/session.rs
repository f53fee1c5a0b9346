//! Read-only session introspection.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use crate::api::session_token;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedContext;

pub async fn get_session(
    State(ctx): State<SharedContext>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let token = session_token(&headers).ok_or(ApiError::SessionNotFound)?;
    let session = ctx.store.read(&token).await;
    Ok(Json(json!({
        "session_id": token,
        "session": session,
    })))
}
