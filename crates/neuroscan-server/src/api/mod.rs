//! HTTP surface: routing, session cookie handling, and the health probe.

mod batch;
mod chat;
mod explain;
mod predict;
mod session;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedContext;

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE: &str = "session_id";

/// Upload size ceiling for the multipart predict body.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict::predict))
        .route("/predict/batch", get(batch::predict_batch))
        .route("/chat", post(chat::chat))
        .route("/session", get(session::get_session))
        .route("/explain", post(explain::explain))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Extract the session token from the request's cookie header.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// Attach the session cookie to an outgoing response.
pub(crate) fn with_session_cookie(mut response: Response, token: &str) -> Response {
    let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn session_token_parses_cookie_header() {
        let headers = headers_with_cookie("session_id=abc-123");
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn session_token_finds_cookie_among_others() {
        let headers = headers_with_cookie("theme=dark; session_id=tok; lang=en");
        assert_eq!(session_token(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn session_token_absent_or_empty() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let headers = headers_with_cookie("session_id=");
        assert_eq!(session_token(&headers), None);
        let headers = headers_with_cookie("other=1");
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_round_trips_through_response() {
        let response = with_session_cookie(StatusCode::OK.into_response(), "tok-9");
        let set = response.headers().get(header::SET_COOKIE).unwrap();
        let set = set.to_str().unwrap();
        assert!(set.starts_with("session_id=tok-9"));
        assert!(set.contains("HttpOnly"));
    }
}
