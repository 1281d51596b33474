//! HTTP routes.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, RawQuery, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use callgate_domain::{InvocationRequest, InvocationResult, RequestMethod};

use crate::app::App;
use crate::infrastructure::config::AppConfig;

/// Header set on refresh responses so the client re-renders its state.
pub const REFRESH_HEADER: HeaderName = HeaderName::from_static("x-callgate-refresh");

/// Create all HTTP routes.
pub fn routes(config: &AppConfig) -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route(
            &config.callback_path,
            get(callback)
                .post(callback)
                .layer(DefaultBodyLimit::max(config.max_body_bytes)),
        )
        .fallback(not_found)
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

// =============================================================================
// Callback Dispatch
// =============================================================================

async fn callback(
    State(app): State<Arc<App>>,
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> CallbackResponse {
    let request = invocation_request(&method, query.as_deref(), &headers, &body);
    CallbackResponse(app.use_cases.callback.dispatcher.dispatch(request).await)
}

/// Collect query and form parameters plus the raw body.
///
/// The body is kept as bytes; it is only decoded if the callback asks for it.
fn invocation_request(
    method: &Method,
    query: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> InvocationRequest {
    let mut request = InvocationRequest::new(RequestMethod::parse(method.as_str()));

    if let Some(query) = query {
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            request.push_param(name, value);
        }
    }

    if is_form(headers) {
        for (name, value) in url::form_urlencoded::parse(body) {
            request.push_param(name, value);
        }
    }

    if !body.is_empty() {
        request.body = Some(body.to_vec());
    }

    request
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Transport rendering of an [`InvocationResult`].
pub struct CallbackResponse(pub InvocationResult);

impl IntoResponse for CallbackResponse {
    fn into_response(self) -> Response {
        match self.0 {
            InvocationResult::Value { mime_type, body } => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, format!("{mime_type}; charset=utf-8"))],
                body,
            )
                .into_response(),
            InvocationResult::Refresh => (StatusCode::OK, [(REFRESH_HEADER, "1")]).into_response(),
            InvocationResult::Acknowledged => StatusCode::NO_CONTENT.into_response(),
            InvocationResult::Fail { status, message } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, message).into_response()
            }
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }
}
