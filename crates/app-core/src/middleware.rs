//! Application middleware: the session gate for protected pages and a
//! request/response logger.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_cookies::Cookies;

use super::error::AppError;
use super::jwt::{Claims, TokenManager};

/// Cookie holding the signed session token.
pub const SESSION_COOKIE: &str = "__session";

/// Where unauthenticated traffic is sent.
pub const SIGNIN_PATH: &str = "/api/auth/signin";

impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))
    }
}

/// Gate for protected routes. A valid session cookie puts the verified
/// claims into request extensions; anything else redirects to the sign-in
/// page with `callbackUrl` set to the originally requested path.
pub async fn require_session(
    State(tm): State<Arc<dyn TokenManager>>,
    cookies: Cookies,
    req: Request<Body>,
    next: Next,
) -> Response {
    let claims = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| tm.validate_session_token(cookie.value()).ok());

    let Some(claims) = claims else {
        let return_to = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("callbackUrl", return_to)
            .finish();

        tracing::debug!(path = return_to, "No valid session, redirecting to sign-in");
        return Redirect::to(&format!("{SIGNIN_PATH}?{query}")).into_response();
    };

    let (mut parts, body) = req.into_parts();
    parts.extensions.insert(claims);
    let req = Request::from_parts(parts, body);

    next.run(req).await
}

pub async fn request_response_logger(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let start_time = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|id| id.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    req.extensions_mut().insert(request_id.clone());

    tracing::info!(
        request_id = request_id,
        method = %method,
        uri = %uri,
        version = ?version,
        "Incoming request"
    );

    let mut response = next.run(req).await;

    let duration = start_time.elapsed();
    let status = response.status();

    response.headers_mut().insert(
        HeaderName::from_static("x-request-id"),
        HeaderValue::from_str(request_id.as_str()).unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id")),
    );

    if status.is_server_error() {
        tracing::error!(
            request_id = request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            request_id = request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        tracing::info!(
            request_id = request_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = duration.as_millis(),
            "Request completed successfully"
        );
    }

    Ok(response)
}
