use app_core::error::AppError;
use app_core::extractors::{AppForm, AppPath, AppQuery};
use app_core::middleware::{SESSION_COOKIE, SIGNIN_PATH};
use app_core::response::Response;
use axum::debug_handler;
use axum::extract::State;
use axum::response::Redirect;
use serde_json::json;
use tower_cookies::cookie::{SameSite, time};
use tower_cookies::{Cookie, Cookies};

use crate::domain::inout::prelude::*;
use crate::inbound::model::prelude::*;
use crate::inbound::state::AuthState;

const COOKIE_OAUTH_STATE: &str = "__oauth_state";
const KEY_OAUTH_STATE_CSRF: &str = "csrf_token";
const KEY_OAUTH_STATE_CALLBACK: &str = "callback_url";
const DEFAULT_CALLBACK_URL: &str = "/dashboard";

/// Only local paths are honoured as post-login destinations; anything else
/// falls back to the dashboard.
pub(crate) fn sanitize_callback_url(candidate: Option<String>) -> String {
    candidate
        .filter(|url| url.starts_with('/') && !url.starts_with("//"))
        .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string())
}

fn session_cookie(token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .same_site(SameSite::Lax)
        .build()
}

#[debug_handler]
pub async fn oauth_start(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppPath(provider): AppPath<String>,
    AppQuery(query): AppQuery<OAuthStartQuery>,
) -> Result<Redirect, AppError> {
    let callback_url = sanitize_callback_url(query.callback_url);

    let output = state.signin.oauth_start(OAuthStartInput { provider }).await?;

    let oauth_state = json!({
        KEY_OAUTH_STATE_CSRF: output.csrf_token,
        KEY_OAUTH_STATE_CALLBACK: callback_url,
    });
    let value = serde_json::to_string(&oauth_state)?;

    let cookie = Cookie::build((COOKIE_OAUTH_STATE, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .max_age(time::Duration::minutes(10))
        .same_site(SameSite::Lax)
        .build();

    cookies.private(&state.cookie_key).add(cookie);

    Ok(Redirect::to(&output.auth_url))
}

#[debug_handler]
pub async fn oauth_callback(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppPath(provider): AppPath<String>,
    AppQuery(query): AppQuery<OAuthCallbackRequest>,
) -> Result<Redirect, AppError> {
    if let Some(err) = query.error {
        return Err(AppError::Forbidden(format!("OAuth authentication failed: {err}")));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::Forbidden("Missing authorization code".to_string()))?;
    let returned_state = query
        .state
        .ok_or_else(|| AppError::Forbidden("Missing state parameter".to_string()))?;

    let oauth_state_cookie = cookies
        .private(&state.cookie_key)
        .get(COOKIE_OAUTH_STATE)
        .ok_or_else(|| AppError::Forbidden("OAuth session expired or invalid".to_string()))?;

    cookies.private(&state.cookie_key).remove(Cookie::new(COOKIE_OAUTH_STATE, ""));

    let oauth_state: serde_json::Value = serde_json::from_str(oauth_state_cookie.value())
        .map_err(|_| AppError::Forbidden("Invalid OAuth state format".to_string()))?;

    let stored_csrf_token = oauth_state
        .get(KEY_OAUTH_STATE_CSRF)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::Forbidden("Invalid OAuth state structure".to_string()))?;

    if returned_state != stored_csrf_token {
        return Err(AppError::Forbidden("Invalid OAuth state token".to_string()));
    }

    let callback_url = oauth_state
        .get(KEY_OAUTH_STATE_CALLBACK)
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_CALLBACK_URL)
        .to_string();

    let output = state.signin.oauth_callback(OAuthCallbackInput { provider, code }).await?;

    let max_age_secs = state.config.get::<i64>("session.max_age_secs")?;
    cookies.add(session_cookie(output.session_token, max_age_secs));

    Ok(Redirect::to(&callback_url))
}

#[debug_handler]
pub async fn credentials_callback(
    State(state): State<AuthState>,
    cookies: Cookies,
    AppForm(req): AppForm<CredentialsRequest>,
) -> Result<Redirect, AppError> {
    let callback_url = sanitize_callback_url(req.callback_url);

    let input = CredentialsInput { username: req.username, password: req.password };

    match state.signin.credentials_sign_in(input).await {
        Ok(output) => {
            let max_age_secs = state.config.get::<i64>("session.max_age_secs")?;
            cookies.add(session_cookie(output.session_token, max_age_secs));

            Ok(Redirect::to(&callback_url))
        },
        // Bad credentials land back on the sign-in form without detail.
        Err(AppError::Unauthorized(_)) | Err(AppError::Validation(_)) | Err(AppError::ValidationStr(_)) => {
            let query: String = form_urlencoded::Serializer::new(String::new())
                .append_pair("error", "CredentialsSignin")
                .append_pair("callbackUrl", &callback_url)
                .finish();

            Ok(Redirect::to(&format!("{SIGNIN_PATH}?{query}")))
        },
        Err(err) => Err(err),
    }
}

#[debug_handler]
pub async fn signout(cookies: Cookies) -> Redirect {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookies.remove(removal);

    Redirect::to("/")
}

#[debug_handler]
pub async fn session(State(state): State<AuthState>, cookies: Cookies) -> Response<SessionResponse> {
    let user = cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.token.validate_session_token(cookie.value()).ok())
        .map(|claims| state.signin.session_from_claims(&claims));

    Response::from(SessionResponse { user })
}
