use app_core::error::AppError;
use app_core::extractors::AppQuery;
use app_core::jwt::Claims;
use askama::Template;
use axum::debug_handler;
use axum::extract::State;
use axum::response::Html;

use crate::inbound::http::authn::sanitize_callback_url;
use crate::inbound::model::prelude::*;
use crate::inbound::state::AuthState;

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate;

#[derive(Template)]
#[template(path = "signin.html")]
struct SigninTemplate {
    callback_url: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    user: Option<DashboardView>,
}

/// Everything the dashboard template renders for a signed-in user.
struct DashboardView {
    display_name: String,
    profile_image_url: Option<String>,
    record_json: String,
}

#[debug_handler]
pub async fn index() -> Result<Html<String>, AppError> {
    Ok(Html(IndexTemplate.render()?))
}

#[debug_handler]
pub async fn signin_page(AppQuery(query): AppQuery<SigninPageQuery>) -> Result<Html<String>, AppError> {
    let template = SigninTemplate {
        callback_url: sanitize_callback_url(query.callback_url),
        error: query.error,
    };

    Ok(Html(template.render()?))
}

#[debug_handler]
pub async fn dashboard(State(state): State<AuthState>, claims: Claims) -> Result<Html<String>, AppError> {
    let user = match state.profile.stored_profile(&claims.sub).await {
        Ok(Some(user)) => {
            let record_json = serde_json::to_string_pretty(&user)?;
            Some(DashboardView {
                display_name: user.display_name().to_string(),
                profile_image_url: user.profile_image_url.clone(),
                record_json,
            })
        },
        Ok(None) => {
            tracing::warn!(user_id = %claims.sub, "No stored profile for signed-in user");
            None
        },
        // The page degrades to its failure message; the cause stays in the logs.
        Err(err) => {
            tracing::error!(user_id = %claims.sub, "Failed to load stored profile: {:?}", err);
            None
        },
    };

    Ok(Html(DashboardTemplate { user }.render()?))
}
