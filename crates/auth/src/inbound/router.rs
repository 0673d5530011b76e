use std::sync::Arc;

use app_core::jwt::TokenManager;
use app_core::middleware::require_session;
use axum::routing::{get, post};
use axum::{Router, middleware};

use crate::inbound::http::authn::*;
use crate::inbound::http::pages::*;
use crate::inbound::state::AuthState;

pub fn create_router(state: AuthState, tm: Arc<dyn TokenManager>) -> Router {
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(tm, require_session));

    let public_routes = Router::new()
        .route("/", get(index))
        .route("/api/auth/signin", get(signin_page))
        .route("/api/auth/signin/{provider}", get(oauth_start))
        .route("/api/auth/callback/{provider}", get(oauth_callback))
        .route("/api/auth/callback/credentials", post(credentials_callback))
        .route("/api/auth/signout", get(signout).post(signout))
        .route("/api/auth/session", get(session));

    Router::new().merge(public_routes).merge(protected_routes).with_state(state)
}
