mod domain;
mod inbound;
mod outbound;
mod usecase;

use std::sync::Arc;

use app_core::config::Config;
use app_core::jwt::TokenManager;
use app_core::oauth::OAuthManager;
use app_core::password::Hasher;
pub use inbound::router::create_router;
use sqlx::PgPool;
use tower_cookies::Key;

use crate::inbound::state::AuthState;
use crate::outbound::sql::{UserDataSource, UserSQL};
use crate::usecase::hooks::{DefaultSigninHooks, SigninHooks};
use crate::usecase::profile::{ProfileService, ProfileUseCase};
use crate::usecase::signin::{SigninService, SigninUseCase};

pub struct Dependency {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub hasher: Arc<dyn Hasher>,
    pub token: Arc<dyn TokenManager>,
    pub oauth: OAuthManager,
    pub cookie_key: Key,
}

pub fn new(dep: Dependency) -> AuthState {
    let repo: Arc<dyn UserDataSource> = Arc::new(UserSQL::new(dep.db));
    let hooks: Arc<dyn SigninHooks> = Arc::new(DefaultSigninHooks::new(repo.clone()));

    let signin_svc: Arc<dyn SigninUseCase> = Arc::new(SigninService::new(
        dep.config.clone(),
        dep.hasher,
        dep.token.clone(),
        dep.oauth,
        hooks,
    ));
    let profile_svc: Arc<dyn ProfileUseCase> = Arc::new(ProfileService::new(repo));

    AuthState::new(dep.cookie_key, dep.config, dep.token, signin_svc, profile_svc)
}
