use std::sync::Arc;

use app_core::config::Config;
use app_core::error::AppError;
use app_core::jwt::{Claims, TokenManager};
use app_core::oauth::{OAuthManager, OAuthUserProfile};
use app_core::password::Hasher;
use async_trait::async_trait;
use validator::Validate;

use crate::domain::entity::user::{SessionUser, UserProfile};
use crate::domain::inout::prelude::*;
use crate::usecase::hooks::SigninHooks;

const SIGNIN_BLOCKED_MSG: &str = "Sign-in was blocked";
const INVALID_CREDENTIALS_MSG: &str = "Invalid username or password";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SigninUseCase: Send + Sync {
    async fn oauth_start(&self, input: OAuthStartInput) -> Result<OAuthStartOutput, AppError>;
    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<SigninOutput, AppError>;
    async fn credentials_sign_in(&self, input: CredentialsInput) -> Result<SigninOutput, AppError>;
    fn session_from_claims(&self, claims: &Claims) -> SessionUser;
}

pub struct SigninService {
    config: Arc<Config>,
    hasher: Arc<dyn Hasher>,
    token: Arc<dyn TokenManager>,
    oauth: OAuthManager,
    hooks: Arc<dyn SigninHooks>,
}

impl SigninService {
    pub fn new(
        config: Arc<Config>,
        hasher: Arc<dyn Hasher>,
        token: Arc<dyn TokenManager>,
        oauth: OAuthManager,
        hooks: Arc<dyn SigninHooks>,
    ) -> Self {
        Self { config, hasher, token, oauth, hooks }
    }

    /// Maps a provider response onto the domain profile. Pure; the only
    /// guaranteed field is the provider user id.
    fn map_profile(&self, provider: &str, raw: OAuthUserProfile) -> UserProfile {
        UserProfile {
            provider: provider.to_string(),
            provider_user_id: raw.provider_user_id,
            username: raw.username,
            name: raw.name.filter(|n| !n.trim().is_empty()),
            image_url: raw.avatar_url,
            biography: raw.biography,
        }
    }

    /// Runs the hook pipeline in its fixed order, then signs the session
    /// token.
    async fn complete_sign_in(&self, profile: UserProfile) -> Result<SigninOutput, AppError> {
        if !self.hooks.sign_in_allowed(&profile).await? {
            return Err(AppError::Unauthorized(SIGNIN_BLOCKED_MSG.to_string()));
        }

        let identity = self.hooks.token_identity(&profile);
        let session_token = self.token.create_session_token(&identity)?;

        Ok(SigninOutput { session_token })
    }
}

#[async_trait]
impl SigninUseCase for SigninService {
    async fn oauth_start(&self, input: OAuthStartInput) -> Result<OAuthStartOutput, AppError> {
        input.validate()?;

        let provider = self.oauth.get_provider(&input.provider)?;
        let details = provider.authorization_url();

        Ok(OAuthStartOutput { auth_url: details.url, csrf_token: details.csrf_token })
    }

    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<SigninOutput, AppError> {
        input.validate()?;

        let provider = self.oauth.get_provider(&input.provider)?;

        // One attempt each; any upstream failure aborts the login before
        // anything is written.
        let access_token = provider.exchange_code(input.code).await?;
        let raw_profile = provider.fetch_profile(&access_token).await?;

        let profile = self.map_profile(&input.provider, raw_profile);

        self.complete_sign_in(profile).await
    }

    async fn credentials_sign_in(&self, input: CredentialsInput) -> Result<SigninOutput, AppError> {
        input.validate()?;

        let expected_username: String = self.config.get("auth.credentials.username")?;
        let password_hash: String = self.config.get("auth.credentials.password_hash")?;

        // An unset hash means the fallback account is disabled.
        if password_hash.is_empty() || input.username != expected_username {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS_MSG.to_string()));
        }

        if !self.hasher.verify(&input.password, &password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS_MSG.to_string()));
        }

        let profile = UserProfile {
            provider: "credentials".to_string(),
            provider_user_id: self.config.get("auth.credentials.user_id")?,
            username: Some(expected_username),
            name: self.config.get::<String>("auth.credentials.name").ok(),
            image_url: None,
            biography: None,
        };

        self.complete_sign_in(profile).await
    }

    fn session_from_claims(&self, claims: &Claims) -> SessionUser {
        self.hooks.session_user(claims)
    }
}
