//! OAuth 2.0 authorization-code flow against the Threads identity provider.

use std::collections::HashMap;
use std::sync::Arc;

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope, TokenUrl};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const THREADS_AUTH_URL: &str = "https://threads.net/oauth/authorize";
const THREADS_TOKEN_URL: &str = "https://graph.threads.net/oauth/access_token";
const THREADS_USERINFO_URL: &str = "https://graph.threads.net/v1.0/me";
const THREADS_SCOPE: &str = "threads_basic";
const THREADS_PROFILE_FIELDS: &str = "id,username,name,threads_profile_picture_url,threads_biography";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to parse user profile response")]
    ProfileParse,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

/// Authorization URL plus the CSRF state the caller must stash until the
/// provider calls back.
pub struct AuthorizationDetails {
    pub url: String,
    pub csrf_token: String,
}

/// Normalized profile fields returned by a provider. Only the provider
/// user id is guaranteed present.
#[derive(Debug, Clone)]
pub struct OAuthUserProfile {
    pub provider_user_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub biography: Option<String>,
}

#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait OAuthProvider: Send + Sync + std::fmt::Debug {
    /// Generates the authorization URL and the CSRF state for the flow.
    fn authorization_url(&self) -> AuthorizationDetails;

    /// Exchanges an authorization code for an access token. A single
    /// attempt; any upstream failure is terminal for the request.
    async fn exchange_code(&self, code: String) -> Result<String, OAuthError>;

    /// Fetches the user's profile from the provider using an access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthUserProfile, OAuthError>;
}

/// Raw token endpoint response. Threads also returns `user_id`, but the
/// profile fetch is the authoritative source for the id.
#[derive(Deserialize)]
struct ThreadsTokenResponse {
    access_token: String,
}

/// Raw profile as served by the Threads graph API.
#[derive(Deserialize)]
struct ThreadsProfile {
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    threads_profile_picture_url: Option<String>,
    #[serde(default)]
    threads_biography: Option<String>,
}

#[derive(Debug)]
pub struct ThreadsOAuthProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    http: Client,
}

impl ThreadsOAuthProvider {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Result<Self, OAuthError> {
        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            auth_url: AuthUrl::new(THREADS_AUTH_URL.to_string())?,
            token_url: TokenUrl::new(THREADS_TOKEN_URL.to_string())?,
            redirect_url: RedirectUrl::new(redirect_uri)?,
            http: Client::new(),
        })
    }

    /// Returns the response on 2xx, otherwise folds status and body into `err`.
    async fn ensure_success<F>(response: reqwest::Response, err: F) -> Result<reqwest::Response, OAuthError>
    where
        F: FnOnce(String) -> OAuthError,
    {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(err(format!("status {status}: {body}")))
    }
}

#[async_trait::async_trait]
impl OAuthProvider for ThreadsOAuthProvider {
    fn authorization_url(&self) -> AuthorizationDetails {
        // Threads does plain authorization-code + state; no PKCE.
        let (auth_url, csrf_token) = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(THREADS_SCOPE.to_string()))
            .url();

        AuthorizationDetails { url: auth_url.to_string(), csrf_token: csrf_token.secret().clone() }
    }

    async fn exchange_code(&self, code: String) -> Result<String, OAuthError> {
        // The Threads token endpoint wants the client credentials in the
        // form body, not in a Basic auth header.
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.secret().as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_url.as_str()),
            ("code", code.as_str()),
        ];

        let response = self.http.post(self.token_url.as_str()).form(&params).send().await.map_err(|e| {
            tracing::error!("Token exchange request failed: {:?}", e);
            OAuthError::HttpClient(e)
        })?;

        let response = Self::ensure_success(response, OAuthError::TokenExchange).await.map_err(|e| {
            tracing::error!("OAuth token exchange failed: {}", e);
            e
        })?;

        let token: ThreadsTokenResponse = response
            .json()
            .await
            .map_err(|_| OAuthError::TokenExchange("malformed token response body".to_string()))?;

        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<OAuthUserProfile, OAuthError> {
        let response = self
            .http
            .get(THREADS_USERINFO_URL)
            .query(&[("fields", THREADS_PROFILE_FIELDS)])
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, |detail| {
            tracing::error!("Profile request rejected: {}", detail);
            OAuthError::ProfileParse
        })
        .await?;

        let profile: ThreadsProfile = response.json().await.map_err(|_| OAuthError::ProfileParse)?;

        Ok(OAuthUserProfile {
            provider_user_id: profile.id,
            username: profile.username,
            name: profile.name,
            avatar_url: profile.threads_profile_picture_url,
            biography: profile.threads_biography,
        })
    }
}

#[derive(Clone, Default)]
pub struct OAuthManager {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl OAuthManager {
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    pub fn add_provider(&mut self, name: &str, provider: Arc<dyn OAuthProvider>) {
        self.providers.insert(name.to_string(), provider);
    }

    pub fn get_provider(&self, name: &str) -> Result<&Arc<dyn OAuthProvider>, OAuthError> {
        self.providers
            .get(name)
            .ok_or_else(|| OAuthError::ProviderNotFound(name.to_string()))
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn test_provider() -> ThreadsOAuthProvider {
        ThreadsOAuthProvider::new(
            "client_id".to_string(),
            "client_secret".to_string(),
            "https://example.com/api/auth/callback/threads".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_oauth_manager() {
        let mut manager = OAuthManager::new();
        let provider = Arc::new(MockOAuthProvider::new());

        manager.add_provider("threads", provider);

        assert!(manager.has_provider("threads"));

        let result = manager.get_provider("threads");
        assert!(result.is_ok());

        let result = manager.get_provider("nonexistent");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), OAuthError::ProviderNotFound(_)));
    }

    #[test]
    fn test_threads_provider_invalid_redirect_url() {
        let provider =
            ThreadsOAuthProvider::new("client_id".to_string(), "client_secret".to_string(), "invalid_url".to_string());

        assert!(provider.is_err());
        assert!(matches!(provider.unwrap_err(), OAuthError::InvalidUrl(_)));
    }

    #[test]
    fn test_threads_provider_authorization_url() {
        let details = test_provider().authorization_url();

        assert!(details.url.starts_with("https://threads.net/oauth/authorize"));
        assert!(details.url.contains("response_type=code"));
        assert!(details.url.contains("client_id=client_id"));
        assert!(details.url.contains("scope=threads_basic"));
        assert!(details.url.contains("redirect_uri=https%3A%2F%2Fexample.com%2Fapi%2Fauth%2Fcallback%2Fthreads"));
        assert!(details.url.contains(&format!("state={}", details.csrf_token)));
        // Plain code flow, so no PKCE parameters.
        assert!(!details.url.contains("code_challenge"));
    }

    #[test]
    fn test_threads_provider_state_unique_per_call() {
        let provider = test_provider();

        let first = provider.authorization_url();
        let second = provider.authorization_url();

        assert_ne!(first.csrf_token, second.csrf_token);
        assert!(!first.csrf_token.is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_exchange_failure() {
        let mut mock_provider = MockOAuthProvider::new();

        mock_provider
            .expect_exchange_code()
            .withf(|code| code == "bad_code")
            .returning(|_| Box::pin(async move { Err(OAuthError::TokenExchange("status 400: invalid code".into())) }));

        let result = mock_provider.exchange_code("bad_code".to_string()).await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), OAuthError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_successful_flow() {
        let mut mock_provider = MockOAuthProvider::new();

        mock_provider
            .expect_exchange_code()
            .withf(|code| code == "abc123")
            .returning(|_| Box::pin(async move { Ok("mock_access_token".to_string()) }));

        mock_provider.expect_fetch_profile().withf(|t| t == "mock_access_token").returning(|_| {
            Box::pin(async move {
                Ok(OAuthUserProfile {
                    provider_user_id: "42".to_string(),
                    username: Some("alice".to_string()),
                    name: Some("Alice".to_string()),
                    avatar_url: Some("https://cdn.example.com/alice.jpg".to_string()),
                    biography: Some("hello".to_string()),
                })
            })
        });

        let token = mock_provider.exchange_code("abc123".to_string()).await.unwrap();
        assert_eq!(token, "mock_access_token");

        let profile = mock_provider.fetch_profile(&token).await.unwrap();
        assert_eq!(profile.provider_user_id, "42");
        assert_eq!(profile.username, Some("alice".to_string()));
    }
}
