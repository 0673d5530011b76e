use serde::{Deserialize, Serialize};

use crate::domain::entity::user::SessionUser;

// ╔════════════════════════════╗
// ║       Sign-in Page         ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct SigninPageQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

// ╔════════════════════════════╗
// ║        OAuth Start         ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct OAuthStartQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// ╔════════════════════════════╗
// ║       OAuth Callback       ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct OAuthCallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ╔════════════════════════════╗
// ║    Credentials Sign-in     ║
// ╚════════════════════════════╝

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

// ╔════════════════════════════╗
// ║          Session           ║
// ╚════════════════════════════╝

#[derive(Serialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}
