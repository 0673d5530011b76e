use validator::Validate;

// ╔════════════════════════════╗
// ║        OAuth Start         ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct OAuthStartInput {
    #[validate(length(min = 1, message = "provider cannot be empty"))]
    pub provider: String,
}

#[derive(Debug)]
pub struct OAuthStartOutput {
    pub auth_url: String,
    /// CSRF state embedded in the authorization URL; the caller stores it
    /// until the provider redirects back.
    pub csrf_token: String,
}

// ╔════════════════════════════╗
// ║       OAuth Callback       ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct OAuthCallbackInput {
    #[validate(length(min = 1, message = "provider cannot be empty"))]
    pub provider: String,

    #[validate(length(min = 1, message = "code cannot be empty"))]
    pub code: String,
}

#[derive(Debug)]
pub struct SigninOutput {
    /// Signed session token, ready to be set as the session cookie.
    pub session_token: String,
}

// ╔════════════════════════════╗
// ║    Credentials Sign-in     ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct CredentialsInput {
    #[validate(length(min = 1, message = "username cannot be empty"))]
    pub username: String,

    #[validate(length(min = 1, message = "password cannot be empty"))]
    pub password: String,
}
