use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A `threads_users` row: the profile stored for everyone who has signed
/// in. Created or overwritten (last write wins) on every successful login,
/// keyed by the provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadsUser {
    pub threads_user_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub biography: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThreadsUser {
    /// Name to greet the user with, falling back to a neutral label.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("User")
    }
}

/// Normalized profile entering the sign-in pipeline, either mapped from a
/// provider response or built for the credentials fallback account.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub provider: String,
    pub provider_user_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub biography: Option<String>,
}

/// The session object handed to clients. Never contains more than the
/// token claims do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(username: Option<&str>) -> ThreadsUser {
        ThreadsUser {
            threads_user_id: "42".to_string(),
            username: username.map(String::from),
            name: Some("Alice".to_string()),
            profile_image_url: None,
            biography: None,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    #[test]
    fn test_display_name_uses_username() {
        assert_eq!(test_user(Some("alice")).display_name(), "alice");
    }

    #[test]
    fn test_display_name_falls_back() {
        assert_eq!(test_user(None).display_name(), "User");
    }

    #[test]
    fn test_session_user_serializes_image_field() {
        let user = SessionUser {
            id: "42".to_string(),
            username: Some("alice".to_string()),
            name: None,
            image: Some("https://cdn.example.com/alice.jpg".to_string()),
        };

        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["id"], "42");
        assert_eq!(value["username"], "alice");
        assert_eq!(value["image"], "https://cdn.example.com/alice.jpg");
    }
}
