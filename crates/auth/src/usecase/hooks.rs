//! The sign-in hook pipeline. The sign-in use case invokes the three
//! methods in a fixed order: [`SigninHooks::sign_in_allowed`] gates the
//! login and persists the profile, [`SigninHooks::token_identity`] decides
//! what goes into the token claims, and [`SigninHooks::session_user`]
//! shapes the session object read back from verified claims.

use std::sync::Arc;

use app_core::error::AppError;
use app_core::jwt::{Claims, SessionIdentity};
use async_trait::async_trait;

use crate::domain::entity::user::{SessionUser, UserProfile};
use crate::outbound::sql::UserDataSource;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SigninHooks: Send + Sync {
    /// Decides whether the profile may sign in. This is where the profile
    /// upsert happens; a storage failure blocks the login instead of
    /// surfacing details to the user.
    async fn sign_in_allowed(&self, profile: &UserProfile) -> Result<bool, AppError>;

    /// Picks the claims the session token carries for this profile.
    fn token_identity(&self, profile: &UserProfile) -> SessionIdentity;

    /// Projects verified token claims into the client-facing session object.
    fn session_user(&self, claims: &Claims) -> SessionUser;
}

pub struct DefaultSigninHooks {
    store: Arc<dyn UserDataSource>,
}

impl DefaultSigninHooks {
    pub fn new(store: Arc<dyn UserDataSource>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SigninHooks for DefaultSigninHooks {
    async fn sign_in_allowed(&self, profile: &UserProfile) -> Result<bool, AppError> {
        // The upsert key must never be empty.
        if profile.provider_user_id.trim().is_empty() {
            tracing::warn!(provider = %profile.provider, "Refusing sign-in: profile has no user id");
            return Ok(false);
        }

        match self.store.upsert_user(profile).await {
            Ok(_) => Ok(true),
            Err(err) => {
                tracing::error!(
                    provider = %profile.provider,
                    "Failed to persist profile during sign-in: {:?}",
                    err
                );
                Ok(false)
            },
        }
    }

    fn token_identity(&self, profile: &UserProfile) -> SessionIdentity {
        SessionIdentity {
            id: profile.provider_user_id.clone(),
            username: profile.username.clone(),
            name: profile.name.clone(),
            picture: profile.image_url.clone(),
        }
    }

    fn session_user(&self, claims: &Claims) -> SessionUser {
        SessionUser {
            id: claims.sub.clone(),
            username: claims.username.clone(),
            name: claims.name.clone(),
            image: claims.picture.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::DateTime;

    use super::*;
    use crate::domain::entity::user::ThreadsUser;
    use crate::outbound::sql::MockUserDataSource;

    fn test_profile(id: &str) -> UserProfile {
        UserProfile {
            provider: "threads".to_string(),
            provider_user_id: id.to_string(),
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            image_url: Some("https://cdn.example.com/alice.jpg".to_string()),
            biography: Some("hello".to_string()),
        }
    }

    fn stored_row(profile: &UserProfile) -> ThreadsUser {
        ThreadsUser {
            threads_user_id: profile.provider_user_id.clone(),
            username: profile.username.clone(),
            name: profile.name.clone(),
            profile_image_url: profile.image_url.clone(),
            biography: profile.biography.clone(),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    /// In-memory stand-in for the Postgres store, keyed like the real
    /// table.
    #[derive(Default)]
    struct FakeUserStore {
        rows: Mutex<HashMap<String, ThreadsUser>>,
    }

    #[async_trait]
    impl UserDataSource for FakeUserStore {
        async fn upsert_user(&self, profile: &UserProfile) -> Result<ThreadsUser, AppError> {
            let row = stored_row(profile);
            let mut rows = self.rows.lock().unwrap();
            rows.insert(row.threads_user_id.clone(), row.clone());
            Ok(row)
        }

        async fn find_by_threads_id(&self, threads_user_id: &str) -> Result<Option<ThreadsUser>, AppError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.get(threads_user_id).cloned())
        }
    }

    #[tokio::test]
    async fn test_sign_in_allowed_persists_profile() {
        let store = Arc::new(FakeUserStore::default());
        let hooks = DefaultSigninHooks::new(store.clone());

        let allowed = hooks.sign_in_allowed(&test_profile("42")).await.unwrap();

        assert!(allowed);
        let row = store.find_by_threads_id("42").await.unwrap().unwrap();
        assert_eq!(row.threads_user_id, "42");
        assert_eq!(row.username, Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_sign_in_twice_keeps_one_row() {
        let store = Arc::new(FakeUserStore::default());
        let hooks = DefaultSigninHooks::new(store.clone());
        let profile = test_profile("42");

        assert!(hooks.sign_in_allowed(&profile).await.unwrap());
        assert!(hooks.sign_in_allowed(&profile).await.unwrap());

        assert_eq!(store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_provider_id_blocks_without_upsert() {
        let mut store = MockUserDataSource::new();
        store.expect_upsert_user().times(0);
        let hooks = DefaultSigninHooks::new(Arc::new(store));

        let allowed = hooks.sign_in_allowed(&test_profile("")).await.unwrap();

        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_store_failure_blocks_sign_in() {
        let mut store = MockUserDataSource::new();
        store
            .expect_upsert_user()
            .returning(|_| Box::pin(async move { Err(AppError::Database(sqlx::Error::PoolClosed)) }));
        let hooks = DefaultSigninHooks::new(Arc::new(store));

        // The storage failure is logged and swallowed; the caller only
        // sees a blocked sign-in.
        let allowed = hooks.sign_in_allowed(&test_profile("42")).await.unwrap();

        assert!(!allowed);
    }

    #[test]
    fn test_token_identity_maps_profile() {
        let hooks = DefaultSigninHooks::new(Arc::new(FakeUserStore::default()));

        let identity = hooks.token_identity(&test_profile("42"));

        assert_eq!(identity.id, "42");
        assert_eq!(identity.username, Some("alice".to_string()));
        assert_eq!(identity.name, Some("Alice".to_string()));
        assert_eq!(identity.picture, Some("https://cdn.example.com/alice.jpg".to_string()));
    }

    #[test]
    fn test_session_user_maps_claims() {
        let hooks = DefaultSigninHooks::new(Arc::new(FakeUserStore::default()));
        let claims = Claims {
            sub: "42".to_string(),
            username: Some("alice".to_string()),
            name: None,
            picture: Some("https://cdn.example.com/alice.jpg".to_string()),
            iss: "test".to_string(),
            jti: "jti-1".to_string(),
            exp: 9_999_999_999,
            iat: 1,
        };

        let user = hooks.session_user(&claims);

        assert_eq!(user.id, "42");
        assert_eq!(user.username, Some("alice".to_string()));
        assert!(user.name.is_none());
        assert_eq!(user.image, Some("https://cdn.example.com/alice.jpg".to_string()));
    }
}
