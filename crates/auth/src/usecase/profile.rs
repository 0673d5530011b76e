use std::sync::Arc;

use app_core::error::AppError;
use async_trait::async_trait;

use crate::domain::entity::user::ThreadsUser;
use crate::outbound::sql::UserDataSource;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ProfileUseCase: Send + Sync {
    /// Loads the stored profile row for a signed-in user.
    async fn stored_profile(&self, threads_user_id: &str) -> Result<Option<ThreadsUser>, AppError>;
}

#[derive(Clone)]
pub struct ProfileService {
    repo: Arc<dyn UserDataSource>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn UserDataSource>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ProfileUseCase for ProfileService {
    async fn stored_profile(&self, threads_user_id: &str) -> Result<Option<ThreadsUser>, AppError> {
        if threads_user_id.is_empty() {
            return Ok(None);
        }

        self.repo.find_by_threads_id(threads_user_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::outbound::sql::MockUserDataSource;

    fn stored_user() -> ThreadsUser {
        ThreadsUser {
            threads_user_id: "42".to_string(),
            username: Some("alice".to_string()),
            name: Some("Alice".to_string()),
            profile_image_url: None,
            biography: Some("hello".to_string()),
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        }
    }

    #[tokio::test]
    async fn test_stored_profile_found() {
        let mut repo = MockUserDataSource::new();
        repo.expect_find_by_threads_id()
            .withf(|id| id == "42")
            .returning(|_| Box::pin(async move { Ok(Some(stored_user())) }));

        let svc = ProfileService::new(Arc::new(repo));

        let user = svc.stored_profile("42").await.unwrap();

        assert_eq!(user.unwrap().username, Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_stored_profile_missing() {
        let mut repo = MockUserDataSource::new();
        repo.expect_find_by_threads_id().returning(|_| Box::pin(async move { Ok(None) }));

        let svc = ProfileService::new(Arc::new(repo));

        let user = svc.stored_profile("42").await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_stored_profile_empty_id_skips_query() {
        let mut repo = MockUserDataSource::new();
        repo.expect_find_by_threads_id().times(0);

        let svc = ProfileService::new(Arc::new(repo));

        let user = svc.stored_profile("").await.unwrap();

        assert!(user.is_none());
    }
}
