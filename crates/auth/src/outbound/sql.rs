use app_core::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entity::user::{ThreadsUser, UserProfile};
use crate::outbound::model::ThreadsUserModel;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserDataSource: Send + Sync {
    /// Insert-or-overwrite the profile row keyed by the provider user id.
    /// Last write wins; running it twice with the same input leaves one row.
    async fn upsert_user(&self, profile: &UserProfile) -> Result<ThreadsUser, AppError>;

    async fn find_by_threads_id(&self, threads_user_id: &str) -> Result<Option<ThreadsUser>, AppError>;
}

pub struct UserSQL {
    pool: PgPool,
}

impl UserSQL {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDataSource for UserSQL {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<ThreadsUser, AppError> {
        let model = sqlx::query_as::<_, ThreadsUserModel>(
            r#"
                INSERT INTO threads_users (threads_user_id, username, name, profile_image_url, biography)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (threads_user_id)
                DO UPDATE SET
                    username = EXCLUDED.username,
                    name = EXCLUDED.name,
                    profile_image_url = EXCLUDED.profile_image_url,
                    biography = EXCLUDED.biography,
                    updated_at = NOW()
                RETURNING *
            "#,
        )
        .bind(&profile.provider_user_id)
        .bind(&profile.username)
        .bind(&profile.name)
        .bind(&profile.image_url)
        .bind(&profile.biography)
        .fetch_one(&self.pool)
        .await?;

        Ok(ThreadsUser::from(model))
    }

    async fn find_by_threads_id(&self, threads_user_id: &str) -> Result<Option<ThreadsUser>, AppError> {
        let model = sqlx::query_as::<_, ThreadsUserModel>(
            "SELECT * FROM threads_users WHERE threads_user_id = $1",
        )
        .bind(threads_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(model.map(ThreadsUser::from))
    }
}
