use chrono::{DateTime, Utc};

use crate::domain::entity::user::ThreadsUser;

/// Database row for the `threads_users` table.
#[derive(sqlx::FromRow)]
pub struct ThreadsUserModel {
    pub threads_user_id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub biography: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ThreadsUserModel> for ThreadsUser {
    fn from(result: ThreadsUserModel) -> Self {
        Self {
            threads_user_id: result.threads_user_id,
            username: result.username,
            name: result.name,
            profile_image_url: result.profile_image_url,
            biography: result.biography,
            created_at: result.created_at,
            updated_at: result.updated_at,
        }
    }
}
