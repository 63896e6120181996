use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{UpdateUserProfileRequest, UserCredentials, UserRole, UserStatus, UserWithProfile};

const USER_WITH_PROFILE: &str = r#"
    SELECT u.id, u.username, u.email, u.first_name, u.last_name,
           p.role, p.status, p.player_id, u.created_at
    FROM users u
    JOIN user_profiles p ON p.user_id = u.id
"#;

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: UserRole,
    pub status: UserStatus,
}

#[derive(Debug)]
pub struct UserQueries {
    pool: PgPool,
}

impl UserQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the account and its profile together.
    pub async fn create_with_profile(&self, user: &NewUser<'_>) -> Result<Uuid, sqlx::Error> {
        let user_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.first_name)
        .bind(user.last_name)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute user insert query: {:?}", e);
            e
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_profiles (id, user_id, role, status)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(user.role.to_string())
        .bind(user.status.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute profile insert query: {:?}", e);
            e
        })?;

        tx.commit().await?;
        Ok(user_id)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn credentials(&self, username: &str) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.id, u.username, u.password_hash, p.role, p.status
            FROM users u
            JOIN user_profiles p ON p.user_id = u.id
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find(&self, user_id: Uuid) -> Result<Option<UserWithProfile>, sqlx::Error> {
        let sql = format!("{} WHERE u.id = $1", USER_WITH_PROFILE);
        sqlx::query_as::<_, UserWithProfile>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list(&self, status: Option<UserStatus>) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        let sql = format!(
            "{} WHERE ($1::TEXT IS NULL OR p.status = $1) ORDER BY u.created_at DESC",
            USER_WITH_PROFILE
        );
        sqlx::query_as::<_, UserWithProfile>(&sql)
            .bind(status.map(|s| s.to_string()))
            .fetch_all(&self.pool)
            .await
    }

    /// Fields left out of the request keep their current value.
    pub async fn update_profile(&self, user_id: Uuid, update: &UpdateUserProfileRequest) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_profiles
            SET role = COALESCE($2, role),
                status = COALESCE($3, status),
                player_id = COALESCE($4, player_id),
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.role.map(|r| r.to_string()))
        .bind(update.status.map(|s| s.to_string()))
        .bind(update.player_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
