use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, hashed_refresh_token, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by id.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, hashed_refresh_token, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a hashed password. No session yet, so the
    /// refresh hash starts out null.
    pub async fn create(
        db: &PgPool,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, username, password_hash, hashed_refresh_token, created_at
            "#,
        )
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Overwrite the stored refresh-token hash, invalidating any refresh
    /// token issued before this one. Single UPDATE: either the new hash
    /// lands or the prior one is left intact. Returns false if the user row
    /// does not exist.
    pub async fn set_refresh_hash(db: &PgPool, id: Uuid, hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET hashed_refresh_token = $2 WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(hash)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the stored refresh-token hash (logout). Returns false if the
    /// user row does not exist.
    pub async fn clear_refresh_hash(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET hashed_refresh_token = NULL WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All users, oldest first.
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash, hashed_refresh_token, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(users)
    }
}
