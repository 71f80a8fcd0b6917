use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::User;

use super::row_helpers::map_user_row;

/// User database operations
pub struct UserRepo;

impl UserRepo {
    pub async fn get_by_username(pool: &Pool<Sqlite>, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(map_user_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, username: &str, password_hash: &str) -> Result<User> {
        // The UNIQUE constraint on username is the backstop behind the
        // handler's existence pre-check.
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_optional(pool)
        .await?;

        row.as_ref()
            .map(map_user_row)
            .context("User not found after creation")
    }
}
