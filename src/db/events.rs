use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::{Event, EventFields, MonthRange};

use super::row_helpers::map_event_row;

const SELECT_EVENT: &str =
    "SELECT id, user_id, title, description, event_date, event_time, created_at FROM events";

/// Calendar event database operations
pub struct EventRepo;

impl EventRepo {
    pub async fn get(pool: &Pool<Sqlite>, user_id: i64, id: i64) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("{} WHERE id = ? AND user_id = ?", SELECT_EVENT))
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.as_ref().map(map_event_row))
    }

    pub async fn list(
        pool: &Pool<Sqlite>,
        user_id: i64,
        range: Option<MonthRange>,
    ) -> Result<Vec<Event>> {
        // NULL event_time sorts before any timed entry on the same day
        let rows = match range {
            Some(range) => {
                sqlx::query(&format!(
                    "{} WHERE user_id = ? AND event_date >= ? AND event_date < ? ORDER BY event_date, event_time",
                    SELECT_EVENT
                ))
                .bind(user_id)
                .bind(range.from)
                .bind(range.to)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "{} WHERE user_id = ? ORDER BY event_date, event_time",
                    SELECT_EVENT
                ))
                .bind(user_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(rows.iter().map(map_event_row).collect())
    }

    pub async fn create(pool: &Pool<Sqlite>, user_id: i64, fields: &EventFields) -> Result<Event> {
        let result = sqlx::query(
            r#"
            INSERT INTO events (user_id, title, description, event_date, event_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.event_date)
        .bind(fields.event_time.map(|t| t.format("%H:%M").to_string()))
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::get(pool, user_id, result.last_insert_rowid())
            .await?
            .context("Event not found after creation")
    }

    pub async fn update(
        pool: &Pool<Sqlite>,
        user_id: i64,
        id: i64,
        fields: &EventFields,
    ) -> Result<Event> {
        let result = sqlx::query(
            r#"
            UPDATE events SET title = ?, description = ?, event_date = ?, event_time = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.event_date)
        .bind(fields.event_time.map(|t| t.format("%H:%M").to_string()))
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("Event", &id.to_string()).into());
        }

        Self::get(pool, user_id, id)
            .await?
            .context("Event not found after update")
    }

    pub async fn delete(pool: &Pool<Sqlite>, user_id: i64, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("Event", &id.to_string()).into());
        }
        Ok(())
    }
}
