use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Sqlite};

use crate::models::{Habit, HabitFields, ToggleOutcome};

use super::row_helpers::map_habit_row;

const SELECT_HABIT: &str = "SELECT id, user_id, title, description, start_date, frequency, is_completed, created_at FROM habits";

/// Habit database operations, including the per-day completion set
pub struct HabitRepo;

impl HabitRepo {
    pub async fn get(pool: &Pool<Sqlite>, user_id: i64, id: i64) -> Result<Option<Habit>> {
        let row = sqlx::query(&format!("{} WHERE id = ? AND user_id = ?", SELECT_HABIT))
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.as_ref().map(map_habit_row))
    }

    pub async fn list(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Habit>> {
        let rows = sqlx::query(&format!(
            "{} WHERE user_id = ? ORDER BY created_at DESC, id DESC",
            SELECT_HABIT
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut habits: Vec<Habit> = rows.iter().map(map_habit_row).collect();

        // Completion sets are reconstructed from habit_completions on every
        // read; there is no cached column that could drift from the toggle path.
        let completions: Vec<(i64, NaiveDate)> = sqlx::query_as(
            r#"
            SELECT hc.habit_id, hc.completion_date
            FROM habit_completions hc
            JOIN habits h ON h.id = hc.habit_id
            WHERE h.user_id = ?
            ORDER BY hc.completion_date
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let mut by_habit: HashMap<i64, Vec<NaiveDate>> = HashMap::new();
        for (habit_id, completion_date) in completions {
            by_habit.entry(habit_id).or_default().push(completion_date);
        }
        for habit in &mut habits {
            if let Some(dates) = by_habit.remove(&habit.id) {
                habit.completed_dates = dates;
            }
        }

        Ok(habits)
    }

    pub async fn create(pool: &Pool<Sqlite>, user_id: i64, fields: &HabitFields) -> Result<Habit> {
        let result = sqlx::query(
            r#"
            INSERT INTO habits (user_id, title, description, start_date, frequency, is_completed, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(&fields.frequency)
        .bind(fields.is_completed.unwrap_or(false))
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::get(pool, user_id, result.last_insert_rowid())
            .await?
            .context("Habit not found after creation")
    }

    pub async fn update(
        pool: &Pool<Sqlite>,
        user_id: i64,
        id: i64,
        fields: &HabitFields,
    ) -> Result<Habit> {
        // Load first: ownership check plus the stored is_completed value,
        // which survives when the request omits the field.
        let existing = Self::get(pool, user_id, id)
            .await?
            .ok_or_else(|| super::NotFoundError::new("Habit", &id.to_string()))?;

        sqlx::query(
            r#"
            UPDATE habits SET title = ?, description = ?, start_date = ?, frequency = ?, is_completed = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.start_date)
        .bind(&fields.frequency)
        .bind(fields.is_completed.unwrap_or(existing.is_completed))
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Self::get(pool, user_id, id)
            .await?
            .context("Habit not found after update")
    }

    pub async fn delete(pool: &Pool<Sqlite>, user_id: i64, id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM habits WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("Habit", &id.to_string()).into());
        }

        // Completion records must not outlive their habit row.
        sqlx::query("DELETE FROM habit_completions WHERE habit_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn toggle(
        pool: &Pool<Sqlite>,
        user_id: i64,
        id: i64,
        date: NaiveDate,
    ) -> Result<ToggleOutcome> {
        let mut tx = pool.begin().await?;

        let owned: Option<(i64,)> = sqlx::query_as("SELECT id FROM habits WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owned.is_none() {
            return Err(super::NotFoundError::new("Habit", &id.to_string()).into());
        }

        // Delete-first toggle: the delete's row count decides the transition.
        // INSERT OR IGNORE absorbs a concurrent mark of the same (habit, date)
        // instead of tripping the primary key.
        let removed = sqlx::query(
            "DELETE FROM habit_completions WHERE habit_id = ? AND completion_date = ?",
        )
        .bind(id)
        .bind(date)
        .execute(&mut *tx)
        .await?;

        let marked = removed.rows_affected() == 0;
        if marked {
            sqlx::query(
                "INSERT OR IGNORE INTO habit_completions (habit_id, completion_date) VALUES (?, ?)",
            )
            .bind(id)
            .bind(date)
            .execute(&mut *tx)
            .await?;
        }

        let completed_dates: Vec<NaiveDate> = sqlx::query_scalar(
            "SELECT completion_date FROM habit_completions WHERE habit_id = ? ORDER BY completion_date",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ToggleOutcome {
            completed_dates,
            marked,
        })
    }
}
