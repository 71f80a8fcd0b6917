mod events;
mod habits;
pub(crate) mod row_helpers;
mod users;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::models::*;

/// Typed error for "resource not found" — enables reliable downcast
/// in the API error handler instead of fragile string matching. Also used
/// for records that exist but belong to another user, so the two cases are
/// indistinguishable to the caller.
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .context("Invalid database path")?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(opts)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ========== User Operations ==========

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        users::UserRepo::get_by_username(&self.pool, username).await
    }

    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        users::UserRepo::create(&self.pool, username, password_hash).await
    }

    // ========== Habit Operations ==========

    pub async fn list_habits(&self, user_id: i64) -> Result<Vec<Habit>> {
        habits::HabitRepo::list(&self.pool, user_id).await
    }

    pub async fn create_habit(&self, user_id: i64, fields: &HabitFields) -> Result<Habit> {
        habits::HabitRepo::create(&self.pool, user_id, fields).await
    }

    pub async fn update_habit(&self, user_id: i64, id: i64, fields: &HabitFields) -> Result<Habit> {
        habits::HabitRepo::update(&self.pool, user_id, id, fields).await
    }

    pub async fn delete_habit(&self, user_id: i64, id: i64) -> Result<()> {
        habits::HabitRepo::delete(&self.pool, user_id, id).await
    }

    pub async fn toggle_habit(
        &self,
        user_id: i64,
        id: i64,
        date: NaiveDate,
    ) -> Result<ToggleOutcome> {
        habits::HabitRepo::toggle(&self.pool, user_id, id, date).await
    }

    // ========== Event Operations ==========

    pub async fn list_events(&self, user_id: i64, range: Option<MonthRange>) -> Result<Vec<Event>> {
        events::EventRepo::list(&self.pool, user_id, range).await
    }

    pub async fn create_event(&self, user_id: i64, fields: &EventFields) -> Result<Event> {
        events::EventRepo::create(&self.pool, user_id, fields).await
    }

    pub async fn update_event(&self, user_id: i64, id: i64, fields: &EventFields) -> Result<Event> {
        events::EventRepo::update(&self.pool, user_id, id, fields).await
    }

    pub async fn delete_event(&self, user_id: i64, id: i64) -> Result<()> {
        events::EventRepo::delete(&self.pool, user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    async fn test_store() -> Store {
        // Single connection: each pool connection of an in-memory SQLite
        // database is its own database.
        Store::with_pool_size(":memory:", 1).await.unwrap()
    }

    async fn seed_user(store: &Store, username: &str) -> i64 {
        store
            .create_user(username, "$2b$12$not.a.real.hash")
            .await
            .unwrap()
            .id
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn habit_fields(title: &str, start: &str) -> HabitFields {
        HabitFields {
            title: title.to_string(),
            description: None,
            start_date: date(start),
            frequency: "daily".to_string(),
            is_completed: None,
        }
    }

    fn event_fields(title: &str, day: &str, time: Option<&str>) -> EventFields {
        EventFields {
            title: title.to_string(),
            description: None,
            event_date: date(day),
            event_time: time.and_then(crate::models::parse_time),
        }
    }

    fn assert_not_found(err: &anyhow::Error) {
        assert!(
            err.downcast_ref::<NotFoundError>().is_some(),
            "expected NotFoundError, got: {err:#}"
        );
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_username() {
        let store = test_store().await;
        seed_user(&store, "alice").await;
        assert!(store.create_user("alice", "other-hash").await.is_err());
    }

    #[tokio::test]
    async fn create_habit_applies_defaults() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;

        let habit = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();
        assert_eq!(habit.title, "Run");
        assert_eq!(habit.frequency, "daily");
        assert!(!habit.is_completed);
        assert!(habit.completed_dates.is_empty());
    }

    #[tokio::test]
    async fn toggle_marks_then_unmarks() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let habit = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();

        let outcome = store
            .toggle_habit(user, habit.id, date("2024-01-02"))
            .await
            .unwrap();
        assert!(outcome.marked);
        assert_eq!(outcome.completed_dates, vec![date("2024-01-02")]);

        let outcome = store
            .toggle_habit(user, habit.id, date("2024-01-02"))
            .await
            .unwrap();
        assert!(!outcome.marked);
        assert!(outcome.completed_dates.is_empty());
    }

    #[tokio::test]
    async fn toggle_reports_transition_not_stored_flag() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let habit = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();

        let outcome = store
            .toggle_habit(user, habit.id, date("2024-01-02"))
            .await
            .unwrap();
        assert!(outcome.marked);

        // The stored habit-level flag is a separate field and stays false.
        let listed = store.list_habits(user).await.unwrap();
        assert!(!listed[0].is_completed);
    }

    #[tokio::test]
    async fn list_reconstructs_completion_sets() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let habit = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();

        for day in ["2024-01-03", "2024-01-01", "2024-01-02"] {
            store.toggle_habit(user, habit.id, date(day)).await.unwrap();
        }
        store
            .toggle_habit(user, habit.id, date("2024-01-02"))
            .await
            .unwrap();

        let listed = store.list_habits(user).await.unwrap();
        assert_eq!(
            listed[0].completed_dates,
            vec![date("2024-01-01"), date("2024-01-03")]
        );
    }

    #[tokio::test]
    async fn list_orders_newest_created_first() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let first = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();
        let second = store
            .create_habit(user, &habit_fields("Read", "2024-01-01"))
            .await
            .unwrap();

        let listed = store.list_habits(user).await.unwrap();
        assert_eq!(
            listed.iter().map(|h| h.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_preserves_flag() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let habit = store
            .create_habit(
                user,
                &HabitFields {
                    is_completed: Some(true),
                    ..habit_fields("Run", "2024-01-01")
                },
            )
            .await
            .unwrap();
        assert!(habit.is_completed);

        // is_completed omitted: stored value survives the overwrite
        let updated = store
            .update_habit(
                user,
                habit.id,
                &HabitFields {
                    description: Some("5k".to_string()),
                    ..habit_fields("Morning run", "2024-02-01")
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Morning run");
        assert_eq!(updated.description.as_deref(), Some("5k"));
        assert_eq!(updated.start_date, date("2024-02-01"));
        assert!(updated.is_completed);

        // is_completed supplied: overwritten
        let updated = store
            .update_habit(
                user,
                habit.id,
                &HabitFields {
                    is_completed: Some(false),
                    ..habit_fields("Morning run", "2024-02-01")
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_completed);
    }

    #[tokio::test]
    async fn delete_habit_cascades_to_completions() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let habit = store
            .create_habit(user, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();
        for day in ["2024-01-01", "2024-01-02"] {
            store.toggle_habit(user, habit.id, date(day)).await.unwrap();
        }

        assert_ok!(store.delete_habit(user, habit.id).await);

        // The habit had the highest rowid, so the recreated habit reuses it;
        // stale completion rows would show up here.
        let recreated = store
            .create_habit(user, &habit_fields("Run again", "2024-01-01"))
            .await
            .unwrap();
        assert_eq!(recreated.id, habit.id);
        let listed = store.list_habits(user).await.unwrap();
        assert!(listed[0].completed_dates.is_empty());
    }

    #[tokio::test]
    async fn habit_access_by_other_user_is_not_found() {
        let store = test_store().await;
        let alice = seed_user(&store, "alice").await;
        let mallory = seed_user(&store, "mallory").await;
        let habit = store
            .create_habit(alice, &habit_fields("Run", "2024-01-01"))
            .await
            .unwrap();

        let fields = habit_fields("Hijacked", "2024-01-01");
        assert_not_found(&store.update_habit(mallory, habit.id, &fields).await.unwrap_err());
        assert_not_found(&store.delete_habit(mallory, habit.id).await.unwrap_err());
        assert_not_found(
            &store
                .toggle_habit(mallory, habit.id, date("2024-01-02"))
                .await
                .unwrap_err(),
        );

        // Same shape as a genuinely missing id
        assert_not_found(&store.update_habit(alice, 9999, &fields).await.unwrap_err());

        // Nothing leaked into mallory's own view, and alice's habit is intact
        assert!(store.list_habits(mallory).await.unwrap().is_empty());
        assert_eq!(store.list_habits(alice).await.unwrap()[0].title, "Run");
    }

    #[tokio::test]
    async fn event_month_filter_is_half_open() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        for (title, day) in [
            ("Dentist", "2024-03-05"),
            ("Month end", "2024-03-31"),
            ("April fools", "2024-04-01"),
        ] {
            store
                .create_event(user, &event_fields(title, day, None))
                .await
                .unwrap();
        }

        let march = EventsQuery { month: Some(3), year: Some(2024) }
            .month_range()
            .unwrap();
        let events = store.list_events(user, march).await.unwrap();
        assert_eq!(
            events.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
            vec!["Dentist", "Month end"]
        );

        let april = EventsQuery { month: Some(4), year: Some(2024) }
            .month_range()
            .unwrap();
        let events = store.list_events(user, april).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "April fools");

        let all = store.list_events(user, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn events_sorted_by_date_then_time() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        for (title, day, time) in [
            ("Late", "2024-03-05", Some("17:00")),
            ("Early", "2024-03-05", Some("09:30")),
            ("Untimed", "2024-03-05", None),
            ("Previous day", "2024-03-04", Some("23:00")),
        ] {
            store
                .create_event(user, &event_fields(title, day, time))
                .await
                .unwrap();
        }

        let events = store.list_events(user, None).await.unwrap();
        assert_eq!(
            events.iter().map(|e| e.title.as_str()).collect::<Vec<_>>(),
            vec!["Previous day", "Untimed", "Early", "Late"]
        );
    }

    #[tokio::test]
    async fn event_update_overwrites_all_fields() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let event = store
            .create_event(user, &event_fields("Dentist", "2024-03-05", Some("09:30")))
            .await
            .unwrap();

        let updated = store
            .update_event(user, event.id, &event_fields("Dentist moved", "2024-03-06", None))
            .await
            .unwrap();
        assert_eq!(updated.title, "Dentist moved");
        assert_eq!(updated.event_date, date("2024-03-06"));
        assert_eq!(updated.event_time, None);
    }

    #[tokio::test]
    async fn event_access_by_other_user_is_not_found() {
        let store = test_store().await;
        let alice = seed_user(&store, "alice").await;
        let mallory = seed_user(&store, "mallory").await;
        let event = store
            .create_event(alice, &event_fields("Dentist", "2024-03-05", None))
            .await
            .unwrap();

        let fields = event_fields("Hijacked", "2024-03-05", None);
        assert_not_found(&store.update_event(mallory, event.id, &fields).await.unwrap_err());
        assert_not_found(&store.delete_event(mallory, event.id).await.unwrap_err());
        assert!(store.list_events(mallory, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_event_removes_it() {
        let store = test_store().await;
        let user = seed_user(&store, "alice").await;
        let event = store
            .create_event(user, &event_fields("Dentist", "2024-03-05", None))
            .await
            .unwrap();

        assert_ok!(store.delete_event(user, event.id).await);
        assert!(store.list_events(user, None).await.unwrap().is_empty());
        assert_not_found(&store.delete_event(user, event.id).await.unwrap_err());
    }
}
