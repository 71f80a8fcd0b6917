use sqlx::{sqlite::SqliteRow, Row};

use crate::models::{Event, Habit, User};

/// Filter empty strings to None — used when DB stores '' instead of NULL
pub fn none_if_empty(opt: Option<String>) -> Option<String> {
    opt.filter(|s| !s.is_empty())
}

/// Map a SQLite row to a User struct
pub fn map_user_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

/// Map a SQLite row to a Habit struct. The completion-date set lives in its
/// own table and is filled in by the read path.
pub fn map_habit_row(row: &SqliteRow) -> Habit {
    Habit {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: none_if_empty(row.get("description")),
        start_date: row.get("start_date"),
        frequency: row.get("frequency"),
        is_completed: row.get("is_completed"),
        created_at: row.get("created_at"),
        completed_dates: Vec::new(),
    }
}

/// Map a SQLite row to an Event struct
pub fn map_event_row(row: &SqliteRow) -> Event {
    Event {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: none_if_empty(row.get("description")),
        event_date: row.get("event_date"),
        event_time: row
            .get::<Option<String>, _>("event_time")
            .as_deref()
            .and_then(crate::models::parse_time),
        created_at: row.get("created_at"),
    }
}
