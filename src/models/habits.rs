use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Habit represents a user-defined recurring task. `completed_dates` is the
/// per-day completion set reconstructed from the store on list reads; the
/// stored `is_completed` flag is independent of it and only changed through
/// save requests.
#[derive(Debug, Clone, Serialize)]
pub struct Habit {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub frequency: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_dates: Vec<NaiveDate>,
}

/// Request body shared by POST /habits and PUT /habits/:id
#[derive(Debug, Clone, Deserialize)]
pub struct SaveHabitRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Validated habit fields ready for the store.
///
/// `is_completed` stays optional: create treats None as false, update treats
/// None as "keep the stored value".
#[derive(Debug, Clone)]
pub struct HabitFields {
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub frequency: String,
    pub is_completed: Option<bool>,
}

impl SaveHabitRequest {
    /// Validate and normalize the request. Err carries the client-facing message.
    pub fn validate(&self) -> Result<HabitFields, String> {
        if self.title.is_empty() {
            return Err("title and start_date are required".to_string());
        }
        let raw_date = self
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "title and start_date are required".to_string())?;
        let start_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| "start_date must be a YYYY-MM-DD date".to_string())?;

        Ok(HabitFields {
            title: self.title.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            start_date,
            // Free-form tag; daily/weekly/monthly is the advisory vocabulary
            frequency: self
                .frequency
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| "daily".to_string()),
            is_completed: self.is_completed,
        })
    }
}

/// Request body for POST /habits/:id/toggle
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub date: Option<String>,
}

/// Result of a toggle as reported by the store. `marked` is the transition
/// just performed: true when the date was inserted, false when removed.
#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub completed_dates: Vec<NaiveDate>,
    pub marked: bool,
}

/// Response for POST /habits/:id/toggle. The `is_completed` field reports the
/// just-performed transition, not the habit's stored flag.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub completed_dates: Vec<NaiveDate>,
    pub is_completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, start_date: Option<&str>) -> SaveHabitRequest {
        SaveHabitRequest {
            title: title.to_string(),
            description: None,
            start_date: start_date.map(String::from),
            frequency: None,
            is_completed: None,
        }
    }

    #[test]
    fn validate_requires_title_and_start_date() {
        assert!(request("", Some("2024-01-01")).validate().is_err());
        assert!(request("Run", None).validate().is_err());
        assert!(request("Run", Some("")).validate().is_err());
        assert!(request("Run", Some("2024-01-01")).validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_date() {
        assert!(request("Run", Some("01/01/2024")).validate().is_err());
        assert!(request("Run", Some("2024-13-01")).validate().is_err());
        assert!(request("Run", Some("not-a-date")).validate().is_err());
    }

    #[test]
    fn frequency_defaults_to_daily() {
        let fields = request("Run", Some("2024-01-01")).validate().unwrap();
        assert_eq!(fields.frequency, "daily");

        let mut req = request("Run", Some("2024-01-01"));
        req.frequency = Some(String::new());
        assert_eq!(req.validate().unwrap().frequency, "daily");
    }

    #[test]
    fn frequency_accepts_arbitrary_tags() {
        let mut req = request("Run", Some("2024-01-01"));
        req.frequency = Some("fortnightly".to_string());
        assert_eq!(req.validate().unwrap().frequency, "fortnightly");
    }

    #[test]
    fn empty_description_normalized_to_none() {
        let mut req = request("Run", Some("2024-01-01"));
        req.description = Some(String::new());
        assert_eq!(req.validate().unwrap().description, None);
    }
}
