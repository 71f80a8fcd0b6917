use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Event represents a calendar entry on a specific date, optionally at a
/// specific time of day.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub event_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

/// Request body shared by POST /events and PUT /events/:id
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEventRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
}

/// Validated event fields ready for the store.
#[derive(Debug, Clone)]
pub struct EventFields {
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
}

impl SaveEventRequest {
    /// Validate and normalize the request. Err carries the client-facing message.
    pub fn validate(&self) -> Result<EventFields, String> {
        if self.title.is_empty() {
            return Err("title and event_date are required".to_string());
        }
        let raw_date = self
            .event_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "title and event_date are required".to_string())?;
        let event_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| "event_date must be a YYYY-MM-DD date".to_string())?;

        let event_time = match self.event_time.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                parse_time(raw).ok_or_else(|| "event_time must be an HH:MM time".to_string())?,
            ),
            None => None,
        };

        Ok(EventFields {
            title: self.title.clone(),
            description: self.description.clone().filter(|d| !d.is_empty()),
            event_date,
            event_time,
        })
    }
}

/// Query parameters for GET /events
#[derive(Debug, Clone, Deserialize)]
pub struct EventsQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

/// Half-open calendar-month date range: `from <= event_date < to`
#[derive(Debug, Clone, Copy)]
pub struct MonthRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl EventsQuery {
    /// Resolve the month/year pair into a date range. Supplying only one of
    /// the two is rejected rather than silently ignored.
    pub fn month_range(&self) -> Result<Option<MonthRange>, String> {
        match (self.month, self.year) {
            (None, None) => Ok(None),
            (Some(month), Some(year)) => {
                let from = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| "month must be between 1 and 12".to_string())?;
                let to = if month == 12 {
                    NaiveDate::from_ymd_opt(year + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(year, month + 1, 1)
                }
                .ok_or_else(|| "month must be between 1 and 12".to_string())?;
                Ok(Some(MonthRange { from, to }))
            }
            _ => Err("month and year must be supplied together".to_string()),
        }
    }
}

/// Parse a time-of-day string, accepting both HH:MM and HH:MM:SS.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Serde adapter rendering times as HH:MM on the wire.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    #[allow(dead_code)]
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) => super::parse_time(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom("expected an HH:MM time")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, date: Option<&str>, time: Option<&str>) -> SaveEventRequest {
        SaveEventRequest {
            title: title.to_string(),
            description: None,
            event_date: date.map(String::from),
            event_time: time.map(String::from),
        }
    }

    #[test]
    fn validate_requires_title_and_date() {
        assert!(request("", Some("2024-03-05"), None).validate().is_err());
        assert!(request("Dentist", None, None).validate().is_err());
        assert!(request("Dentist", Some("2024-03-05"), None).validate().is_ok());
    }

    #[test]
    fn validate_accepts_both_time_formats() {
        let fields = request("Dentist", Some("2024-03-05"), Some("09:30"))
            .validate()
            .unwrap();
        assert_eq!(fields.event_time, NaiveTime::from_hms_opt(9, 30, 0));

        let fields = request("Dentist", Some("2024-03-05"), Some("09:30:00"))
            .validate()
            .unwrap();
        assert_eq!(fields.event_time, NaiveTime::from_hms_opt(9, 30, 0));

        assert!(request("Dentist", Some("2024-03-05"), Some("9 am"))
            .validate()
            .is_err());
    }

    #[test]
    fn event_time_serializes_as_hhmm() {
        let event = Event {
            id: 1,
            user_id: 1,
            title: "Dentist".to_string(),
            description: None,
            event_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            event_time: NaiveTime::from_hms_opt(9, 30, 0),
            created_at: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_time"], "09:30");
        assert_eq!(json["event_date"], "2024-03-05");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn month_range_requires_both_or_neither() {
        let query = EventsQuery { month: Some(3), year: None };
        assert!(query.month_range().is_err());

        let query = EventsQuery { month: None, year: Some(2024) };
        assert!(query.month_range().is_err());

        let query = EventsQuery { month: None, year: None };
        assert!(query.month_range().unwrap().is_none());
    }

    #[test]
    fn month_range_is_half_open() {
        let query = EventsQuery { month: Some(3), year: Some(2024) };
        let range = query.month_range().unwrap().unwrap();
        assert_eq!(range.from, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(range.to, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn month_range_rolls_over_december() {
        let query = EventsQuery { month: Some(12), year: Some(2024) };
        let range = query.month_range().unwrap().unwrap();
        assert_eq!(range.to, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn month_range_rejects_out_of_range_month() {
        let query = EventsQuery { month: Some(13), year: Some(2024) };
        assert!(query.month_range().is_err());

        let query = EventsQuery { month: Some(0), year: Some(2024) };
        assert!(query.month_range().is_err());
    }
}
