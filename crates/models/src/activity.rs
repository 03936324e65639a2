use super::{Cents, CongressError, CongressResult, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Activity kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Workshop,
    Conference,
    Competition,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Workshop => "workshop",
            ActivityKind::Conference => "conference",
            ActivityKind::Competition => "competition",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workshop" => Ok(ActivityKind::Workshop),
            "conference" => Ok(ActivityKind::Conference),
            "competition" => Ok(ActivityKind::Competition),
            other => Err(format!("unknown activity kind: {}", other)),
        }
    }
}

/// Congress activity (workshop, talk or competition)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub kind: ActivityKind,
    pub speaker: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_cents: Cents,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    pub fn validate(&self) -> CongressResult<()> {
        validate_fields(
            &self.title,
            self.starts_at,
            self.ends_at,
            self.capacity,
            self.price_cents,
        )
    }
}

fn validate_fields(
    title: &str,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    capacity: Option<i32>,
    price_cents: Cents,
) -> CongressResult<()> {
    if title.trim().is_empty() {
        return Err(CongressError::validation("title", "must not be empty"));
    }
    if ends_at <= starts_at {
        return Err(CongressError::validation(
            "ends_at",
            "must be later than starts_at",
        ));
    }
    if matches!(capacity, Some(c) if c <= 0) {
        return Err(CongressError::validation("capacity", "must be positive"));
    }
    if price_cents < 0 {
        return Err(CongressError::validation(
            "price_cents",
            "must not be negative",
        ));
    }
    Ok(())
}

/// Activity listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    #[serde(flatten)]
    pub activity: Activity,
    pub enrolled_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: ActivityKind,
    pub speaker: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_cents: Option<Cents>,
}

impl CreateActivityRequest {
    pub fn into_activity(self, id: Id, now: DateTime<Utc>) -> CongressResult<Activity> {
        let activity = Activity {
            id,
            title: self.title.trim().to_string(),
            description: self.description,
            kind: self.kind,
            speaker: self.speaker,
            location: self.location,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            capacity: self.capacity,
            price_cents: self.price_cents.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        activity.validate()?;
        Ok(activity)
    }
}

/// `None` when the field is absent, `Some(None)` for an explicit `null`
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields keep their value. `speaker`, `location`
/// and `capacity` are cleared by sending `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ActivityKind>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub speaker: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Option<i32>>,
    pub price_cents: Option<Cents>,
    pub is_active: Option<bool>,
}

impl UpdateActivityRequest {
    pub fn apply(self, activity: &mut Activity, now: DateTime<Utc>) -> CongressResult<()> {
        if let Some(title) = self.title {
            activity.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            activity.description = description;
        }
        if let Some(kind) = self.kind {
            activity.kind = kind;
        }
        if let Some(speaker) = self.speaker {
            activity.speaker = speaker;
        }
        if let Some(location) = self.location {
            activity.location = location;
        }
        if let Some(starts_at) = self.starts_at {
            activity.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            activity.ends_at = ends_at;
        }
        if let Some(capacity) = self.capacity {
            activity.capacity = capacity;
        }
        if let Some(price) = self.price_cents {
            activity.price_cents = price;
        }
        if let Some(active) = self.is_active {
            activity.is_active = active;
        }
        activity.updated_at = now;
        activity.validate()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityListParams {
    pub include_inactive: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn request() -> CreateActivityRequest {
        let start = Utc::now();
        CreateActivityRequest {
            title: "  Rust for the Web ".to_string(),
            description: String::new(),
            kind: ActivityKind::Workshop,
            speaker: None,
            location: Some("Lab 3".to_string()),
            starts_at: start,
            ends_at: start + Duration::hours(2),
            capacity: Some(30),
            price_cents: None,
        }
    }

    #[test]
    fn test_create_defaults() {
        let activity = request().into_activity(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(activity.title, "Rust for the Web");
        assert!(activity.is_free());
        assert!(activity.is_active);
    }

    #[test]
    fn test_rejects_inverted_schedule() {
        let mut req = request();
        req.ends_at = req.starts_at - Duration::minutes(1);
        let err = req.into_activity(Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_update_validates_result() {
        let mut activity = request().into_activity(Uuid::new_v4(), Utc::now()).unwrap();
        let update = UpdateActivityRequest {
            capacity: Some(Some(0)),
            ..Default::default()
        };
        assert!(update.apply(&mut activity, Utc::now()).is_err());
    }

    #[test]
    fn test_update_null_clears_optional_fields() {
        let mut activity = request().into_activity(Uuid::new_v4(), Utc::now()).unwrap();
        activity.speaker = Some("Grace Hopper".to_string());

        let update: UpdateActivityRequest =
            serde_json::from_str(r#"{"capacity": null, "location": null}"#).unwrap();
        assert_eq!(update.capacity, Some(None));
        assert_eq!(update.speaker, None);
        update.apply(&mut activity, Utc::now()).unwrap();

        assert_eq!(activity.capacity, None);
        assert_eq!(activity.location, None);
        assert_eq!(activity.speaker.as_deref(), Some("Grace Hopper"));

        let update: UpdateActivityRequest =
            serde_json::from_str(r#"{"capacity": 12}"#).unwrap();
        update.apply(&mut activity, Utc::now()).unwrap();
        assert_eq!(activity.capacity, Some(12));
    }
}
