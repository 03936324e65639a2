use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Enrollment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    PendingPayment,
    Confirmed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::PendingPayment => "pending_payment",
            EnrollmentStatus::Confirmed => "confirmed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    /// Counts towards capacity and blocks a second enrollment
    pub fn is_open(&self) -> bool {
        !matches!(self, EnrollmentStatus::Cancelled)
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_payment" => Ok(EnrollmentStatus::PendingPayment),
            "confirmed" => Ok(EnrollmentStatus::Confirmed),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            other => Err(format!("unknown enrollment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Id,
    pub user_id: Id,
    pub activity_id: Id,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
