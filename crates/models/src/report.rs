use super::{Cents, Id};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// General attendance count for one congress day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAttendance {
    pub session_date: NaiveDate,
    pub count: i64,
}

/// Congress-wide figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub total_activities: i64,
    pub active_activities: i64,
    pub confirmed_enrollments: i64,
    pub general_attendance: Vec<DailyAttendance>,
    pub activity_attendance_total: i64,
    pub revenue_cents: Cents,
    pub payments_by_status: BTreeMap<String, i64>,
    pub diplomas_issued: i64,
}

/// Figures for a single activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub activity_id: Id,
    pub title: String,
    pub pending_payment: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub attended: i64,
    pub attendance_rate: f64,
    pub diplomas_issued: i64,
}

impl ActivityReport {
    /// attended / confirmed, 0 when nobody is confirmed
    pub fn compute_rate(&mut self) {
        self.attendance_rate = if self.confirmed > 0 {
            self.attended as f64 / self.confirmed as f64
        } else {
            0.0
        };
    }
}
