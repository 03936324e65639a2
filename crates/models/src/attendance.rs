use super::Id;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One QR scan. `activity_id == None` marks general congress attendance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Id,
    pub user_id: Id,
    pub activity_id: Option<Id>,
    pub session_date: NaiveDate,
    pub scanned_by: Option<Id>,
    pub scanned_at: DateTime<Utc>,
}

impl Attendance {
    pub fn is_general(&self) -> bool {
        self.activity_id.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: Id,
    pub activity_id: Option<Id>,
    pub session_date: NaiveDate,
    pub scanned_by: Option<Id>,
}

/// Body of a scan request: the raw QR payload read by the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub qr_code: String,
}

/// Who was checked in, shown on the scanner screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub institution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub attendance: Attendance,
    pub attendee: Attendee,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralAttendanceParams {
    pub date: Option<NaiveDate>,
}
