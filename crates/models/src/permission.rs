use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Admin permissions, stored as a JSON array per admin user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManageActivities,
    ManageAttendance,
    ManagePayments,
    ManageDiplomas,
    ViewReports,
    ViewAuditLog,
    ManagePermissions,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::ManageUsers,
        Permission::ManageActivities,
        Permission::ManageAttendance,
        Permission::ManagePayments,
        Permission::ManageDiplomas,
        Permission::ViewReports,
        Permission::ViewAuditLog,
        Permission::ManagePermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ManageActivities => "manage_activities",
            Permission::ManageAttendance => "manage_attendance",
            Permission::ManagePayments => "manage_payments",
            Permission::ManageDiplomas => "manage_diplomas",
            Permission::ViewReports => "view_reports",
            Permission::ViewAuditLog => "view_audit_log",
            Permission::ManagePermissions => "manage_permissions",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission: {}", s))
    }
}

/// Permission record for one admin user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPermissions {
    pub user_id: Id,
    pub permissions: Vec<Permission>,
    pub granted_by: Option<Id>,
    pub updated_at: DateTime<Utc>,
}

impl AdminPermissions {
    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub permissions: Vec<Permission>,
}
