use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role flags stored as a JSON array on the user row.
///
/// Ordering matters: a later variant is a "higher" role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Participant,
    Staff,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Staff => "staff",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Sort, dedup and make sure `Participant` is always present
    pub fn normalize(roles: impl IntoIterator<Item = Role>) -> Vec<Role> {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.push(Role::Participant);
        roles.sort();
        roles.dedup();
        roles
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "participant" => Ok(Role::Participant),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "super_admin" | "superadmin" => Ok(Role::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Registered user. Never serialized directly: use [`UserProfile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub institution: Option<String>,
    pub phone: Option<String>,
    pub qr_code: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn highest_role(&self) -> Role {
        self.roles.iter().copied().max().unwrap_or(Role::Participant)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            institution: self.institution.clone(),
            phone: self.phone.clone(),
            qr_code: self.qr_code.clone(),
            roles: self.roles.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub institution: Option<String>,
    pub phone: Option<String>,
    pub qr_code: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the users table
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub institution: Option<String>,
    pub phone: Option<String>,
    pub qr_code: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub institution: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRolesRequest {
    pub roles: Vec<Role>,
}

/// Query parameters for the admin user listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    /// Case-insensitive match on name or email, plus role membership
    pub fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role {
            if !user.has_role(role) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                user.full_name.to_lowercase().contains(&term)
                    || user.email.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}
