use thiserror::Error;

/// Congress API errors
#[derive(Error, Debug)]
pub enum CongressError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Validation error: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Access denied: {reason}")]
    AuthorizationFailed { reason: String },

    #[error("{reason}")]
    Conflict { reason: String },

    #[error("Database error: {reason}")]
    DatabaseError { reason: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl CongressError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        CongressError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CongressError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        CongressError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        CongressError::AuthenticationFailed {
            reason: reason.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        CongressError::AuthorizationFailed {
            reason: reason.into(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        CongressError::Conflict {
            reason: reason.into(),
        }
    }

    pub fn database(reason: impl Into<String>) -> Self {
        CongressError::DatabaseError {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        CongressError::InternalError {
            reason: reason.into(),
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            CongressError::NotFound { .. } => 404,
            CongressError::ValidationError { .. } => 400,
            CongressError::InvalidRequest { .. } => 400,
            CongressError::AuthenticationFailed { .. } => 401,
            CongressError::AuthorizationFailed { .. } => 403,
            CongressError::Conflict { .. } => 409,
            CongressError::DatabaseError { .. } => 500,
            CongressError::ConfigError { .. } => 500,
            CongressError::InternalError { .. } => 500,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self {
            CongressError::NotFound { .. } => "resource",
            CongressError::ValidationError { .. } => "validation",
            CongressError::InvalidRequest { .. } => "request",
            CongressError::AuthenticationFailed { .. } => "auth",
            CongressError::AuthorizationFailed { .. } => "auth",
            CongressError::Conflict { .. } => "conflict",
            CongressError::DatabaseError { .. } => "database",
            CongressError::ConfigError { .. } => "config",
            CongressError::InternalError { .. } => "internal",
        }
    }

    /// Server-side failures whose detail must not reach clients
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Result type alias for congress operations
pub type CongressResult<T> = Result<T, CongressError>;

impl From<anyhow::Error> for CongressError {
    fn from(err: anyhow::Error) -> Self {
        CongressError::InternalError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CongressError {
    fn from(err: serde_json::Error) -> Self {
        CongressError::InternalError {
            reason: format!("serialization: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CongressError::not_found("Activity").status_code(), 404);
        assert_eq!(CongressError::validation("email", "bad").status_code(), 400);
        assert_eq!(CongressError::unauthorized("x").status_code(), 401);
        assert_eq!(CongressError::forbidden("x").status_code(), 403);
        assert_eq!(CongressError::conflict("x").status_code(), 409);
        assert_eq!(CongressError::database("x").status_code(), 500);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            CongressError::not_found("Activity").to_string(),
            "Activity not found"
        );
        assert_eq!(
            CongressError::conflict("attendance already recorded").to_string(),
            "attendance already recorded"
        );
        assert!(CongressError::internal("boom").is_internal());
        assert!(!CongressError::forbidden("no").is_internal());
    }
}
