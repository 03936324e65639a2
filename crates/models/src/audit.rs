use super::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default and upper bound for audit listings
pub const DEFAULT_AUDIT_LIMIT: u32 = 100;
pub const MAX_AUDIT_LIMIT: u32 = 500;

/// System log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Id,
    pub actor_id: Option<Id>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Id>,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Option<Id>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Id>,
    pub details: Value,
}

impl NewAuditEntry {
    pub fn new(action: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            actor_id: None,
            action: action.into(),
            entity: entity.into(),
            entity_id: None,
            details: Value::Null,
        }
    }

    pub fn actor(mut self, actor_id: Id) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn entity_id(mut self, entity_id: Id) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditListParams {
    pub entity: Option<String>,
    pub limit: Option<u32>,
}

impl AuditListParams {
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_AUDIT_LIMIT)
            .clamp(1, MAX_AUDIT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(limit: Option<u32>) -> u32 {
        AuditListParams {
            entity: None,
            limit,
        }
        .effective_limit()
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(limit(None), DEFAULT_AUDIT_LIMIT);
        assert_eq!(limit(Some(0)), 1);
        assert_eq!(limit(Some(25)), 25);
        assert_eq!(limit(Some(MAX_AUDIT_LIMIT)), MAX_AUDIT_LIMIT);
        assert_eq!(limit(Some(10_000)), MAX_AUDIT_LIMIT);
    }
}
