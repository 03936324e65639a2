use super::{CongressError, CongressResult, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest placement awarded in a competition
pub const MAX_PLACE: u8 = 3;

/// What a diploma certifies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiplomaKind {
    Participation,
    Placement { place: u8 },
}

impl DiplomaKind {
    /// Column representation: `(kind, place)`
    pub fn to_parts(&self) -> (&'static str, Option<i16>) {
        match self {
            DiplomaKind::Participation => ("participation", None),
            DiplomaKind::Placement { place } => ("placement", Some(i16::from(*place))),
        }
    }

    pub fn from_parts(kind: &str, place: Option<i16>) -> CongressResult<Self> {
        match (kind, place) {
            ("participation", _) => Ok(DiplomaKind::Participation),
            ("placement", Some(p)) if (1..=i16::from(MAX_PLACE)).contains(&p) => {
                Ok(DiplomaKind::Placement { place: p as u8 })
            }
            (other, place) => Err(CongressError::database(format!(
                "invalid diploma kind: {} / {:?}",
                other, place
            ))),
        }
    }

    pub fn label(&self) -> String {
        match self {
            DiplomaKind::Participation => "Participation".to_string(),
            DiplomaKind::Placement { place } => format!("Place #{}", place),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diploma {
    pub id: Id,
    pub user_id: Id,
    pub activity_id: Id,
    pub kind: DiplomaKind,
    pub verification_code: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDiploma {
    pub user_id: Id,
    pub activity_id: Id,
    pub kind: DiplomaKind,
    pub verification_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDiplomasResponse {
    pub issued: usize,
    pub skipped: usize,
    pub diplomas: Vec<Diploma>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementAward {
    pub user_id: Id,
    pub place: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardPlacementsRequest {
    pub placements: Vec<PlacementAward>,
}

/// Public answer for a diploma verification lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiplomaVerification {
    pub verification_code: String,
    pub holder_name: String,
    pub activity_title: String,
    pub kind: DiplomaKind,
    pub issued_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parts() {
        let kind = DiplomaKind::Placement { place: 2 };
        let (name, place) = kind.to_parts();
        assert_eq!(DiplomaKind::from_parts(name, place).unwrap(), kind);
        assert!(DiplomaKind::from_parts("placement", Some(4)).is_err());
        assert!(DiplomaKind::from_parts("placement", None).is_err());
    }

    #[test]
    fn test_kind_json_shape() {
        let json = serde_json::to_value(DiplomaKind::Placement { place: 1 }).unwrap();
        assert_eq!(json["type"], "placement");
        assert_eq!(json["place"], 1);
    }
}
