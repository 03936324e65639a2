//! Diploma records
//!
//! Only the records and their verification codes live here; rendering the
//! documents is left to the frontend.

use super::audit::AuditLog;
use super::mailer::{Notification, Notifier};
use super::permissions::PermissionService;
use congress_crypto::{normalize_verification_code, VerificationSigner};
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Input to the verification code HMAC
fn kind_tag(kind: &DiplomaKind) -> String {
    match kind {
        DiplomaKind::Participation => "participation".to_string(),
        DiplomaKind::Placement { place } => format!("placement:{}", place),
    }
}

/// Check a placement request before anything is written
pub fn validate_placements(awards: &[PlacementAward]) -> CongressResult<()> {
    if awards.is_empty() {
        return Err(CongressError::validation("placements", "must not be empty"));
    }

    let mut places = HashSet::new();
    let mut users = HashSet::new();
    for award in awards {
        if !(1..=MAX_PLACE).contains(&award.place) {
            return Err(CongressError::validation(
                "place",
                format!("must be between 1 and {}", MAX_PLACE),
            ));
        }
        if !places.insert(award.place) {
            return Err(CongressError::validation(
                "place",
                format!("place {} is listed more than once", award.place),
            ));
        }
        if !users.insert(award.user_id) {
            return Err(CongressError::validation(
                "user_id",
                format!("user {} is listed more than once", award.user_id),
            ));
        }
    }
    Ok(())
}

pub struct DiplomaService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
    signer: VerificationSigner,
    notifier: Arc<Notifier>,
}

impl DiplomaService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        permissions: Arc<PermissionService>,
        audit: Arc<AuditLog>,
        signer: VerificationSigner,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            storage,
            permissions,
            audit,
            signer,
            notifier,
        }
    }

    /// A unique index rejected the insert. Skip only when the same user
    /// already holds this diploma; a place taken by someone else, or any
    /// other collision, is reported.
    async fn resolve_conflict(
        &self,
        activity_id: Uuid,
        user_id: Uuid,
        kind: DiplomaKind,
        err: CongressError,
    ) -> CongressResult<Option<Diploma>> {
        let existing = self.storage.list_activity_diplomas(activity_id).await?;
        let holder = existing.iter().find(|d| d.kind == kind).map(|d| d.user_id);

        match (holder, kind) {
            (Some(holder), _) if holder == user_id => Ok(None),
            (Some(holder), DiplomaKind::Placement { place }) => {
                warn!(%activity_id, place, %holder, %user_id, "Place awarded concurrently");
                Err(CongressError::conflict(format!(
                    "place {} has already been awarded",
                    place
                )))
            }
            _ => {
                warn!(%activity_id, %user_id, error = %err, "Diploma insert conflict");
                Err(err)
            }
        }
    }

    /// Issue one diploma; `None` when the user already holds it
    async fn issue(
        &self,
        actor: &User,
        activity: &Activity,
        user_id: Uuid,
        kind: DiplomaKind,
    ) -> CongressResult<Option<Diploma>> {
        let verification_code = self
            .signer
            .code_for(&user_id, &activity.id, &kind_tag(&kind))
            .map_err(|e| CongressError::internal(e.to_string()))?;

        let diploma = match self
            .storage
            .create_diploma(NewDiploma {
                user_id,
                activity_id: activity.id,
                kind,
                verification_code,
            })
            .await
        {
            Ok(diploma) => diploma,
            Err(err @ CongressError::Conflict { .. }) => {
                return self.resolve_conflict(activity.id, user_id, kind, err).await
            }
            Err(e) => return Err(e),
        };

        self.audit
            .record(
                NewAuditEntry::new("diploma.issued", "diploma")
                    .actor(actor.id)
                    .entity_id(diploma.id)
                    .details(json!({
                        "user_id": user_id,
                        "activity_id": activity.id,
                        "kind": diploma.kind,
                    })),
            )
            .await;

        match self.storage.get_user(user_id).await {
            Ok(holder) => {
                self.notifier
                    .notify(Notification {
                        to: holder.email,
                        subject: format!("Your diploma for {}", activity.title),
                        body: format!(
                            "Hello {},\n\nyour {} diploma for \"{}\" is available. \
                             Verification code: {}\n",
                            holder.full_name,
                            diploma.kind.label().to_lowercase(),
                            activity.title,
                            diploma.verification_code
                        ),
                    })
                    .await
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "Diploma holder lookup failed"),
        }

        Ok(Some(diploma))
    }

    /// Participation diplomas for everyone who attended. Safe to run again:
    /// existing diplomas are counted as skipped.
    pub async fn generate_for_activity(
        &self,
        actor: &User,
        activity_id: Uuid,
    ) -> CongressResult<GenerateDiplomasResponse> {
        self.permissions
            .require(actor, Permission::ManageDiplomas)
            .await?;

        let activity = self.storage.get_activity(activity_id).await?;
        let holders: HashSet<Uuid> = self
            .storage
            .list_activity_diplomas(activity.id)
            .await?
            .into_iter()
            .filter(|d| d.kind == DiplomaKind::Participation)
            .map(|d| d.user_id)
            .collect();

        let mut attendees = Vec::new();
        let mut seen = HashSet::new();
        for record in self.storage.list_activity_attendance(activity.id).await? {
            if seen.insert(record.user_id) {
                attendees.push(record.user_id);
            }
        }

        let mut issued = Vec::new();
        let mut skipped = 0;
        for user_id in attendees {
            if holders.contains(&user_id) {
                skipped += 1;
                continue;
            }
            match self
                .issue(actor, &activity, user_id, DiplomaKind::Participation)
                .await?
            {
                Some(diploma) => issued.push(diploma),
                None => skipped += 1,
            }
        }

        info!(activity_id = %activity.id, issued = issued.len(), skipped, "Participation diplomas generated");
        Ok(GenerateDiplomasResponse {
            issued: issued.len(),
            skipped,
            diplomas: issued,
        })
    }

    /// Placement diplomas for a competition
    pub async fn award_placements(
        &self,
        actor: &User,
        activity_id: Uuid,
        awards: &[PlacementAward],
    ) -> CongressResult<GenerateDiplomasResponse> {
        self.permissions
            .require(actor, Permission::ManageDiplomas)
            .await?;

        let activity = self.storage.get_activity(activity_id).await?;
        if activity.kind != ActivityKind::Competition {
            return Err(CongressError::invalid(
                "placements can only be awarded for competitions",
            ));
        }
        validate_placements(awards)?;

        let attended: HashSet<Uuid> = self
            .storage
            .list_activity_attendance(activity.id)
            .await?
            .into_iter()
            .map(|a| a.user_id)
            .collect();
        let existing = self.storage.list_activity_diplomas(activity.id).await?;

        let mut to_issue = Vec::new();
        let mut skipped = 0;
        for award in awards {
            if !attended.contains(&award.user_id) {
                return Err(CongressError::invalid(format!(
                    "user {} did not attend this activity",
                    award.user_id
                )));
            }
            let kind = DiplomaKind::Placement { place: award.place };
            match existing.iter().find(|d| d.kind == kind) {
                Some(d) if d.user_id == award.user_id => skipped += 1,
                Some(_) => {
                    return Err(CongressError::conflict(format!(
                        "place {} has already been awarded",
                        award.place
                    )))
                }
                None => to_issue.push((award.user_id, kind)),
            }
        }

        let mut issued = Vec::new();
        for (user_id, kind) in to_issue {
            match self.issue(actor, &activity, user_id, kind).await? {
                Some(diploma) => issued.push(diploma),
                None => skipped += 1,
            }
        }

        info!(activity_id = %activity.id, issued = issued.len(), skipped, "Placement diplomas awarded");
        Ok(GenerateDiplomasResponse {
            issued: issued.len(),
            skipped,
            diplomas: issued,
        })
    }

    pub async fn my_diplomas(&self, user: &User) -> CongressResult<Vec<Diploma>> {
        self.storage.list_user_diplomas(user.id).await
    }

    /// Public lookup by verification code
    pub async fn verify(&self, code: &str) -> CongressResult<DiplomaVerification> {
        let code = normalize_verification_code(code);
        let diploma = self
            .storage
            .find_diploma_by_code(&code)
            .await?
            .ok_or_else(|| CongressError::not_found("Diploma"))?;

        let holder = self.storage.get_user(diploma.user_id).await?;
        let activity = self.storage.get_activity(diploma.activity_id).await?;

        Ok(DiplomaVerification {
            verification_code: diploma.verification_code,
            holder_name: holder.full_name,
            activity_title: activity.title,
            kind: diploma.kind,
            issued_at: diploma.issued_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use congress_storage::MemoryStorageBackend;

    fn award(place: u8) -> PlacementAward {
        PlacementAward {
            user_id: Uuid::new_v4(),
            place,
        }
    }

    #[test]
    fn test_validate_placements() {
        assert!(validate_placements(&[award(1), award(2), award(3)]).is_ok());
        assert!(validate_placements(&[]).is_err());
        assert!(validate_placements(&[award(0)]).is_err());
        assert!(validate_placements(&[award(4)]).is_err());
        assert!(validate_placements(&[award(1), award(1)]).is_err());

        let twice = award(1);
        let again = PlacementAward {
            user_id: twice.user_id,
            place: 2,
        };
        assert!(validate_placements(&[twice, again]).is_err());
    }

    fn service(storage: Arc<dyn StorageBackend>) -> DiplomaService {
        let audit = Arc::new(AuditLog::new(storage.clone()));
        DiplomaService::new(
            storage.clone(),
            Arc::new(PermissionService::new(storage, audit.clone())),
            audit,
            VerificationSigner::new(b"diploma-test-secret"),
            Arc::new(Notifier::default()),
        )
    }

    async fn participant(storage: &dyn StorageBackend, email: &str, qr: &str) -> User {
        storage
            .create_user(NewUser {
                full_name: email.to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                institution: None,
                phone: None,
                qr_code: qr.to_string(),
                roles: vec![Role::Participant],
            })
            .await
            .unwrap()
    }

    async fn competition(storage: &dyn StorageBackend) -> Activity {
        let now = chrono::Utc::now();
        let activity = Activity {
            id: Uuid::new_v4(),
            title: "Hackathon".to_string(),
            description: String::new(),
            kind: ActivityKind::Competition,
            speaker: None,
            location: None,
            starts_at: now,
            ends_at: now + chrono::Duration::hours(8),
            capacity: None,
            price_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        storage.create_activity(&activity).await.unwrap()
    }

    #[tokio::test]
    async fn test_place_taken_between_check_and_insert_is_conflict() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorageBackend::new());
        let diplomas = service(storage.clone());
        let admin = participant(storage.as_ref(), "admin@x.io", "ADMIN").await;
        let first = participant(storage.as_ref(), "first@x.io", "FIRST").await;
        let second = participant(storage.as_ref(), "second@x.io", "SECOND").await;
        let hackathon = competition(storage.as_ref()).await;
        let first_place = DiplomaKind::Placement { place: 1 };

        // Another request won the place after this one read the diploma list
        storage
            .create_diploma(NewDiploma {
                user_id: first.id,
                activity_id: hackathon.id,
                kind: first_place,
                verification_code: "DIP-RACE-WINR-0000-0001".to_string(),
            })
            .await
            .unwrap();

        let err = diplomas
            .issue(&admin, &hackathon, second.id, first_place)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "place 1 has already been awarded");

        // The winner retrying is still a skip
        let again = diplomas
            .issue(&admin, &hackathon, first.id, first_place)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_participation_reissue_is_skipped() {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryStorageBackend::new());
        let diplomas = service(storage.clone());
        let admin = participant(storage.as_ref(), "admin@x.io", "ADMIN").await;
        let holder = participant(storage.as_ref(), "holder@x.io", "HOLDER").await;
        let hackathon = competition(storage.as_ref()).await;

        let issued = diplomas
            .issue(&admin, &hackathon, holder.id, DiplomaKind::Participation)
            .await
            .unwrap();
        assert!(issued.is_some());

        let again = diplomas
            .issue(&admin, &hackathon, holder.id, DiplomaKind::Participation)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_kind_tags_differ_per_place() {
        assert_ne!(
            kind_tag(&DiplomaKind::Placement { place: 1 }),
            kind_tag(&DiplomaKind::Placement { place: 2 })
        );
        assert_eq!(kind_tag(&DiplomaKind::Participation), "participation");
    }
}
