use super::audit::AuditLog;
use super::permissions::PermissionService;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct PaymentService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
    registration_fee_cents: Cents,
}

impl PaymentService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        permissions: Arc<PermissionService>,
        audit: Arc<AuditLog>,
        registration_fee_cents: Cents,
    ) -> Self {
        Self {
            storage,
            permissions,
            audit,
            registration_fee_cents,
        }
    }

    /// Register a payment for review. The amount always comes from the
    /// activity price or the registration fee, never from the client.
    pub async fn create(
        &self,
        user: &User,
        request: CreatePaymentRequest,
    ) -> CongressResult<Payment> {
        let amount_cents = match request.activity_id {
            Some(activity_id) => {
                let activity = self.storage.get_activity(activity_id).await?;
                if !activity.is_active {
                    return Err(CongressError::invalid("activity is not active"));
                }
                if activity.is_free() {
                    return Err(CongressError::invalid("activity is free"));
                }
                activity.price_cents
            }
            None if self.registration_fee_cents > 0 => self.registration_fee_cents,
            None => {
                return Err(CongressError::invalid(
                    "no registration fee is configured",
                ))
            }
        };

        let payment = self
            .storage
            .create_payment(NewPayment {
                user_id: user.id,
                activity_id: request.activity_id,
                amount_cents,
                method: request.method,
                reference: request
                    .reference
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
            })
            .await?;

        info!(
            payment_id = %payment.id,
            user_id = %user.id,
            amount_cents,
            method = payment.method.as_str(),
            "Payment registered"
        );
        self.audit
            .record(
                NewAuditEntry::new("payment.created", "payment")
                    .actor(user.id)
                    .entity_id(payment.id)
                    .details(json!({
                        "activity_id": payment.activity_id,
                        "amount_cents": amount_cents,
                        "method": payment.method,
                    })),
            )
            .await;

        Ok(payment)
    }

    pub async fn confirm(&self, actor: &User, id: Uuid) -> CongressResult<Payment> {
        self.review(actor, id, PaymentStatus::Completed, "payment.confirmed")
            .await
    }

    pub async fn reject(&self, actor: &User, id: Uuid) -> CongressResult<Payment> {
        self.review(actor, id, PaymentStatus::Rejected, "payment.rejected")
            .await
    }

    async fn review(
        &self,
        actor: &User,
        id: Uuid,
        status: PaymentStatus,
        action: &str,
    ) -> CongressResult<Payment> {
        self.permissions
            .require(actor, Permission::ManagePayments)
            .await?;

        let payment = self.storage.review_payment(id, status, actor.id).await?;

        info!(payment_id = %payment.id, reviewer = %actor.id, status = status.as_str(), "Payment reviewed");
        self.audit
            .record(
                NewAuditEntry::new(action, "payment")
                    .actor(actor.id)
                    .entity_id(payment.id)
                    .details(json!({
                        "user_id": payment.user_id,
                        "activity_id": payment.activity_id,
                        "amount_cents": payment.amount_cents,
                    })),
            )
            .await;

        Ok(payment)
    }

    pub async fn my_payments(&self, user: &User) -> CongressResult<Vec<Payment>> {
        self.storage.list_payments(Some(user.id), None).await
    }

    pub async fn list(
        &self,
        actor: &User,
        status: Option<PaymentStatus>,
    ) -> CongressResult<Vec<Payment>> {
        self.permissions
            .require(actor, Permission::ManagePayments)
            .await?;
        self.storage.list_payments(None, status).await
    }
}
