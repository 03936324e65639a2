//! Payment operations

use super::rows::{convert_rows, PaymentRow};
use super::{db_error, query_error, PostgresStorageBackend};
use crate::conflicts;
use congress_models::*;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, user_id, activity_id, amount_cents, method, reference, status, \
                               created_at, reviewed_by, reviewed_at";

impl PostgresStorageBackend {
    pub async fn create_payment_impl(&self, payment: NewPayment) -> CongressResult<Payment> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (id, user_id, activity_id, amount_cents, method, reference, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(payment.user_id)
        .bind(payment.activity_id)
        .bind(payment.amount_cents)
        .bind(payment.method.as_str())
        .bind(&payment.reference)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, conflicts::PAYMENT_OPEN))?
        .try_into()
    }

    pub async fn get_payment_impl(&self, id: Uuid) -> CongressResult<Payment> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Payment"))?
        .try_into()
    }

    /// Review a pending payment; a completed activity payment confirms the
    /// matching pending enrollment in the same transaction
    pub async fn review_payment_impl(
        &self,
        id: Uuid,
        status: PaymentStatus,
        reviewer: Uuid,
    ) -> CongressResult<Payment> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let current = sqlx::query_scalar::<_, String>(
            "SELECT status FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Payment"))?;
        if current != PaymentStatus::Pending.as_str() {
            return Err(CongressError::conflict(conflicts::PAYMENT_REVIEWED));
        }

        let payment: Payment = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments
            SET status = $2, reviewed_by = $3, reviewed_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(reviewer)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?
        .try_into()?;

        if let (PaymentStatus::Completed, Some(activity_id)) = (status, payment.activity_id) {
            sqlx::query(
                r#"
                UPDATE enrollments
                SET status = 'confirmed', updated_at = NOW()
                WHERE user_id = $1 AND activity_id = $2 AND status = 'pending_payment'
                "#,
            )
            .bind(payment.user_id)
            .bind(activity_id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(payment)
    }

    pub async fn list_payments_impl(
        &self,
        user_id: Option<Uuid>,
        status: Option<PaymentStatus>,
    ) -> CongressResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            SELECT {}
            FROM payments
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        convert_rows(rows)
    }

    pub async fn has_completed_payment_impl(
        &self,
        user_id: Uuid,
        activity_id: Option<Uuid>,
    ) -> CongressResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM payments
                WHERE user_id = $1
                  AND activity_id IS NOT DISTINCT FROM $2
                  AND status = 'completed'
            )
            "#,
        )
        .bind(user_id)
        .bind(activity_id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }
}
