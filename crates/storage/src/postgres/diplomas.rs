//! Diploma operations

use super::rows::{convert_rows, DiplomaRow};
use super::{db_error, query_error, PostgresStorageBackend};
use crate::conflicts;
use congress_models::*;
use uuid::Uuid;

const DIPLOMA_COLUMNS: &str = "id, user_id, activity_id, kind, place, verification_code, issued_at";

impl PostgresStorageBackend {
    pub async fn create_diploma_impl(&self, diploma: NewDiploma) -> CongressResult<Diploma> {
        let (kind, place) = diploma.kind.to_parts();

        sqlx::query_as::<_, DiplomaRow>(&format!(
            r#"
            INSERT INTO diplomas (id, user_id, activity_id, kind, place, verification_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            DIPLOMA_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(diploma.user_id)
        .bind(diploma.activity_id)
        .bind(kind)
        .bind(place)
        .bind(&diploma.verification_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, conflicts::DIPLOMA_ISSUED))?
        .try_into()
    }

    /// `column` is a fixed identifier chosen by the caller, never user input
    pub async fn list_diplomas_impl(
        &self,
        column: &'static str,
        id: Uuid,
    ) -> CongressResult<Vec<Diploma>> {
        let rows = sqlx::query_as::<_, DiplomaRow>(&format!(
            "SELECT {} FROM diplomas WHERE {} = $1 ORDER BY issued_at",
            DIPLOMA_COLUMNS, column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        convert_rows(rows)
    }

    pub async fn find_diploma_by_code_impl(&self, code: &str) -> CongressResult<Option<Diploma>> {
        sqlx::query_as::<_, DiplomaRow>(&format!(
            "SELECT {} FROM diplomas WHERE verification_code = $1",
            DIPLOMA_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Diploma::try_from)
        .transpose()
    }
}
