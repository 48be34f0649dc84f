// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres SMS Confirmation
//!
//! Confirmation codes backed by the `sms_confirmations` table. Updates are
//! guarded by the `version` column so two concurrent confirmations of the same
//! record cannot both succeed.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements postgres sms confirmation

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::document::DocumentId;
use crate::domain::repository::{RepositoryError, SmsConfirmationRepository};
use crate::domain::sms_confirmation::{ConfirmationId, NewSmsConfirmation, SmsConfirmation};

pub struct PostgresSmsConfirmationRepository {
    pool: PgPool,
}

impl PostgresSmsConfirmationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SmsConfirmationRepository for PostgresSmsConfirmationRepository {
    async fn create(&self, confirmation: &NewSmsConfirmation) -> Result<ConfirmationId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sms_confirmations (document_id, phone, sms_code, sent_at, confirmed, version)
            VALUES ($1, $2, $3, $4, FALSE, 0)
            RETURNING id
            "#,
        )
        .bind(confirmation.document_id.0)
        .bind(&confirmation.phone)
        .bind(&confirmation.code)
        .bind(confirmation.sent_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save sms confirmation: {}", e)))?;

        Ok(ConfirmationId(id))
    }

    async fn find_by_document_and_code(
        &self,
        document_id: DocumentId,
        code: &str,
    ) -> Result<Option<SmsConfirmation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, document_id, phone, sms_code, sent_at, confirmed, confirmed_at, version
            FROM sms_confirmations
            WHERE document_id = $1 AND sms_code = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(document_id.0)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_confirmation_row).transpose()
    }

    async fn find_latest_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<SmsConfirmation>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, document_id, phone, sms_code, sent_at, confirmed, confirmed_at, version
            FROM sms_confirmations
            WHERE document_id = $1
            ORDER BY sent_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(document_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_confirmation_row).transpose()
    }

    async fn update(&self, confirmation: &SmsConfirmation) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE sms_confirmations
            SET phone = $3, confirmed = $4, confirmed_at = $5, version = version + 1
            WHERE id = $1 AND version = $2
              AND NOT EXISTS (
                  SELECT 1 FROM sms_confirmations newer
                  WHERE newer.document_id = sms_confirmations.document_id
                    AND (newer.sent_at, newer.id) > (sms_confirmations.sent_at, sms_confirmations.id)
              )
            "#,
        )
        .bind(confirmation.id.0)
        .bind(confirmation.version)
        .bind(&confirmation.phone)
        .bind(confirmation.confirmed)
        .bind(confirmation.confirmed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update sms confirmation: {}", e)))?;

        if result.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sms_confirmations WHERE id = $1)")
                .bind(confirmation.id.0)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

            return Err(if exists {
                RepositoryError::Conflict(format!(
                    "sms confirmation {} changed concurrently or was superseded",
                    confirmation.id
                ))
            } else {
                RepositoryError::NotFound(format!("sms confirmation {}", confirmation.id))
            });
        }
        Ok(())
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sms_confirmations WHERE document_id = $1")
            .bind(document_id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete sms confirmations: {}", e)))?;

        Ok(result.rows_affected())
    }
}

fn parse_confirmation_row(row: PgRow) -> Result<SmsConfirmation, RepositoryError> {
    Ok(SmsConfirmation {
        id: ConfirmationId(row.try_get("id")?),
        document_id: DocumentId(row.try_get("document_id")?),
        phone: row.try_get("phone")?,
        code: row.try_get("sms_code")?,
        sent_at: row.try_get("sent_at")?,
        confirmed: row.try_get("confirmed")?,
        confirmed_at: row.try_get("confirmed_at")?,
        version: row.try_get("version")?,
    })
}
