// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Document
//!
//! Document rows backed by the `documents` table.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements postgres document

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Executor, Postgres, Row};

use crate::domain::deal::DealId;
use crate::domain::document::{Document, DocumentId, DocumentStatus, DocumentType, NewDocument};
use crate::domain::repository::{DocumentRepository, RepositoryError};

const DOCUMENT_COLUMNS: &str = "id, deal_id, doc_type, file_path, status, signed_at, created_at";

pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(super) async fn insert_document<'e, E>(
    executor: E,
    document: &NewDocument,
) -> Result<DocumentId, RepositoryError>
where
    E: Executor<'e, Database = Postgres>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO documents (deal_id, doc_type, file_path, status, signed_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(document.deal_id.0)
    .bind(document.doc_type.as_str())
    .bind(&document.file_path)
    .bind(document.status.as_str())
    .bind(document.signed_at)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::Database(format!("Failed to create document: {}", e)))?;

    Ok(DocumentId(id))
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn create(&self, document: &NewDocument) -> Result<DocumentId, RepositoryError> {
        insert_document(&self.pool, document).await
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM documents WHERE id = $1", DOCUMENT_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_document_row).transpose()
    }

    async fn update_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        signed_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = $2, signed_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(status.as_str())
        .bind(signed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update document: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete document: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }

    async fn list_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM documents WHERE deal_id = $1 ORDER BY id ASC",
            DOCUMENT_COLUMNS
        ))
        .bind(deal_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(parse_document_row).collect()
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Document>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM documents ORDER BY id ASC LIMIT $1 OFFSET $2",
            DOCUMENT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(parse_document_row).collect()
    }
}

fn parse_document_row(row: PgRow) -> Result<Document, RepositoryError> {
    let doc_type: String = row.try_get("doc_type")?;
    let status: String = row.try_get("status")?;
    Ok(Document {
        id: DocumentId(row.try_get("id")?),
        deal_id: DealId(row.try_get("deal_id")?),
        doc_type: DocumentType::from(doc_type),
        file_path: row.try_get("file_path")?,
        status: status.parse::<DocumentStatus>()?,
        signed_at: row.try_get("signed_at")?,
        created_at: row.try_get("created_at")?,
    })
}
