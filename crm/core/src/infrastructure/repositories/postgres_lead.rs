// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Lead
//!
//! Lead lookup backed by the `leads` table.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements postgres lead

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::lead::{Lead, LeadId, LeadStatus, NewLead};
use crate::domain::repository::{LeadRepository, RepositoryError};

pub struct PostgresLeadRepository {
    pool: PgPool,
}

impl PostgresLeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for PostgresLeadRepository {
    async fn create(&self, lead: &NewLead) -> Result<LeadId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO leads (title, description, owner_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&lead.title)
        .bind(&lead.description)
        .bind(lead.owner_id)
        .bind(LeadStatus::New.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to create lead: {}", e)))?;

        Ok(LeadId(id))
    }

    async fn find_by_id(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, owner_id, status, created_at
            FROM leads
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_lead_row).transpose()
    }
}

fn parse_lead_row(row: PgRow) -> Result<Lead, RepositoryError> {
    let status: String = row.try_get("status")?;
    Ok(Lead {
        id: LeadId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
        owner_id: row.try_get("owner_id")?,
        status: LeadStatus::from(status),
        created_at: row.try_get("created_at")?,
    })
}
