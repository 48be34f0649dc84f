// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Deal
//!
//! Deal persistence backed by the `deals` table.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements postgres deal

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Executor, Postgres, Row};

use crate::domain::deal::{Deal, DealId, NewDeal};
use crate::domain::lead::LeadId;
use crate::domain::repository::{DealRepository, RepositoryError};

pub struct PostgresDealRepository {
    pool: PgPool,
}

impl PostgresDealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Shared with the unit of work, which runs the same insert on a transaction
pub(super) async fn insert_deal<'e, E>(executor: E, deal: &NewDeal) -> Result<DealId, RepositoryError>
where
    E: Executor<'e, Database = Postgres>,
{
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO deals (lead_id, amount_minor, currency, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(deal.lead_id.0)
    .bind(deal.amount_minor)
    .bind(&deal.currency)
    .bind(&deal.status)
    .bind(deal.created_at)
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::Database(format!("Failed to create deal: {}", e)))?;

    Ok(DealId(id))
}

#[async_trait]
impl DealRepository for PostgresDealRepository {
    async fn create(&self, deal: &NewDeal) -> Result<DealId, RepositoryError> {
        insert_deal(&self.pool, deal).await
    }

    async fn find_by_id(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, lead_id, amount_minor, currency, status, created_at
            FROM deals
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_deal_row).transpose()
    }

    async fn find_latest_by_lead(&self, lead_id: LeadId) -> Result<Option<Deal>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, lead_id, amount_minor, currency, status, created_at
            FROM deals
            WHERE lead_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(lead_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_deal_row).transpose()
    }
}

fn parse_deal_row(row: PgRow) -> Result<Deal, RepositoryError> {
    Ok(Deal {
        id: DealId(row.try_get("id")?),
        lead_id: LeadId(row.try_get("lead_id")?),
        amount_minor: row.try_get("amount_minor")?,
        currency: row.try_get("currency")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created_at")?,
    })
}
