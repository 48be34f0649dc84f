// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Unit of Work
//!
//! Runs the deal and document inserts of document creation on one SQL
//! transaction. A transaction dropped without `commit` is rolled back by sqlx.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Transaction};

use super::postgres_deal::insert_deal;
use super::postgres_document::insert_document;
use crate::domain::deal::{DealId, NewDeal};
use crate::domain::document::{DocumentId, NewDocument};
use crate::domain::repository::{DocumentTransaction, RepositoryError, UnitOfWork};

pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn DocumentTransaction>, RepositoryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to begin transaction: {}", e)))?;
        Ok(Box::new(PostgresDocumentTransaction { tx }))
    }
}

struct PostgresDocumentTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl DocumentTransaction for PostgresDocumentTransaction {
    async fn create_deal(&mut self, deal: &NewDeal) -> Result<DealId, RepositoryError> {
        insert_deal(&mut *self.tx, deal).await
    }

    async fn create_document(&mut self, document: &NewDocument) -> Result<DocumentId, RepositoryError> {
        insert_document(&mut *self.tx, document).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to roll back transaction: {}", e)))
    }
}
