// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration. The in-memory set shares state between the deal/document
//! repositories and the unit of work, so all of them are built together.

use std::sync::Arc;

use crate::domain::repository::{
    DealRepository, DocumentRepository, LeadRepository, SmsConfirmationRepository, StorageBackend,
    UnitOfWork,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{
    InMemoryDealRepository, InMemoryDocumentRepository, InMemoryLeadRepository,
    InMemorySmsConfirmationRepository, InMemoryUnitOfWork, PostgresDealRepository,
    PostgresDocumentRepository, PostgresLeadRepository, PostgresSmsConfirmationRepository,
    PostgresUnitOfWork,
};

/// Every store the workflow services consume
#[derive(Clone)]
pub struct Repositories {
    pub leads: Arc<dyn LeadRepository>,
    pub deals: Arc<dyn DealRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub confirmations: Arc<dyn SmsConfirmationRepository>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let deals = InMemoryDealRepository::new();
        let documents = InMemoryDocumentRepository::new();
        Self {
            leads: Arc::new(InMemoryLeadRepository::new()),
            unit_of_work: Arc::new(InMemoryUnitOfWork::new(deals.clone(), documents.clone())),
            deals: Arc::new(deals),
            documents: Arc::new(documents),
            confirmations: Arc::new(InMemorySmsConfirmationRepository::new()),
        }
    }

    pub fn postgres(database: &Database) -> Self {
        let pool = database.get_pool().clone();
        Self {
            leads: Arc::new(PostgresLeadRepository::new(pool.clone())),
            deals: Arc::new(PostgresDealRepository::new(pool.clone())),
            documents: Arc::new(PostgresDocumentRepository::new(pool.clone())),
            confirmations: Arc::new(PostgresSmsConfirmationRepository::new(pool.clone())),
            unit_of_work: Arc::new(PostgresUnitOfWork::new(pool)),
        }
    }
}

/// Creates the repository set for the configured backend. The PostgreSQL
/// backend requires a connected `Database`.
pub fn create_repositories(
    backend: &StorageBackend,
    database: Option<&Database>,
) -> anyhow::Result<Repositories> {
    match (backend, database) {
        (StorageBackend::InMemory, _) => Ok(Repositories::in_memory()),
        (StorageBackend::PostgreSQL(_), Some(database)) => Ok(Repositories::postgres(database)),
        (StorageBackend::PostgreSQL(_), None) => {
            anyhow::bail!("PostgreSQL backend selected but no database connection was provided")
        }
    }
}
