// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the aggregates the document workflow touches:
//! one repository per aggregate, interface defined in the domain layer,
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `LeadRepository` | `Lead` | `InMemoryLeadRepository`, `PostgresLeadRepository` |
//! | `DealRepository` | `Deal` | `InMemoryDealRepository`, `PostgresDealRepository` |
//! | `DocumentRepository` | `Document` | `InMemoryDocumentRepository`, `PostgresDocumentRepository` |
//! | `SmsConfirmationRepository` | `SmsConfirmation` | `InMemorySmsConfirmationRepository`, `PostgresSmsConfirmationRepository` |
//! | `UnitOfWork` | `Deal` + `Document` | `InMemoryUnitOfWork`, `PostgresUnitOfWork` |
//!
//! ## Storage Backend Abstraction
//!
//! Concrete implementations are selected at startup from `turcrm-config.yaml`
//! (`spec.database.backend`). In-memory implementations serve development and
//! tests; PostgreSQL implementations serve production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::deal::{Deal, DealId, NewDeal};
use crate::domain::document::{Document, DocumentId, DocumentStatus, NewDocument};
use crate::domain::lead::{Lead, LeadId, NewLead};
use crate::domain::sms_confirmation::{ConfirmationId, NewSmsConfirmation, SmsConfirmation};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Lead store. Full lead CRUD belongs to the intake service; the workflow only
/// reads leads, `create` exists for seeding.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create(&self, lead: &NewLead) -> Result<LeadId, RepositoryError>;

    async fn find_by_id(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError>;
}

#[async_trait]
pub trait DealRepository: Send + Sync {
    async fn create(&self, deal: &NewDeal) -> Result<DealId, RepositoryError>;

    async fn find_by_id(&self, id: DealId) -> Result<Option<Deal>, RepositoryError>;

    /// Most recently created deal of a lead
    async fn find_latest_by_lead(&self, lead_id: LeadId) -> Result<Option<Deal>, RepositoryError>;
}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &NewDocument) -> Result<DocumentId, RepositoryError>;

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError>;

    /// Set status (and signing time). `NotFound` when no row matches.
    async fn update_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        signed_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError>;

    /// Delete by id. `NotFound` when no row matches.
    async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError>;

    /// Documents of a deal in creation order
    async fn list_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, RepositoryError>;

    /// Page through all documents in creation order
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Document>, RepositoryError>;
}

#[async_trait]
pub trait SmsConfirmationRepository: Send + Sync {
    async fn create(&self, confirmation: &NewSmsConfirmation) -> Result<ConfirmationId, RepositoryError>;

    /// Most recent record of `document_id` carrying exactly `code`
    async fn find_by_document_and_code(
        &self,
        document_id: DocumentId,
        code: &str,
    ) -> Result<Option<SmsConfirmation>, RepositoryError>;

    /// Most recently sent record of a document
    async fn find_latest_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<SmsConfirmation>, RepositoryError>;

    /// Optimistic update: succeeds only if the stored version still equals
    /// `confirmation.version` and no newer record of the same document
    /// exists, and bumps the version. Otherwise `Conflict`.
    async fn update(&self, confirmation: &SmsConfirmation) -> Result<(), RepositoryError>;

    /// Remove every record of a document, returns the number removed
    async fn delete_by_document(&self, document_id: DocumentId) -> Result<u64, RepositoryError>;
}

/// Atomic boundary for the deal-then-document writes of document creation.
/// Dropping an uncommitted transaction discards its writes.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn DocumentTransaction>, RepositoryError>;
}

#[async_trait]
pub trait DocumentTransaction: Send {
    async fn create_deal(&mut self, deal: &NewDeal) -> Result<DealId, RepositoryError>;

    async fn create_document(&mut self, document: &NewDocument) -> Result<DocumentId, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<crate::domain::document::DocumentError> for RepositoryError {
    fn from(err: crate::domain::document::DocumentError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
