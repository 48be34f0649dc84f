// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! `crate::domain::repository`.
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresLeadRepository** - Lead lookup
//! - **PostgresDealRepository** - Deals owned by leads
//! - **PostgresDocumentRepository** - Document rows and status transitions
//! - **PostgresSmsConfirmationRepository** - Confirmation codes with optimistic updates
//! - **PostgresUnitOfWork** - Deal + document writes in one SQL transaction
//!
//! ## In-Memory Repositories
//!
//! HashMap-backed storage for tests and development. Ids come from per-table
//! counters and are never reused, even when a unit of work is rolled back.

pub mod postgres_lead;
pub mod postgres_deal;
pub mod postgres_document;
pub mod postgres_sms_confirmation;
pub mod postgres_unit_of_work;

pub use postgres_deal::PostgresDealRepository;
pub use postgres_document::PostgresDocumentRepository;
pub use postgres_lead::PostgresLeadRepository;
pub use postgres_sms_confirmation::PostgresSmsConfirmationRepository;
pub use postgres_unit_of_work::PostgresUnitOfWork;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::deal::{Deal, DealId, NewDeal};
use crate::domain::document::{Document, DocumentId, DocumentStatus, NewDocument};
use crate::domain::lead::{Lead, LeadId, LeadStatus, NewLead};
use crate::domain::repository::{
    DealRepository, DocumentRepository, DocumentTransaction, LeadRepository, RepositoryError,
    SmsConfirmationRepository, UnitOfWork,
};
use crate::domain::sms_confirmation::{ConfirmationId, NewSmsConfirmation, SmsConfirmation};

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Database("in-memory store lock poisoned".to_string())
}

/// Monotonic id source shared by clones of a repository
#[derive(Clone)]
struct Sequence(Arc<AtomicI64>);

impl Sequence {
    fn new() -> Self {
        Self(Arc::new(AtomicI64::new(1)))
    }

    fn next(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct InMemoryLeadRepository {
    leads: Arc<RwLock<BTreeMap<LeadId, Lead>>>,
    ids: Sequence,
}

impl InMemoryLeadRepository {
    pub fn new() -> Self {
        Self {
            leads: Arc::new(RwLock::new(BTreeMap::new())),
            ids: Sequence::new(),
        }
    }
}

impl Default for InMemoryLeadRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeadRepository for InMemoryLeadRepository {
    async fn create(&self, lead: &NewLead) -> Result<LeadId, RepositoryError> {
        let id = LeadId(self.ids.next());
        let mut leads = self.leads.write().map_err(poisoned)?;
        leads.insert(
            id,
            Lead {
                id,
                title: lead.title.clone(),
                description: lead.description.clone(),
                owner_id: lead.owner_id,
                status: LeadStatus::New,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: LeadId) -> Result<Option<Lead>, RepositoryError> {
        let leads = self.leads.read().map_err(poisoned)?;
        Ok(leads.get(&id).cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryDealRepository {
    deals: Arc<RwLock<BTreeMap<DealId, Deal>>>,
    ids: Sequence,
}

impl InMemoryDealRepository {
    pub fn new() -> Self {
        Self {
            deals: Arc::new(RwLock::new(BTreeMap::new())),
            ids: Sequence::new(),
        }
    }

    fn allocate_id(&self) -> DealId {
        DealId(self.ids.next())
    }

    fn insert(&self, deal: Deal) -> Result<(), RepositoryError> {
        let mut deals = self.deals.write().map_err(poisoned)?;
        deals.insert(deal.id, deal);
        Ok(())
    }

    /// Number of stored deals
    pub fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.deals.read().map_err(poisoned)?.len())
    }
}

impl Default for InMemoryDealRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn deal_from_new(id: DealId, deal: &NewDeal) -> Deal {
    Deal {
        id,
        lead_id: deal.lead_id,
        amount_minor: deal.amount_minor,
        currency: deal.currency.clone(),
        status: deal.status.clone(),
        created_at: deal.created_at,
    }
}

#[async_trait]
impl DealRepository for InMemoryDealRepository {
    async fn create(&self, deal: &NewDeal) -> Result<DealId, RepositoryError> {
        let id = self.allocate_id();
        self.insert(deal_from_new(id, deal))?;
        Ok(id)
    }

    async fn find_by_id(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        let deals = self.deals.read().map_err(poisoned)?;
        Ok(deals.get(&id).cloned())
    }

    async fn find_latest_by_lead(&self, lead_id: LeadId) -> Result<Option<Deal>, RepositoryError> {
        let deals = self.deals.read().map_err(poisoned)?;
        Ok(deals
            .values()
            .filter(|d| d.lead_id == lead_id)
            .max_by_key(|d| (d.created_at, d.id))
            .cloned())
    }
}

#[derive(Clone)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<BTreeMap<DocumentId, Document>>>,
    ids: Sequence,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(BTreeMap::new())),
            ids: Sequence::new(),
        }
    }

    fn allocate_id(&self) -> DocumentId {
        DocumentId(self.ids.next())
    }

    fn insert(&self, document: Document) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents.insert(document.id, document);
        Ok(())
    }

    /// Number of stored documents
    pub fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.documents.read().map_err(poisoned)?.len())
    }
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn create(&self, document: &NewDocument) -> Result<DocumentId, RepositoryError> {
        let id = self.allocate_id();
        self.insert(document.clone().into_document(id, Utc::now()))?;
        Ok(id)
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        signed_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        let document = documents
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id)))?;
        document.status = status;
        document.signed_at = signed_at;
        Ok(())
    }

    async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().map_err(poisoned)?;
        documents
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("document {}", id)))
    }

    async fn list_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents
            .values()
            .filter(|d| d.deal_id == deal_id)
            .cloned()
            .collect())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.documents.read().map_err(poisoned)?;
        Ok(documents
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[derive(Clone)]
pub struct InMemorySmsConfirmationRepository {
    confirmations: Arc<RwLock<BTreeMap<ConfirmationId, SmsConfirmation>>>,
    ids: Sequence,
}

impl InMemorySmsConfirmationRepository {
    pub fn new() -> Self {
        Self {
            confirmations: Arc::new(RwLock::new(BTreeMap::new())),
            ids: Sequence::new(),
        }
    }

    /// All records of a document, oldest first
    pub fn records_for(&self, document_id: DocumentId) -> Result<Vec<SmsConfirmation>, RepositoryError> {
        let confirmations = self.confirmations.read().map_err(poisoned)?;
        Ok(confirmations
            .values()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect())
    }
}

impl Default for InMemorySmsConfirmationRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsConfirmationRepository for InMemorySmsConfirmationRepository {
    async fn create(&self, confirmation: &NewSmsConfirmation) -> Result<ConfirmationId, RepositoryError> {
        let id = ConfirmationId(self.ids.next());
        let mut confirmations = self.confirmations.write().map_err(poisoned)?;
        confirmations.insert(id, confirmation.clone().into_confirmation(id));
        Ok(id)
    }

    async fn find_by_document_and_code(
        &self,
        document_id: DocumentId,
        code: &str,
    ) -> Result<Option<SmsConfirmation>, RepositoryError> {
        let confirmations = self.confirmations.read().map_err(poisoned)?;
        Ok(confirmations
            .values()
            .rev()
            .find(|c| c.document_id == document_id && c.code == code)
            .cloned())
    }

    async fn find_latest_by_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<SmsConfirmation>, RepositoryError> {
        let confirmations = self.confirmations.read().map_err(poisoned)?;
        Ok(confirmations
            .values()
            .filter(|c| c.document_id == document_id)
            .max_by_key(|c| (c.sent_at, c.id))
            .cloned())
    }

    async fn update(&self, confirmation: &SmsConfirmation) -> Result<(), RepositoryError> {
        let mut confirmations = self.confirmations.write().map_err(poisoned)?;
        let stored = confirmations
            .get(&confirmation.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("sms confirmation {}", confirmation.id)))?;
        if stored.version != confirmation.version {
            return Err(RepositoryError::Conflict(format!(
                "sms confirmation {} changed concurrently",
                confirmation.id
            )));
        }
        let key = (stored.sent_at, stored.id);
        let superseded = confirmations
            .values()
            .any(|c| c.document_id == stored.document_id && (c.sent_at, c.id) > key);
        if superseded {
            return Err(RepositoryError::Conflict(format!(
                "sms confirmation {} was superseded",
                confirmation.id
            )));
        }
        let stored = confirmations
            .get_mut(&confirmation.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("sms confirmation {}", confirmation.id)))?;
        *stored = SmsConfirmation {
            version: confirmation.version + 1,
            ..confirmation.clone()
        };
        Ok(())
    }

    async fn delete_by_document(&self, document_id: DocumentId) -> Result<u64, RepositoryError> {
        let mut confirmations = self.confirmations.write().map_err(poisoned)?;
        let before = confirmations.len();
        confirmations.retain(|_, c| c.document_id != document_id);
        Ok((before - confirmations.len()) as u64)
    }
}

/// Unit of work over the in-memory deal and document stores. Writes are
/// buffered in the transaction and become visible on commit.
#[derive(Clone)]
pub struct InMemoryUnitOfWork {
    deals: InMemoryDealRepository,
    documents: InMemoryDocumentRepository,
}

impl InMemoryUnitOfWork {
    pub fn new(deals: InMemoryDealRepository, documents: InMemoryDocumentRepository) -> Self {
        Self { deals, documents }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn DocumentTransaction>, RepositoryError> {
        Ok(Box::new(InMemoryDocumentTransaction {
            deals: self.deals.clone(),
            documents: self.documents.clone(),
            pending_deals: Vec::new(),
            pending_documents: Vec::new(),
        }))
    }
}

struct InMemoryDocumentTransaction {
    deals: InMemoryDealRepository,
    documents: InMemoryDocumentRepository,
    pending_deals: Vec<Deal>,
    pending_documents: Vec<Document>,
}

#[async_trait]
impl DocumentTransaction for InMemoryDocumentTransaction {
    async fn create_deal(&mut self, deal: &NewDeal) -> Result<DealId, RepositoryError> {
        let id = self.deals.allocate_id();
        self.pending_deals.push(deal_from_new(id, deal));
        Ok(id)
    }

    async fn create_document(&mut self, document: &NewDocument) -> Result<DocumentId, RepositoryError> {
        let id = self.documents.allocate_id();
        self.pending_documents
            .push(document.clone().into_document(id, Utc::now()));
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let this = *self;
        for deal in this.pending_deals {
            this.deals.insert(deal)?;
        }
        for document in this.pending_documents {
            this.documents.insert(document)?;
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}
