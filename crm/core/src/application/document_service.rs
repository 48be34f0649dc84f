// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Document Workflow Application Service
//!
//! Creates documents (directly or rendered from a lead), tracks verification
//! and signing, and owns the backing files under the document root.
//!
//! Creation from a lead runs deal creation, rendering and the document insert
//! in one unit of work: when rendering or the insert fails, the new deal is
//! rolled back and any partial file is removed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::error::ServiceError;
use crate::application::repository_factory::Repositories;
use crate::application::sms_confirmation_service::{CodeCheck, SmsConfirmationService};
use crate::domain::deal::{Deal, DealId, NewDeal};
use crate::domain::document::{Document, DocumentId, DocumentStatus, DocumentType, NewDocument};
use crate::domain::events::DocumentEvent;
use crate::domain::lead::{Lead, LeadId};
use crate::domain::pdf::{DocumentRenderData, PdfRenderer};
use crate::domain::repository::{
    DealRepository, DocumentRepository, DocumentTransaction, LeadRepository, RepositoryError, UnitOfWork,
};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::metrics;

const MAX_TITLE_CHARS: usize = 80;

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait DocumentWorkflowService: Send + Sync {
    /// Render a contract or invoice for the lead's latest deal, opening a deal
    /// when the lead has none
    async fn create_document_from_lead(
        &self,
        lead_id: LeadId,
        doc_type: DocumentType,
    ) -> Result<Document, ServiceError>;

    /// Register a document whose file is produced elsewhere
    async fn create_document(&self, document: NewDocument) -> Result<DocumentId, ServiceError>;

    async fn get_document(&self, id: DocumentId) -> Result<Document, ServiceError>;

    async fn list_documents(&self, limit: i64, offset: i64) -> Result<Vec<Document>, ServiceError>;

    async fn verify_document(&self, id: DocumentId) -> Result<Document, ServiceError>;

    /// Redeem an SMS code and mark the document signed
    async fn confirm_document(&self, id: DocumentId, code: &str) -> Result<Document, ServiceError>;

    /// Remove the backing file, then the row
    async fn delete_document(&self, id: DocumentId) -> Result<(), ServiceError>;

    async fn list_documents_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, ServiceError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardDocumentService {
    leads: Arc<dyn LeadRepository>,
    deals: Arc<dyn DealRepository>,
    documents: Arc<dyn DocumentRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    renderer: Arc<dyn PdfRenderer>,
    confirmations: Arc<dyn SmsConfirmationService>,
    event_bus: Arc<EventBus>,
    document_root: PathBuf,
}

impl StandardDocumentService {
    pub fn new(
        repositories: &Repositories,
        renderer: Arc<dyn PdfRenderer>,
        confirmations: Arc<dyn SmsConfirmationService>,
        event_bus: Arc<EventBus>,
        document_root: PathBuf,
    ) -> Self {
        Self {
            leads: repositories.leads.clone(),
            deals: repositories.deals.clone(),
            documents: repositories.documents.clone(),
            unit_of_work: repositories.unit_of_work.clone(),
            renderer,
            confirmations,
            event_bus,
            document_root,
        }
    }

    /// Stored paths are relative to the document root. Anything that could
    /// land outside it (absolute, rooted, prefixed or `..`) resolves to `None`.
    fn resolve_path(&self, file_path: &str) -> Option<PathBuf> {
        if stays_under_root(file_path) {
            Some(self.document_root.join(file_path))
        } else {
            None
        }
    }

    async fn find_document(&self, id: DocumentId) -> Result<Document, ServiceError> {
        self.documents
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("document {}", id)))
    }

    async fn set_status(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        signed_at: Option<DateTime<Utc>>,
    ) -> Result<(), ServiceError> {
        self.documents
            .update_status(id, status, signed_at)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => ServiceError::NotFound(format!("document {}", id)),
                other => ServiceError::Persist(other),
            })
    }

    /// Latest deal of the lead, or a new one written through `tx`
    async fn deal_for_lead(
        &self,
        lead: &Lead,
        tx: &mut Box<dyn DocumentTransaction>,
        now: DateTime<Utc>,
    ) -> Result<(Deal, bool), ServiceError> {
        if let Some(deal) = self.deals.find_latest_by_lead(lead.id).await? {
            debug!(lead_id = %lead.id, deal_id = %deal.id, "Reusing latest deal");
            return Ok((deal, false));
        }

        let new_deal = NewDeal::opened_for(lead.id, now);
        let id = tx.create_deal(&new_deal).await?;
        let deal = Deal {
            id,
            lead_id: new_deal.lead_id,
            amount_minor: new_deal.amount_minor,
            currency: new_deal.currency,
            status: new_deal.status,
            created_at: new_deal.created_at,
        };
        Ok((deal, true))
    }

    async fn render(&self, doc_type: &DocumentType, data: &DocumentRenderData) -> Result<PathBuf, ServiceError> {
        let rendered = match doc_type {
            DocumentType::Contract => self.renderer.render_contract(data).await?,
            DocumentType::Invoice => self.renderer.render_invoice(data).await?,
            DocumentType::Other(other) => return Err(ServiceError::UnsupportedType(other.clone())),
        };
        Ok(rendered)
    }

    /// Render and insert; the caller commits or rolls back
    async fn render_and_insert(
        &self,
        lead: Lead,
        doc_type: &DocumentType,
        tx: &mut Box<dyn DocumentTransaction>,
        now: DateTime<Utc>,
    ) -> Result<(Document, bool, PathBuf), (ServiceError, Option<PathBuf>)> {
        let (deal, opened) = self.deal_for_lead(&lead, tx, now).await.map_err(|e| (e, None))?;

        let deal_dir = format!("deal_{}", deal.id);
        let abs_dir = self.document_root.join(&deal_dir);
        tokio::fs::create_dir_all(&abs_dir)
            .await
            .map_err(|e| (ServiceError::Io(e), None))?;

        let file_name = unique_file_name(&abs_dir, &document_file_stem(&lead, doc_type, now))
            .await
            .map_err(|e| (ServiceError::Io(e), None))?;
        let abs_path = abs_dir.join(&file_name);
        let relative_path = format!("{}/{}", deal_dir, file_name);

        let data = DocumentRenderData {
            lead,
            deal,
            generated_at: now,
            output_path: abs_path.clone(),
        };
        self.render(doc_type, &data)
            .await
            .map_err(|e| (e, Some(abs_path.clone())))?;

        let new_document = NewDocument::new(data.deal.id, doc_type.clone(), relative_path);
        let id = tx
            .create_document(&new_document)
            .await
            .map_err(|e| (ServiceError::Persist(e), Some(abs_path.clone())))?;

        Ok((new_document.into_document(id, now), opened, abs_path))
    }
}

/// `<title>_<type>_<YYYYmmdd_HHMMSS>` with the title reduced to a safe file name
fn document_file_stem(lead: &Lead, doc_type: &DocumentType, now: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        sanitize_title(&lead.title, lead.id),
        doc_type,
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Keeps letters and digits (any script), maps everything else to `_`
fn sanitize_title(title: &str, lead_id: LeadId) -> String {
    let mut out = String::new();
    for c in title.chars().take(MAX_TITLE_CHARS) {
        if c.is_alphanumeric() || c == '-' {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        format!("lead_{}", lead_id)
    } else {
        trimmed.to_string()
    }
}

/// Two documents of the same type rendered within a second get `_2`, `_3`, ...
async fn unique_file_name(dir: &Path, stem: &str) -> std::io::Result<String> {
    let mut name = format!("{}.pdf", stem);
    let mut n = 1;
    while tokio::fs::try_exists(dir.join(&name)).await? {
        n += 1;
        name = format!("{}_{}.pdf", stem, n);
    }
    Ok(name)
}

async fn remove_file_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn has_parent_component(path: &str) -> bool {
    Path::new(path).components().any(|c| matches!(c, Component::ParentDir))
}

/// Only plain names and `.` are allowed, so joining onto a root cannot leave it
fn stays_under_root(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[async_trait]
impl DocumentWorkflowService for StandardDocumentService {
    async fn create_document_from_lead(
        &self,
        lead_id: LeadId,
        doc_type: DocumentType,
    ) -> Result<Document, ServiceError> {
        if !doc_type.is_renderable() {
            return Err(ServiceError::UnsupportedType(doc_type.to_string()));
        }

        let lead = self
            .leads
            .find_by_id(lead_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("lead {}", lead_id)))?;

        let now = Utc::now();
        let mut tx = self.unit_of_work.begin().await?;

        let (document, opened_deal, abs_path) = match self.render_and_insert(lead, &doc_type, &mut tx, now).await {
            Ok(created) => created,
            Err((err, partial_file)) => {
                if let Err(e) = tx.rollback().await {
                    warn!(lead_id = %lead_id, "Rollback after failed document creation failed: {}", e);
                }
                if let Some(path) = partial_file {
                    if let Err(e) = remove_file_if_present(&path).await {
                        warn!(path = ?path, "Failed to remove partial document file: {}", e);
                    }
                }
                error!(lead_id = %lead_id, doc_type = %doc_type, "Document creation failed: {}", err);
                return Err(err);
            }
        };

        if let Err(e) = tx.commit().await {
            error!(lead_id = %lead_id, "Commit of document creation failed: {}", e);
            if let Err(io) = remove_file_if_present(&abs_path).await {
                warn!(path = ?abs_path, "Failed to remove orphaned document file: {}", io);
            }
            return Err(ServiceError::Persist(e));
        }

        if opened_deal {
            info!(lead_id = %lead_id, deal_id = %document.deal_id, "Opened deal for lead");
            self.event_bus.publish_document_event(DocumentEvent::DealOpened {
                deal_id: document.deal_id,
                lead_id,
                opened_at: now,
            });
        }

        metrics::record_document_created(document.doc_type.as_str());
        info!(
            document_id = %document.id,
            deal_id = %document.deal_id,
            doc_type = %document.doc_type,
            "Document created from lead {}", lead_id
        );
        self.event_bus.publish_document_event(DocumentEvent::DocumentCreated {
            document_id: document.id,
            deal_id: document.deal_id,
            doc_type: document.doc_type.clone(),
            file_path: document.file_path.clone(),
            created_at: now,
        });

        Ok(document)
    }

    async fn create_document(&self, document: NewDocument) -> Result<DocumentId, ServiceError> {
        let file_path = document.file_path.trim();
        if file_path.is_empty() {
            return Err(ServiceError::InvalidInput("file_path must not be empty".to_string()));
        }
        if has_parent_component(file_path) {
            return Err(ServiceError::InvalidInput("file_path must not contain '..'".to_string()));
        }
        let abs_path = self.resolve_path(file_path).ok_or_else(|| {
            ServiceError::InvalidInput("file_path must be relative to the document root".to_string())
        })?;
        if let Some(dir) = abs_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // Signing only happens through confirm_document
        let document = NewDocument {
            file_path: file_path.to_string(),
            status: DocumentStatus::New,
            signed_at: None,
            ..document
        };
        let id = self.documents.create(&document).await?;

        metrics::record_document_created(document.doc_type.as_str());
        info!(document_id = %id, deal_id = %document.deal_id, doc_type = %document.doc_type, "Document registered");
        self.event_bus.publish_document_event(DocumentEvent::DocumentCreated {
            document_id: id,
            deal_id: document.deal_id,
            doc_type: document.doc_type,
            file_path: document.file_path,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, ServiceError> {
        self.find_document(id).await
    }

    async fn list_documents(&self, limit: i64, offset: i64) -> Result<Vec<Document>, ServiceError> {
        if limit < 0 || offset < 0 {
            return Err(ServiceError::InvalidInput("limit and offset must not be negative".to_string()));
        }
        Ok(self.documents.list(limit, offset).await?)
    }

    async fn verify_document(&self, id: DocumentId) -> Result<Document, ServiceError> {
        let mut document = self.find_document(id).await?;
        self.set_status(id, DocumentStatus::Verified, document.signed_at).await?;
        document.mark_verified();

        info!(document_id = %id, "Document verified");
        self.event_bus.publish_document_event(DocumentEvent::DocumentVerified {
            document_id: id,
            verified_at: Utc::now(),
        });
        Ok(document)
    }

    async fn confirm_document(&self, id: DocumentId, code: &str) -> Result<Document, ServiceError> {
        let mut document = self.find_document(id).await?;

        if let CodeCheck::Rejected(reason) = self.confirmations.check_code(id, code).await? {
            info!(document_id = %id, reason = reason.as_str(), "Document signing refused");
            return Err(ServiceError::ConfirmationFailed(reason));
        }

        // The code is spent at this point; a failed write leaves it used and the document unsigned
        let signed_at = Utc::now();
        if let Err(e) = self.set_status(id, DocumentStatus::Signed, Some(signed_at)).await {
            error!(
                document_id = %id,
                "Confirmation code consumed but document was not marked signed: {}", e
            );
            return Err(e);
        }
        document.mark_signed(signed_at);

        info!(document_id = %id, "Document signed");
        self.event_bus.publish_document_event(DocumentEvent::DocumentSigned {
            document_id: id,
            signed_at,
        });
        Ok(document)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<(), ServiceError> {
        let document = self.find_document(id).await?;

        if !document.file_path.is_empty() {
            match self.resolve_path(&document.file_path) {
                Some(path) => remove_file_if_present(&path).await.map_err(|e| {
                    error!(document_id = %id, path = ?path, "Failed to remove document file: {}", e);
                    ServiceError::Io(e)
                })?,
                None => warn!(
                    document_id = %id,
                    file_path = %document.file_path,
                    "Stored path is outside the document root, leaving the file in place"
                ),
            }
        }

        self.documents.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound(_) => ServiceError::NotFound(format!("document {}", id)),
            other => ServiceError::Persist(other),
        })?;

        info!(document_id = %id, "Document deleted");
        self.event_bus.publish_document_event(DocumentEvent::DocumentDeleted {
            document_id: id,
            deleted_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_documents_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, ServiceError> {
        Ok(self.documents.list_by_deal(deal_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sms_confirmation_service::StandardSmsConfirmationService;
    use crate::domain::lead::{LeadStatus, NewLead};
    use crate::domain::pdf::RenderError;
    use crate::domain::sms::{SmsDelivery, SmsGateway, SmsGatewayError};
    use crate::infrastructure::repositories::{
        InMemoryDealRepository, InMemoryDocumentRepository, InMemoryLeadRepository,
        InMemorySmsConfirmationRepository, InMemoryUnitOfWork,
    };
    use std::sync::Mutex;

    // Mock renderer writing a stub file, optionally failing after a partial write
    #[derive(Default)]
    struct StubRenderer {
        fail: bool,
        rendered: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl PdfRenderer for StubRenderer {
        async fn render_contract(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError> {
            self.write(data)
        }

        async fn render_invoice(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError> {
            self.write(data)
        }
    }

    impl StubRenderer {
        fn failing() -> Self {
            Self {
                fail: true,
                rendered: Mutex::new(Vec::new()),
            }
        }

        fn write(&self, data: &DocumentRenderData) -> Result<PathBuf, RenderError> {
            std::fs::write(&data.output_path, b"%PDF-1.3 stub")?;
            if self.fail {
                return Err(RenderError::Generation("font table missing".to_string()));
            }
            self.rendered.lock().unwrap().push(data.output_path.clone());
            Ok(data.output_path.clone())
        }
    }

    struct SilentGateway;

    #[async_trait]
    impl SmsGateway for SilentGateway {
        async fn send(&self, _: &str, _: &str) -> Result<SmsDelivery, SmsGatewayError> {
            Ok(SmsDelivery {
                message_id: "1".to_string(),
            })
        }

        fn provider(&self) -> &'static str {
            "silent"
        }
    }

    struct Fixture {
        _root: tempfile::TempDir,
        root: PathBuf,
        leads: InMemoryLeadRepository,
        deals: InMemoryDealRepository,
        documents: InMemoryDocumentRepository,
        sms: Arc<StandardSmsConfirmationService>,
        service: StandardDocumentService,
    }

    fn fixture_with(renderer: StubRenderer) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let leads = InMemoryLeadRepository::new();
        let deals = InMemoryDealRepository::new();
        let documents = InMemoryDocumentRepository::new();
        let confirmations = InMemorySmsConfirmationRepository::new();
        let repositories = Repositories {
            leads: Arc::new(leads.clone()),
            deals: Arc::new(deals.clone()),
            documents: Arc::new(documents.clone()),
            confirmations: Arc::new(confirmations.clone()),
            unit_of_work: Arc::new(InMemoryUnitOfWork::new(deals.clone(), documents.clone())),
        };
        let event_bus = Arc::new(EventBus::new(64));
        let sms = Arc::new(StandardSmsConfirmationService::new(
            repositories.confirmations.clone(),
            Arc::new(SilentGateway),
            event_bus.clone(),
            "Confirmation code: {code}".to_string(),
        ));
        let service = StandardDocumentService::new(
            &repositories,
            Arc::new(renderer),
            sms.clone(),
            event_bus,
            root.clone(),
        );
        Fixture {
            _root: tmp,
            root,
            leads,
            deals,
            documents,
            sms,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(StubRenderer::default())
    }

    fn lead(title: &str, id: i64) -> Lead {
        Lead {
            id: LeadId(id),
            title: title.to_string(),
            description: String::new(),
            owner_id: None,
            status: LeadStatus::New,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_from_lead_opens_one_deal_and_reuses_it() {
        let f = fixture();
        let lead_id = f.leads.create(&NewLead::new("Acme Tours")).await.unwrap();

        let first = f
            .service
            .create_document_from_lead(lead_id, DocumentType::Contract)
            .await
            .unwrap();
        assert_eq!(f.deals.count().unwrap(), 1);
        assert_eq!(f.documents.count().unwrap(), 1);
        assert_eq!(first.status, DocumentStatus::New);
        assert!(first.file_path.starts_with(&format!("deal_{}/", first.deal_id)));
        assert!(first.file_path.contains("Acme_Tours_contract_"));
        assert!(first.file_path.ends_with(".pdf"));
        assert!(f.root.join(&first.file_path).exists());

        let second = f
            .service
            .create_document_from_lead(lead_id, DocumentType::Invoice)
            .await
            .unwrap();
        assert_eq!(f.deals.count().unwrap(), 1);
        assert_eq!(second.deal_id, first.deal_id);

        let by_deal = f.service.list_documents_by_deal(first.deal_id).await.unwrap();
        assert_eq!(by_deal.len(), 2);
    }

    #[tokio::test]
    async fn test_create_from_missing_lead_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .create_document_from_lead(LeadId(404), DocumentType::Contract)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(f.deals.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_writes_nothing() {
        let f = fixture();
        let lead_id = f.leads.create(&NewLead::new("Acme")).await.unwrap();
        let err = f
            .service
            .create_document_from_lead(lead_id, DocumentType::from("passport"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedType(t) if t == "passport"));
        assert_eq!(f.deals.count().unwrap(), 0);
        assert_eq!(f.documents.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_render_failure_rolls_back_deal_and_removes_file() {
        let f = fixture_with(StubRenderer::failing());
        let lead_id = f.leads.create(&NewLead::new("Acme")).await.unwrap();

        let err = f
            .service
            .create_document_from_lead(lead_id, DocumentType::Contract)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Render(_)));
        assert_eq!(f.deals.count().unwrap(), 0);
        assert_eq!(f.documents.count().unwrap(), 0);

        let deal_dir = std::fs::read_dir(&f.root).unwrap().next().unwrap().unwrap().path();
        assert_eq!(std::fs::read_dir(deal_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_same_second_renders_get_distinct_files() {
        let f = fixture();
        let lead_id = f.leads.create(&NewLead::new("Acme")).await.unwrap();
        let mut paths = std::collections::HashSet::new();
        for _ in 0..3 {
            let doc = f
                .service
                .create_document_from_lead(lead_id, DocumentType::Contract)
                .await
                .unwrap();
            paths.insert(doc.file_path);
        }
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Acme Tours", LeadId(1)), "Acme_Tours");
        assert_eq!(sanitize_title("../../etc/passwd", LeadId(1)), "etc_passwd");
        assert_eq!(sanitize_title("Тур в Анталью", LeadId(1)), "Тур_в_Анталью");
        assert_eq!(sanitize_title("///", LeadId(9)), "lead_9");
    }

    #[test]
    fn test_file_stem_format() {
        let now = DateTime::parse_from_rfc3339("2025-03-04T05:06:07Z")
            .unwrap()
            .with_timezone(&Utc);
        let stem = document_file_stem(&lead("Acme", 1), &DocumentType::Invoice, now);
        assert_eq!(stem, "Acme_invoice_20250304_050607");
    }

    #[tokio::test]
    async fn test_create_document_validates_path_and_creates_directory() {
        let f = fixture();
        let err = f
            .service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = f
            .service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "../outside.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let id = f
            .service
            .create_document(NewDocument::new(DealId(1), "passport".into(), "deal_1/scans/passport.pdf"))
            .await
            .unwrap();
        assert!(f.root.join("deal_1/scans").is_dir());
        let stored = f.service.get_document(id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::New);
        assert_eq!(stored.doc_type, DocumentType::Other("passport".to_string()));
    }

    #[tokio::test]
    async fn test_create_document_ignores_requested_signed_status() {
        let f = fixture();
        let mut document = NewDocument::new(DealId(1), DocumentType::Contract, "deal_1/presigned.pdf");
        document.status = DocumentStatus::Signed;
        document.signed_at = Some(Utc::now());

        let id = f.service.create_document(document).await.unwrap();
        let stored = f.service.get_document(id).await.unwrap();
        assert_eq!(stored.status, DocumentStatus::New);
        assert!(stored.signed_at.is_none());
    }

    #[tokio::test]
    async fn test_create_document_rejects_paths_outside_root() {
        let f = fixture();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("victim.txt");

        let err = f
            .service
            .create_document(NewDocument::new(
                DealId(1),
                DocumentType::Contract,
                target.to_string_lossy().to_string(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(ref m) if m.contains("relative")));
        assert_eq!(f.documents.count().unwrap(), 0);

        assert!(stays_under_root("deal_1/./a.pdf"));
        assert!(!stays_under_root("/etc/passwd"));
        assert!(!stays_under_root("deal_1/../../a.pdf"));
    }

    #[tokio::test]
    async fn test_delete_leaves_files_outside_root_alone() {
        let f = fixture();
        let outside = tempfile::tempdir().unwrap();
        let victim = outside.path().join("victim.txt");
        std::fs::write(&victim, b"keep me").unwrap();

        // A row written before paths were validated
        let id = f
            .documents
            .create(&NewDocument::new(
                DealId(1),
                DocumentType::Contract,
                victim.to_string_lossy().to_string(),
            ))
            .await
            .unwrap();

        f.service.delete_document(id).await.unwrap();
        assert!(victim.exists());
        assert_eq!(f.documents.count().unwrap(), 0);
    }

    // Document store whose status writes always fail
    struct ReadOnlyDocuments(InMemoryDocumentRepository);

    #[async_trait]
    impl DocumentRepository for ReadOnlyDocuments {
        async fn create(&self, document: &NewDocument) -> Result<DocumentId, RepositoryError> {
            self.0.create(document).await
        }

        async fn find_by_id(&self, id: DocumentId) -> Result<Option<Document>, RepositoryError> {
            self.0.find_by_id(id).await
        }

        async fn update_status(
            &self,
            _: DocumentId,
            _: DocumentStatus,
            _: Option<DateTime<Utc>>,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }

        async fn delete(&self, id: DocumentId) -> Result<(), RepositoryError> {
            self.0.delete(id).await
        }

        async fn list_by_deal(&self, deal_id: DealId) -> Result<Vec<Document>, RepositoryError> {
            self.0.list_by_deal(deal_id).await
        }

        async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Document>, RepositoryError> {
            self.0.list(limit, offset).await
        }
    }

    #[tokio::test]
    async fn test_failed_status_write_surfaces_and_leaves_document_unsigned() {
        let tmp = tempfile::tempdir().unwrap();
        let deals = InMemoryDealRepository::new();
        let documents = InMemoryDocumentRepository::new();
        let repositories = Repositories {
            leads: Arc::new(InMemoryLeadRepository::new()),
            deals: Arc::new(deals.clone()),
            documents: Arc::new(ReadOnlyDocuments(documents.clone())),
            confirmations: Arc::new(InMemorySmsConfirmationRepository::new()),
            unit_of_work: Arc::new(InMemoryUnitOfWork::new(deals, documents.clone())),
        };
        let event_bus = Arc::new(EventBus::new(16));
        let sms = Arc::new(StandardSmsConfirmationService::new(
            repositories.confirmations.clone(),
            Arc::new(SilentGateway),
            event_bus.clone(),
            "Confirmation code: {code}".to_string(),
        ));
        let service = StandardDocumentService::new(
            &repositories,
            Arc::new(StubRenderer::default()),
            sms.clone(),
            event_bus,
            tmp.path().to_path_buf(),
        );

        let id = service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "deal_1/a.pdf"))
            .await
            .unwrap();
        let record = sms.send_sms(id, "+77001234567").await.unwrap();

        let err = service.confirm_document(id, &record.code).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persist(RepositoryError::Database(_))));
        assert_eq!(service.get_document(id).await.unwrap().status, DocumentStatus::New);
        assert!(sms.get_latest_by_document_id(id).await.unwrap().unwrap().confirmed);
    }

    #[tokio::test]
    async fn test_verify_document() {
        let f = fixture();
        let id = f
            .service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "deal_1/a.pdf"))
            .await
            .unwrap();

        let verified = f.service.verify_document(id).await.unwrap();
        assert_eq!(verified.status, DocumentStatus::Verified);
        assert_eq!(f.service.get_document(id).await.unwrap().status, DocumentStatus::Verified);

        let err = f.service.verify_document(DocumentId(999)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_confirm_document_signs_with_valid_code_only() {
        let f = fixture();
        let id = f
            .service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "deal_1/a.pdf"))
            .await
            .unwrap();

        let err = f.service.confirm_document(id, "000000").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ConfirmationFailed(crate::application::error::ConfirmationFailure::NoRecord)
        ));

        let record = f.sms.send_sms(id, "+77001234567").await.unwrap();
        let signed = f.service.confirm_document(id, &record.code).await.unwrap();
        assert_eq!(signed.status, DocumentStatus::Signed);
        assert!(signed.signed_at.is_some());

        let stored = f.service.get_document(id).await.unwrap();
        assert!(stored.is_signed());

        let err = f.service.confirm_document(id, &record.code).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ConfirmationFailed(crate::application::error::ConfirmationFailure::AlreadyConfirmed)
        ));
    }

    #[tokio::test]
    async fn test_confirm_missing_document_is_not_found() {
        let f = fixture();
        let err = f.service.confirm_document(DocumentId(5), "123456").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_document_removes_file_and_row() {
        let f = fixture();
        let lead_id = f.leads.create(&NewLead::new("Acme")).await.unwrap();
        let doc = f
            .service
            .create_document_from_lead(lead_id, DocumentType::Invoice)
            .await
            .unwrap();
        let abs = f.root.join(&doc.file_path);
        assert!(abs.exists());

        f.service.delete_document(doc.id).await.unwrap();
        assert!(!abs.exists());
        assert!(matches!(
            f.service.get_document(doc.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete_document(doc.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_document_tolerates_missing_file() {
        let f = fixture();
        let id = f
            .service
            .create_document(NewDocument::new(DealId(1), DocumentType::Contract, "deal_1/never_written.pdf"))
            .await
            .unwrap();
        f.service.delete_document(id).await.unwrap();
        assert_eq!(f.documents.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_documents_rejects_negative_paging() {
        let f = fixture();
        assert!(matches!(
            f.service.list_documents(-1, 0).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(f.service.list_documents(10, 0).await.unwrap().is_empty());
    }
}
