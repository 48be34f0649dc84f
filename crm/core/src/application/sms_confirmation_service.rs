// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SMS Confirmation Application Service
//!
//! Issues, redelivers and redeems the 6-digit codes that authorise signing a
//! document. Coordinates:
//! - Domain layer: `SmsConfirmation` records and the expiry window
//! - Infrastructure layer: `SmsConfirmationRepository`, `SmsGateway`
//! - Event bus: `ConfirmationEvent`s for observers
//!
//! Only the latest record of a document can be redeemed. Redemption is an
//! optimistic update that the store refuses when the record's version moved
//! or a newer record of the document exists, so a code racing a resend or a
//! second redemption succeeds at most once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::application::error::{ConfirmationFailure, ServiceError};
use crate::domain::document::DocumentId;
use crate::domain::events::ConfirmationEvent;
use crate::domain::repository::{RepositoryError, SmsConfirmationRepository};
use crate::domain::sms::SmsGateway;
use crate::domain::sms_confirmation::{
    generate_confirmation_code, is_expired_at, is_well_formed_code, NewSmsConfirmation, SmsConfirmation,
};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::metrics;

/// Outcome of redeeming a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCheck {
    Confirmed,
    Rejected(ConfirmationFailure),
}

impl CodeCheck {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, CodeCheck::Confirmed)
    }

    fn metric_label(&self) -> &'static str {
        match self {
            CodeCheck::Confirmed => "confirmed",
            CodeCheck::Rejected(reason) => reason.as_str(),
        }
    }
}

/// What a resend did
#[derive(Debug, Clone)]
pub enum ResendOutcome {
    /// A new code was generated and stored
    Issued(SmsConfirmation),
    /// The pending code was delivered again, nothing was stored
    Redelivered(SmsConfirmation),
}

impl ResendOutcome {
    pub fn confirmation(&self) -> &SmsConfirmation {
        match self {
            ResendOutcome::Issued(c) | ResendOutcome::Redelivered(c) => c,
        }
    }
}

// ============================================================================
// Service Trait
// ============================================================================

#[async_trait]
pub trait SmsConfirmationService: Send + Sync {
    /// Generate a fresh code, deliver it and store the pending record
    async fn send_sms(&self, document_id: DocumentId, phone: &str) -> Result<SmsConfirmation, ServiceError>;

    /// Issue or redeliver depending on the state of the latest record
    async fn resend_sms(
        &self,
        document_id: DocumentId,
        phone: Option<&str>,
    ) -> Result<ResendOutcome, ServiceError>;

    /// Redeem `code` for the document, reporting why it was refused
    async fn check_code(&self, document_id: DocumentId, code: &str) -> Result<CodeCheck, ServiceError>;

    /// `Ok(true)` exactly once per issued code, `Ok(false)` for every refusal
    async fn confirm_code(&self, document_id: DocumentId, code: &str) -> Result<bool, ServiceError> {
        Ok(self.check_code(document_id, code).await?.is_confirmed())
    }

    /// Expiry against the current wall clock
    fn is_code_expired(&self, sent_at: DateTime<Utc>) -> bool {
        is_expired_at(sent_at, Utc::now())
    }

    /// Remove every record of the document, returns how many were removed
    async fn delete_confirmation(&self, document_id: DocumentId) -> Result<u64, ServiceError>;

    async fn get_latest_by_document_id(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<SmsConfirmation>, ServiceError>;
}

// ============================================================================
// Standard Implementation
// ============================================================================

pub struct StandardSmsConfirmationService {
    repository: Arc<dyn SmsConfirmationRepository>,
    gateway: Arc<dyn SmsGateway>,
    event_bus: Arc<EventBus>,
    message_template: String,
}

impl StandardSmsConfirmationService {
    /// `message_template` must contain `{code}`
    pub fn new(
        repository: Arc<dyn SmsConfirmationRepository>,
        gateway: Arc<dyn SmsGateway>,
        event_bus: Arc<EventBus>,
        message_template: String,
    ) -> Self {
        Self {
            repository,
            gateway,
            event_bus,
            message_template,
        }
    }

    fn message_text(&self, code: &str) -> String {
        self.message_template.replace("{code}", code)
    }

    async fn deliver(&self, phone: &str, code: &str) -> Result<String, ServiceError> {
        let delivery = self
            .gateway
            .send(phone, &self.message_text(code))
            .await
            .map_err(|e| {
                warn!(provider = self.gateway.provider(), phone = %phone, "SMS delivery failed: {}", e);
                ServiceError::Gateway(e)
            })?;
        Ok(delivery.message_id)
    }

    async fn redeem(&self, record: SmsConfirmation, now: DateTime<Utc>) -> Result<CodeCheck, ServiceError> {
        if record.confirmed {
            return Ok(CodeCheck::Rejected(ConfirmationFailure::AlreadyConfirmed));
        }
        if record.is_expired_at(now) {
            return Ok(CodeCheck::Rejected(ConfirmationFailure::Expired));
        }

        let latest = self.repository.find_latest_by_document(record.document_id).await?;
        if latest.map(|l| l.id) != Some(record.id) {
            return Ok(CodeCheck::Rejected(ConfirmationFailure::Superseded));
        }

        let mut record = record;
        record.confirm(now);
        match self.repository.update(&record).await {
            Ok(()) => {
                info!(document_id = %record.document_id, confirmation_id = %record.id, "Confirmation code redeemed");
                self.event_bus.publish_confirmation_event(ConfirmationEvent::CodeConfirmed {
                    confirmation_id: record.id,
                    document_id: record.document_id,
                    confirmed_at: now,
                });
                Ok(CodeCheck::Confirmed)
            }
            Err(RepositoryError::Conflict(_)) => {
                warn!(document_id = %record.document_id, confirmation_id = %record.id, "Concurrent redemption lost");
                Ok(CodeCheck::Rejected(ConfirmationFailure::Superseded))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl SmsConfirmationService for StandardSmsConfirmationService {
    async fn send_sms(&self, document_id: DocumentId, phone: &str) -> Result<SmsConfirmation, ServiceError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ServiceError::InvalidInput("phone must not be empty".to_string()));
        }

        let code = generate_confirmation_code();
        let message_id = self.deliver(phone, &code).await?;

        let new_record = NewSmsConfirmation {
            document_id,
            phone: phone.to_string(),
            code,
            sent_at: Utc::now(),
        };
        let id = self.repository.create(&new_record).await.map_err(|e| {
            // The recipient holds a code the system cannot validate
            error!(
                document_id = %document_id,
                provider_message_id = %message_id,
                "SMS delivered but confirmation record was not stored: {}", e
            );
            ServiceError::Persist(e)
        })?;

        metrics::record_sms_sent(self.gateway.provider(), "new");
        info!(document_id = %document_id, confirmation_id = %id, provider_message_id = %message_id, "Confirmation code issued");
        self.event_bus.publish_confirmation_event(ConfirmationEvent::CodeIssued {
            confirmation_id: id,
            document_id,
            provider_message_id: message_id,
            issued_at: new_record.sent_at,
        });

        Ok(new_record.into_confirmation(id))
    }

    async fn resend_sms(
        &self,
        document_id: DocumentId,
        phone: Option<&str>,
    ) -> Result<ResendOutcome, ServiceError> {
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());

        let Some(existing) = self.repository.find_latest_by_document(document_id).await? else {
            let phone = phone.ok_or(ServiceError::PhoneRequired)?;
            return Ok(ResendOutcome::Issued(self.send_sms(document_id, phone).await?));
        };

        if !existing.is_pending_at(Utc::now()) {
            debug!(document_id = %document_id, "Previous code is no longer pending, issuing a new one");
            let issued = self.send_sms(document_id, &existing.phone).await?;
            return Ok(ResendOutcome::Issued(issued));
        }

        let message_id = self.deliver(&existing.phone, &existing.code).await?;
        metrics::record_sms_sent(self.gateway.provider(), "redelivery");
        info!(document_id = %document_id, confirmation_id = %existing.id, "Pending confirmation code redelivered");
        self.event_bus.publish_confirmation_event(ConfirmationEvent::CodeRedelivered {
            confirmation_id: existing.id,
            document_id,
            provider_message_id: message_id,
            redelivered_at: Utc::now(),
        });

        Ok(ResendOutcome::Redelivered(existing))
    }

    async fn check_code(&self, document_id: DocumentId, code: &str) -> Result<CodeCheck, ServiceError> {
        let outcome = if !is_well_formed_code(code) {
            CodeCheck::Rejected(ConfirmationFailure::NoRecord)
        } else {
            match self.repository.find_by_document_and_code(document_id, code).await? {
                None => CodeCheck::Rejected(ConfirmationFailure::NoRecord),
                Some(record) => self.redeem(record, Utc::now()).await?,
            }
        };

        if let CodeCheck::Rejected(reason) = &outcome {
            debug!(document_id = %document_id, reason = reason.as_str(), "Confirmation code refused");
        }
        metrics::record_confirmation(outcome.metric_label());
        Ok(outcome)
    }

    async fn delete_confirmation(&self, document_id: DocumentId) -> Result<u64, ServiceError> {
        let removed = self.repository.delete_by_document(document_id).await?;
        info!(document_id = %document_id, removed, "Confirmation records deleted");
        self.event_bus.publish_confirmation_event(ConfirmationEvent::ConfirmationsCleared {
            document_id,
            cleared_at: Utc::now(),
        });
        Ok(removed)
    }

    async fn get_latest_by_document_id(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<SmsConfirmation>, ServiceError> {
        Ok(self.repository.find_latest_by_document(document_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sms::{SmsDelivery, SmsGatewayError};
    use crate::infrastructure::repositories::InMemorySmsConfirmationRepository;
    use chrono::Duration;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    // Mock gateway recording every message
    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl RecordingGateway {
        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn messages(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SmsGateway for RecordingGateway {
        async fn send(&self, phone: &str, text: &str) -> Result<SmsDelivery, SmsGatewayError> {
            if self.fail {
                return Err(SmsGatewayError::Provider {
                    code: 2,
                    message: "balance exhausted".to_string(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((phone.to_string(), text.to_string()));
            Ok(SmsDelivery {
                message_id: format!("msg-{}", sent.len()),
            })
        }

        fn provider(&self) -> &'static str {
            "recording"
        }
    }

    // Store whose writes always fail
    struct BrokenStore;

    #[async_trait]
    impl SmsConfirmationRepository for BrokenStore {
        async fn create(&self, _: &NewSmsConfirmation) -> Result<crate::domain::sms_confirmation::ConfirmationId, RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }
        async fn find_by_document_and_code(&self, _: DocumentId, _: &str) -> Result<Option<SmsConfirmation>, RepositoryError> {
            Ok(None)
        }
        async fn find_latest_by_document(&self, _: DocumentId) -> Result<Option<SmsConfirmation>, RepositoryError> {
            Ok(None)
        }
        async fn update(&self, _: &SmsConfirmation) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("connection reset".to_string()))
        }
        async fn delete_by_document(&self, _: DocumentId) -> Result<u64, RepositoryError> {
            Ok(0)
        }
    }

    struct Fixture {
        repo: InMemorySmsConfirmationRepository,
        gateway: Arc<RecordingGateway>,
        service: StandardSmsConfirmationService,
    }

    fn fixture() -> Fixture {
        let repo = InMemorySmsConfirmationRepository::new();
        let gateway = Arc::new(RecordingGateway::default());
        let service = StandardSmsConfirmationService::new(
            Arc::new(repo.clone()),
            gateway.clone(),
            Arc::new(EventBus::new(16)),
            "Confirmation code: {code}".to_string(),
        );
        Fixture { repo, gateway, service }
    }

    fn one_digit_off(code: &str) -> String {
        let mut chars: Vec<char> = code.chars().collect();
        let last = chars[5].to_digit(10).unwrap();
        chars[5] = char::from_digit((last + 1) % 10, 10).unwrap();
        chars.into_iter().collect()
    }

    #[tokio::test]
    async fn test_send_sms_persists_code_and_delivers_it() {
        let f = fixture();
        let record = f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();

        assert_eq!(record.code.len(), 6);
        assert!(record.code.chars().all(|c| c.is_ascii_digit()));
        assert!(!record.confirmed);

        let messages = f.gateway.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "+77001234567");
        assert_eq!(messages[0].1, format!("Confirmation code: {}", record.code));

        let latest = f.service.get_latest_by_document_id(DocumentId(7)).await.unwrap().unwrap();
        assert_eq!(latest.code, record.code);
    }

    #[tokio::test]
    async fn test_send_sms_rejects_blank_phone() {
        let f = fixture();
        let err = f.service.send_sms(DocumentId(7), "   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(f.gateway.messages().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_persists_nothing() {
        let repo = InMemorySmsConfirmationRepository::new();
        let service = StandardSmsConfirmationService::new(
            Arc::new(repo.clone()),
            Arc::new(RecordingGateway::failing()),
            Arc::new(EventBus::new(16)),
            "Confirmation code: {code}".to_string(),
        );

        let err = service.send_sms(DocumentId(7), "+77001234567").await.unwrap_err();
        assert!(matches!(err, ServiceError::Gateway(_)));
        assert!(repo.records_for(DocumentId(7)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_after_send_is_persist_error() {
        let gateway = Arc::new(RecordingGateway::default());
        let service = StandardSmsConfirmationService::new(
            Arc::new(BrokenStore),
            gateway.clone(),
            Arc::new(EventBus::new(16)),
            "Confirmation code: {code}".to_string(),
        );

        let err = service.send_sms(DocumentId(7), "+77001234567").await.unwrap_err();
        assert!(matches!(err, ServiceError::Persist(_)));
        assert_eq!(gateway.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_code_succeeds_exactly_once() {
        let f = fixture();
        let record = f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();

        assert!(f.service.confirm_code(DocumentId(7), &record.code).await.unwrap());
        assert!(!f.service.confirm_code(DocumentId(7), &record.code).await.unwrap());
        assert_eq!(
            f.service.check_code(DocumentId(7), &record.code).await.unwrap(),
            CodeCheck::Rejected(ConfirmationFailure::AlreadyConfirmed)
        );

        let stored = f.service.get_latest_by_document_id(DocumentId(7)).await.unwrap().unwrap();
        assert!(stored.confirmed);
        assert!(stored.confirmed_at.is_some());
    }

    #[tokio::test]
    async fn test_code_off_by_one_digit_fails() {
        let f = fixture();
        let record = f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();

        let wrong = one_digit_off(&record.code);
        assert_eq!(
            f.service.check_code(DocumentId(7), &wrong).await.unwrap(),
            CodeCheck::Rejected(ConfirmationFailure::NoRecord)
        );
        // Right code, wrong document
        assert!(!f.service.confirm_code(DocumentId(8), &record.code).await.unwrap());
        assert!(f.service.confirm_code(DocumentId(7), &record.code).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_code_is_refused_without_lookup() {
        let f = fixture();
        f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();
        assert!(!f.service.confirm_code(DocumentId(7), "12345").await.unwrap());
        assert!(!f.service.confirm_code(DocumentId(7), "abcdef").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_is_refused() {
        let f = fixture();
        f.repo
            .create(&NewSmsConfirmation {
                document_id: DocumentId(7),
                phone: "+77001234567".to_string(),
                code: "123456".to_string(),
                sent_at: Utc::now() - Duration::minutes(5) - Duration::seconds(1),
            })
            .await
            .unwrap();

        assert_eq!(
            f.service.check_code(DocumentId(7), "123456").await.unwrap(),
            CodeCheck::Rejected(ConfirmationFailure::Expired)
        );
    }

    #[tokio::test]
    async fn test_older_code_is_superseded_by_new_issue() {
        let f = fixture();
        f.repo
            .create(&NewSmsConfirmation {
                document_id: DocumentId(7),
                phone: "+77001234567".to_string(),
                code: "111111".to_string(),
                sent_at: Utc::now() - Duration::seconds(30),
            })
            .await
            .unwrap();
        f.repo
            .create(&NewSmsConfirmation {
                document_id: DocumentId(7),
                phone: "+77001234567".to_string(),
                code: "222222".to_string(),
                sent_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(
            f.service.check_code(DocumentId(7), "111111").await.unwrap(),
            CodeCheck::Rejected(ConfirmationFailure::Superseded)
        );
        assert!(f.service.confirm_code(DocumentId(7), "222222").await.unwrap());
    }

    // Issues a newer code right after the first latest-record lookup, as a
    // concurrent resend landing between the lookup and the write would
    struct ResendDuringRedeem {
        inner: InMemorySmsConfirmationRepository,
        resent: AtomicBool,
    }

    #[async_trait]
    impl SmsConfirmationRepository for ResendDuringRedeem {
        async fn create(&self, c: &NewSmsConfirmation) -> Result<crate::domain::sms_confirmation::ConfirmationId, RepositoryError> {
            self.inner.create(c).await
        }
        async fn find_by_document_and_code(&self, id: DocumentId, code: &str) -> Result<Option<SmsConfirmation>, RepositoryError> {
            self.inner.find_by_document_and_code(id, code).await
        }
        async fn find_latest_by_document(&self, id: DocumentId) -> Result<Option<SmsConfirmation>, RepositoryError> {
            let latest = self.inner.find_latest_by_document(id).await?;
            if !self.resent.swap(true, Ordering::SeqCst) {
                self.inner
                    .create(&NewSmsConfirmation {
                        document_id: id,
                        phone: "+77001234567".to_string(),
                        code: "999999".to_string(),
                        sent_at: Utc::now() + Duration::seconds(1),
                    })
                    .await?;
            }
            Ok(latest)
        }
        async fn update(&self, c: &SmsConfirmation) -> Result<(), RepositoryError> {
            self.inner.update(c).await
        }
        async fn delete_by_document(&self, id: DocumentId) -> Result<u64, RepositoryError> {
            self.inner.delete_by_document(id).await
        }
    }

    #[tokio::test]
    async fn test_resend_between_lookup_and_write_supersedes_old_code() {
        let repo = InMemorySmsConfirmationRepository::new();
        repo.create(&NewSmsConfirmation {
            document_id: DocumentId(7),
            phone: "+77001234567".to_string(),
            code: "111111".to_string(),
            sent_at: Utc::now() - Duration::seconds(10),
        })
        .await
        .unwrap();
        let service = StandardSmsConfirmationService::new(
            Arc::new(ResendDuringRedeem {
                inner: repo.clone(),
                resent: AtomicBool::new(false),
            }),
            Arc::new(RecordingGateway::default()),
            Arc::new(EventBus::new(16)),
            "Confirmation code: {code}".to_string(),
        );

        assert_eq!(
            service.check_code(DocumentId(7), "111111").await.unwrap(),
            CodeCheck::Rejected(ConfirmationFailure::Superseded)
        );
        let records = repo.records_for(DocumentId(7)).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| !r.confirmed));

        // The newer code is still the one that signs
        assert!(service.confirm_code(DocumentId(7), "999999").await.unwrap());
        assert!(!service.confirm_code(DocumentId(7), "111111").await.unwrap());
    }

    #[tokio::test]
    async fn test_resend_pending_redelivers_same_code() {
        let f = fixture();
        let issued = f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();

        let outcome = f.service.resend_sms(DocumentId(7), Some("+70000000000")).await.unwrap();
        assert!(matches!(outcome, ResendOutcome::Redelivered(_)));

        let latest = f.service.get_latest_by_document_id(DocumentId(7)).await.unwrap().unwrap();
        assert_eq!(latest.id, issued.id);
        assert_eq!(latest.code, issued.code);
        assert_eq!(latest.sent_at, issued.sent_at);
        assert_eq!(f.repo.records_for(DocumentId(7)).unwrap().len(), 1);

        // Same code to the original phone, the supplied one is ignored
        let messages = f.gateway.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], messages[0]);
    }

    #[tokio::test]
    async fn test_resend_without_record_requires_phone() {
        let f = fixture();
        let err = f.service.resend_sms(DocumentId(7), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::PhoneRequired));
        let err = f.service.resend_sms(DocumentId(7), Some("  ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::PhoneRequired));

        let outcome = f.service.resend_sms(DocumentId(7), Some("+77001234567")).await.unwrap();
        assert!(matches!(outcome, ResendOutcome::Issued(_)));
        assert_eq!(outcome.confirmation().phone, "+77001234567");
    }

    #[tokio::test]
    async fn test_resend_after_confirmation_issues_new_code_to_previous_phone() {
        let f = fixture();
        let first = f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();
        assert!(f.service.confirm_code(DocumentId(7), &first.code).await.unwrap());

        let outcome = f.service.resend_sms(DocumentId(7), None).await.unwrap();
        let ResendOutcome::Issued(second) = outcome else {
            panic!("expected a new code");
        };
        assert_ne!(second.id, first.id);
        assert_eq!(second.phone, "+77001234567");
        assert_eq!(f.repo.records_for(DocumentId(7)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_resend_after_expiry_issues_new_code() {
        let f = fixture();
        let old_id = f
            .repo
            .create(&NewSmsConfirmation {
                document_id: DocumentId(7),
                phone: "+77001234567".to_string(),
                code: "123456".to_string(),
                sent_at: Utc::now() - Duration::minutes(10),
            })
            .await
            .unwrap();

        let outcome = f.service.resend_sms(DocumentId(7), None).await.unwrap();
        let ResendOutcome::Issued(fresh) = outcome else {
            panic!("expected a new code");
        };
        assert_ne!(fresh.id, old_id);
        assert!(f.service.confirm_code(DocumentId(7), &fresh.code).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_confirmation_and_expiry_helper() {
        let f = fixture();
        f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();
        f.service.send_sms(DocumentId(7), "+77001234567").await.unwrap();

        assert_eq!(f.service.delete_confirmation(DocumentId(7)).await.unwrap(), 2);
        assert!(f.service.get_latest_by_document_id(DocumentId(7)).await.unwrap().is_none());

        assert!(!f.service.is_code_expired(Utc::now()));
        assert!(f.service.is_code_expired(Utc::now() - Duration::minutes(5)));
    }
}
