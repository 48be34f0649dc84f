// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared wiring for the integration tests: in-memory stores, the real PDF
//! renderer writing into a temporary document root and the logging SMS gateway.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use turcrm_core::application::{Repositories, StandardDocumentService, StandardSmsConfirmationService};
use turcrm_core::domain::crm_config::default_message_template;
use turcrm_core::domain::lead::{LeadId, NewLead};
use turcrm_core::domain::repository::LeadRepository;
use turcrm_core::infrastructure::pdf::PrintPdfRenderer;
use turcrm_core::infrastructure::sms::logging::LoggingSmsGateway;
use turcrm_core::infrastructure::EventBus;

pub struct Harness {
    _root: tempfile::TempDir,
    pub document_root: PathBuf,
    pub repositories: Repositories,
    pub event_bus: Arc<EventBus>,
    pub sms: Arc<StandardSmsConfirmationService>,
    pub documents: Arc<StandardDocumentService>,
}

impl Harness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let document_root = root.path().to_path_buf();
        let repositories = Repositories::in_memory();
        let event_bus = Arc::new(EventBus::with_default_capacity());

        let sms = Arc::new(StandardSmsConfirmationService::new(
            repositories.confirmations.clone(),
            Arc::new(LoggingSmsGateway::new()),
            event_bus.clone(),
            default_message_template(),
        ));
        let documents = Arc::new(StandardDocumentService::new(
            &repositories,
            Arc::new(PrintPdfRenderer::new()),
            sms.clone(),
            event_bus.clone(),
            document_root.clone(),
        ));

        Self {
            _root: root,
            document_root,
            repositories,
            event_bus,
            sms,
            documents,
        }
    }

    pub async fn seed_lead(&self, title: &str) -> LeadId {
        self.repositories.leads.create(&NewLead::new(title)).await.unwrap()
    }
}
