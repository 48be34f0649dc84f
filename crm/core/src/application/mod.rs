// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod error;
pub mod document_service;
pub mod sms_confirmation_service;
pub mod repository_factory;

// Re-export services for convenience
pub use document_service::{DocumentWorkflowService, StandardDocumentService};
pub use error::{ConfirmationFailure, ServiceError};
pub use repository_factory::Repositories;
pub use sms_confirmation_service::{CodeCheck, SmsConfirmationService, StandardSmsConfirmationService};
