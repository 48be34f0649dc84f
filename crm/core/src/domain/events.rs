// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use crate::domain::deal::DealId;
use crate::domain::document::{DocumentId, DocumentType};
use crate::domain::lead::LeadId;
use crate::domain::sms_confirmation::ConfirmationId;

/// Document lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocumentEvent {
    DealOpened {
        deal_id: DealId,
        lead_id: LeadId,
        opened_at: DateTime<Utc>,
    },
    DocumentCreated {
        document_id: DocumentId,
        deal_id: DealId,
        doc_type: DocumentType,
        file_path: String,
        created_at: DateTime<Utc>,
    },
    DocumentVerified {
        document_id: DocumentId,
        verified_at: DateTime<Utc>,
    },
    DocumentSigned {
        document_id: DocumentId,
        signed_at: DateTime<Utc>,
    },
    DocumentDeleted {
        document_id: DocumentId,
        deleted_at: DateTime<Utc>,
    },
}

/// SMS confirmation events. Codes are never carried on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConfirmationEvent {
    CodeIssued {
        confirmation_id: ConfirmationId,
        document_id: DocumentId,
        provider_message_id: String,
        issued_at: DateTime<Utc>,
    },
    CodeRedelivered {
        confirmation_id: ConfirmationId,
        document_id: DocumentId,
        provider_message_id: String,
        redelivered_at: DateTime<Utc>,
    },
    CodeConfirmed {
        confirmation_id: ConfirmationId,
        document_id: DocumentId,
        confirmed_at: DateTime<Utc>,
    },
    ConfirmationsCleared {
        document_id: DocumentId,
        cleared_at: DateTime<Utc>,
    },
}

impl DocumentEvent {
    pub fn document_id(&self) -> Option<DocumentId> {
        match self {
            Self::DealOpened { .. } => None,
            Self::DocumentCreated { document_id, .. }
            | Self::DocumentVerified { document_id, .. }
            | Self::DocumentSigned { document_id, .. }
            | Self::DocumentDeleted { document_id, .. } => Some(*document_id),
        }
    }
}

impl ConfirmationEvent {
    pub fn document_id(&self) -> DocumentId {
        match self {
            Self::CodeIssued { document_id, .. }
            | Self::CodeRedelivered { document_id, .. }
            | Self::CodeConfirmed { document_id, .. }
            | Self::ConfirmationsCleared { document_id, .. } => *document_id,
        }
    }
}
