// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Document Aggregate
//!
//! A generated file (contract, invoice) owned by exactly one deal. The row is
//! mutable only through status transitions and deletion:
//!
//! ```text
//! new ──verify──▶ verified
//!  │                 │
//!  └────confirm──────┴──▶ signed
//! ```
//!
//! `signed` requires a valid SMS confirmation; that gate lives in the
//! application layer (`DocumentWorkflowService::confirm_document`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::deal::DealId;

// ============================================================================
// Value Objects
// ============================================================================

/// Surrogate key of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of document. The set is open: uploads may carry any type, but only
/// `contract` and `invoice` can be rendered from a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
    Contract,
    Invoice,
    Other(String),
}

impl DocumentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Contract => "contract",
            Self::Invoice => "invoice",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Whether the PDF renderer has a template for this type
    pub fn is_renderable(&self) -> bool {
        matches!(self, Self::Contract | Self::Invoice)
    }
}

impl From<String> for DocumentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "contract" => Self::Contract,
            "invoice" => Self::Invoice,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for DocumentType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<DocumentType> for String {
    fn from(value: DocumentType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    New,
    Verified,
    Signed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Verified => "verified",
            Self::Signed => "signed",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "verified" => Ok(Self::Verified),
            "signed" => Ok(Self::Signed),
            other => Err(DocumentError::UnknownStatus(other.to_string())),
        }
    }
}

// ============================================================================
// Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub deal_id: DealId,
    pub doc_type: DocumentType,
    /// Path relative to the configured document root
    pub file_path: String,
    pub status: DocumentStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn mark_verified(&mut self) {
        self.status = DocumentStatus::Verified;
    }

    pub fn mark_signed(&mut self, at: DateTime<Utc>) {
        self.status = DocumentStatus::Signed;
        self.signed_at = Some(at);
    }

    pub fn is_signed(&self) -> bool {
        self.status == DocumentStatus::Signed
    }
}

/// Document row before the store assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub deal_id: DealId,
    pub doc_type: DocumentType,
    pub file_path: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub signed_at: Option<DateTime<Utc>>,
}

impl NewDocument {
    pub fn new(deal_id: DealId, doc_type: DocumentType, file_path: impl Into<String>) -> Self {
        Self {
            deal_id,
            doc_type,
            file_path: file_path.into(),
            status: DocumentStatus::New,
            signed_at: None,
        }
    }

    pub fn into_document(self, id: DocumentId, created_at: DateTime<Utc>) -> Document {
        Document {
            id,
            deal_id: self.deal_id,
            doc_type: self.doc_type,
            file_path: self.file_path,
            status: self.status,
            signed_at: self.signed_at,
            created_at,
        }
    }
}

// ============================================================================
// Domain Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unknown document status: {0}")]
    UnknownStatus(String),
}
