// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application service errors
//!
//! One taxonomy for both services. The HTTP layer maps `NotFound` to 404, the
//! caller mistakes to 400 and everything else to an opaque 500.

use serde::Serialize;
use thiserror::Error;

use crate::domain::pdf::RenderError;
use crate::domain::repository::RepositoryError;
use crate::domain::sms::SmsGatewayError;

/// Why a confirmation code did not authorise signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationFailure {
    /// No record carries this code for the document
    NoRecord,
    AlreadyConfirmed,
    Expired,
    /// A newer code was issued for the document, or a concurrent confirm won
    Superseded,
}

impl ConfirmationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRecord => "no_record",
            Self::AlreadyConfirmed => "already_confirmed",
            Self::Expired => "expired",
            Self::Superseded => "superseded",
        }
    }
}

impl std::fmt::Display for ConfirmationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoRecord => "no matching confirmation code",
            Self::AlreadyConfirmed => "code already used",
            Self::Expired => "code expired",
            Self::Superseded => "code superseded by a newer one",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Phone number is required for the first message")]
    PhoneRequired,

    #[error("SMS gateway error: {0}")]
    Gateway(#[from] SmsGatewayError),

    #[error("PDF rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Persistence error: {0}")]
    Persist(#[from] RepositoryError),

    #[error("Confirmation failed: {0}")]
    ConfirmationFailed(ConfirmationFailure),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Caller mistakes as opposed to server faults
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::InvalidInput(_)
                | Self::UnsupportedType(_)
                | Self::PhoneRequired
                | Self::ConfirmationFailed(_)
        )
    }
}
