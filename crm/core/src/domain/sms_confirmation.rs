// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SMS Confirmation
//!
//! Short-lived numeric codes that authorise signing a document. Per document the
//! active record moves through:
//!
//! ```text
//! None ──send──▶ Pending ──confirm (in window)──▶ Confirmed
//!                   │
//!                   └──5 minutes elapse──▶ Expired
//! ```
//!
//! Expiry is evaluated lazily against the wall clock; nothing sweeps old rows.
//! Codes are uniformly random but not cryptographic: the property relied on is
//! possession of the phone, and the window bounds guessing over 10^6 values.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::document::DocumentId;

/// Validity window of an issued code
pub const CODE_TTL_SECONDS: i64 = 300;

/// Number of digits in a confirmation code
pub const CODE_LENGTH: usize = 6;

pub fn code_ttl() -> Duration {
    Duration::seconds(CODE_TTL_SECONDS)
}

/// `true` once `now` has reached `sent_at + 5min`. The window is `[sent_at, sent_at + 5min)`.
pub fn is_expired_at(sent_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= sent_at + code_ttl()
}

/// Uniformly random 6-digit code in `000000..=999999`
pub fn generate_confirmation_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(0..1_000_000);
    format!("{:06}", code)
}

/// Shape check applied before a code reaches the store
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.chars().all(|c| c.is_ascii_digit())
}

/// Surrogate key of a confirmation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(pub i64);

impl std::fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfirmation {
    pub id: ConfirmationId,
    pub document_id: DocumentId,
    pub phone: String,
    #[serde(rename = "sms_code")]
    pub code: String,
    pub sent_at: DateTime<Utc>,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency token, bumped by every update
    #[serde(skip_serializing)]
    pub version: i32,
}

impl SmsConfirmation {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.sent_at + code_ttl()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired_at(self.sent_at, now)
    }

    /// Unconfirmed and still inside the window
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        !self.confirmed && !self.is_expired_at(now)
    }

    pub fn confirm(&mut self, at: DateTime<Utc>) {
        self.confirmed = true;
        self.confirmed_at = Some(at);
    }
}

#[derive(Debug, Clone)]
pub struct NewSmsConfirmation {
    pub document_id: DocumentId,
    pub phone: String,
    pub code: String,
    pub sent_at: DateTime<Utc>,
}

impl NewSmsConfirmation {
    pub fn into_confirmation(self, id: ConfirmationId) -> SmsConfirmation {
        SmsConfirmation {
            id,
            document_id: self.document_id,
            phone: self.phone,
            code: self.code,
            sent_at: self.sent_at,
            confirmed: false,
            confirmed_at: None,
            version: 0,
        }
    }
}
