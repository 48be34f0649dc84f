// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! SMS gateway port
//!
//! Outbound text delivery. Implementations live in `crate::infrastructure::sms`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider acknowledgement of an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsDelivery {
    pub message_id: String,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, text: &str) -> Result<SmsDelivery, SmsGatewayError>;

    /// Provider name for logs
    fn provider(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum SmsGatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider rejected message (code {code}): {message}")]
    Provider { code: i64, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Gateway misconfigured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for SmsGatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SmsGatewayError::InvalidResponse(err.to_string())
        } else {
            SmsGatewayError::Network(err.to_string())
        }
    }
}
