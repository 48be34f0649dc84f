// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Development gateway: messages go to the log instead of a provider.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::domain::sms::{SmsDelivery, SmsGateway, SmsGatewayError};

#[derive(Debug, Default)]
pub struct LoggingSmsGateway {
    sent: AtomicU64,
}

impl LoggingSmsGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SmsGateway for LoggingSmsGateway {
    async fn send(&self, phone: &str, text: &str) -> Result<SmsDelivery, SmsGatewayError> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        let message_id = format!("log-{}", n);
        info!(phone = %phone, message_id = %message_id, "SMS delivery skipped (log provider)");
        // Message text carries the code
        debug!(text = %text, "SMS body");
        Ok(SmsDelivery { message_id })
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}
