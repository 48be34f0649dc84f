// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SMS gateway adapters

pub mod logging;
pub mod mobizon;

pub use logging::LoggingSmsGateway;
pub use mobizon::MobizonSmsGateway;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::crm_config::{SmsConfig, SmsProvider};
use crate::domain::sms::{SmsGateway, SmsGatewayError};

/// Build the gateway selected by `spec.sms.provider`
pub fn gateway_from_config(config: &SmsConfig) -> Result<Arc<dyn SmsGateway>, SmsGatewayError> {
    match config.provider {
        SmsProvider::Log => Ok(Arc::new(LoggingSmsGateway::new())),
        SmsProvider::Mobizon => {
            let api_key = config.resolve_api_key().ok_or_else(|| {
                SmsGatewayError::Configuration("spec.sms.api_key is not set".to_string())
            })?;
            let gateway = MobizonSmsGateway::new(
                config.endpoint.clone(),
                api_key,
                Duration::from_secs(config.timeout_seconds),
            )?;
            Ok(Arc::new(gateway))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_selection() {
        let mut config = SmsConfig::default();
        assert_eq!(gateway_from_config(&config).unwrap().provider(), "log");

        config.provider = SmsProvider::Mobizon;
        assert!(matches!(
            gateway_from_config(&config),
            Err(SmsGatewayError::Configuration(_))
        ));

        config.api_key = Some("test-key".to_string());
        assert_eq!(gateway_from_config(&config).unwrap().provider(), "mobizon");
    }
}
