// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Mobizon SMS Adapter
//
// Anti-Corruption Layer for the Mobizon HTTP API
// (POST {endpoint}/service/message/sendsmsmessage, form encoded).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::sms::{SmsDelivery, SmsGateway, SmsGatewayError};

const SEND_PATH: &str = "/service/message/sendsmsmessage";

pub struct MobizonSmsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct MobizonResponse {
    code: i64,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    message: String,
}

impl MobizonSmsGateway {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, SmsGatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SmsGatewayError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

/// `messageId` arrives as a string or a number depending on API version
fn message_id(data: &serde_json::Value) -> Option<String> {
    match data.get("messageId")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl SmsGateway for MobizonSmsGateway {
    async fn send(&self, phone: &str, text: &str) -> Result<SmsDelivery, SmsGatewayError> {
        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), SEND_PATH);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("apiKey", self.api_key.as_str()),
                ("recipient", phone),
                ("text", text),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, "Mobizon response received");

        let parsed: MobizonResponse = serde_json::from_str(&body).map_err(|e| {
            SmsGatewayError::InvalidResponse(format!("HTTP {}: {}", status, e))
        })?;

        if parsed.code != 0 {
            warn!(code = parsed.code, "Mobizon rejected message");
            return Err(SmsGatewayError::Provider {
                code: parsed.code,
                message: parsed.message,
            });
        }

        let message_id = message_id(&parsed.data)
            .ok_or_else(|| SmsGatewayError::InvalidResponse("missing data.messageId".to_string()))?;

        Ok(SmsDelivery { message_id })
    }

    fn provider(&self) -> &'static str {
        "mobizon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn gateway(endpoint: String) -> MobizonSmsGateway {
        MobizonSmsGateway::new(endpoint, "test-key".to_string(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_posts_form_and_returns_message_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", SEND_PATH)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("apiKey".into(), "test-key".into()),
                Matcher::UrlEncoded("recipient".into(), "+77001234567".into()),
                Matcher::UrlEncoded("text".into(), "Confirmation code: 004217".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"code":0,"data":{"campaignId":"1","messageId":"53071","status":1},"message":""}"#)
            .create_async()
            .await;

        let delivery = gateway(server.url())
            .send("+77001234567", "Confirmation code: 004217")
            .await
            .unwrap();

        assert_eq!(delivery.message_id, "53071");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_numeric_message_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SEND_PATH)
            .with_body(r#"{"code":0,"data":{"messageId":981}}"#)
            .create_async()
            .await;

        let delivery = gateway(server.url()).send("+7700", "x").await.unwrap();
        assert_eq!(delivery.message_id, "981");
    }

    #[tokio::test]
    async fn test_nonzero_code_is_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SEND_PATH)
            .with_body(r#"{"code":1,"data":[],"message":"Invalid recipient"}"#)
            .create_async()
            .await;

        let err = gateway(server.url()).send("bad", "x").await.unwrap_err();
        match err {
            SmsGatewayError::Provider { code, message } => {
                assert_eq!(code, 1);
                assert_eq!(message, "Invalid recipient");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", SEND_PATH)
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = gateway(server.url()).send("+7700", "x").await.unwrap_err();
        assert!(matches!(err, SmsGatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // Port 9 (discard) on loopback refuses connections
        let err = gateway("http://127.0.0.1:9".to_string())
            .send("+7700", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, SmsGatewayError::Network(_)));
    }
}
