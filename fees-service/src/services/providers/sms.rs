use super::{ProviderError, ProviderResponse, SmsMessage, SmsProvider};
use crate::config::SmsGatewayConfig;
use crate::services::directory::SmsSettings;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// SMS provider backed by an HTTP gateway.
pub struct SmsGatewayProvider {
    config: SmsGatewayConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GatewayRequest {
    sender: String,
    to: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(rename = "type")]
    response_type: String,
    message: String,
    #[serde(default)]
    request_id: Option<String>,
}

impl SmsGatewayProvider {
    pub fn new(config: SmsGatewayConfig) -> Result<Self, ProviderError> {
        // Bounded timeout: a slow gateway must not hold up the caller.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("Failed to build client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl SmsProvider for SmsGatewayProvider {
    async fn send(
        &self,
        settings: &SmsSettings,
        sms: &SmsMessage,
    ) -> Result<ProviderResponse, ProviderError> {
        // Normalize phone number (remove non-digits except leading +)
        let normalized_phone = sms
            .to
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect::<String>();

        if normalized_phone.is_empty() {
            return Err(ProviderError::InvalidRecipient(
                "Phone number is empty".to_string(),
            ));
        }

        let request = GatewayRequest {
            sender: settings.sender_id.clone(),
            to: normalized_phone,
            message: sms.body.clone(),
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("authkey", settings.auth_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to reach SMS gateway: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "SMS gateway returned error status {}: {}",
                status, body
            )));
        }

        let gateway_response: GatewayResponse = response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse gateway response: {}", e))
        })?;

        if gateway_response.response_type != "success" {
            return Err(ProviderError::SendFailed(format!(
                "SMS gateway error: {}",
                gateway_response.message
            )));
        }

        tracing::info!(to = %sms.to, "SMS sent via gateway");

        Ok(ProviderResponse::success(gateway_response.request_id))
    }
}

/// Mock SMS provider for testing.
#[derive(Default)]
pub struct MockSmsProvider {
    fail_next: AtomicBool,
    send_count: AtomicU64,
}

impl MockSmsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send report a delivery failure.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmsProvider for MockSmsProvider {
    async fn send(
        &self,
        _settings: &SmsSettings,
        sms: &SmsMessage,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.fail_next.load(Ordering::SeqCst) {
            return Err(ProviderError::SendFailed(
                "Mock SMS provider configured to fail".to_string(),
            ));
        }

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            to = %sms.to,
            body_length = %sms.body.len(),
            "[MOCK] SMS would be sent"
        );

        Ok(ProviderResponse::success(Some(format!("mock-sms-{}", count))))
    }
}
