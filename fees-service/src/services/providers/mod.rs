pub mod sms;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::directory::SmsSettings;

pub use sms::{MockSmsProvider, SmsGatewayProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider_id: Option<String>,
    pub success: bool,
    pub message: Option<String>,
}

impl ProviderResponse {
    pub fn success(provider_id: Option<String>) -> Self {
        Self {
            provider_id,
            success: true,
            message: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// SMS delivery collaborator. The caller treats the outcome as
/// informational: a failed send is logged, never propagated.
#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send(
        &self,
        settings: &SmsSettings,
        sms: &SmsMessage,
    ) -> Result<ProviderResponse, ProviderError>;
}
