use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct FeesConfig {
    pub common: CoreConfig,
    pub database: DatabaseConfig,
    pub sms: SmsGatewayConfig,
    pub service_name: String,
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SmsGatewayConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

impl FeesConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let common = CoreConfig::load()?;

        let db_url = env::var("FEES_DATABASE_URL").expect("FEES_DATABASE_URL must be set");
        let max_connections = env::var("FEES_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("FEES_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let sms_api_url = env::var("FEES_SMS_GATEWAY_URL")
            .unwrap_or_else(|_| "https://api.msg91.com/api/v5/flow/".to_string());
        let sms_timeout_secs = env::var("FEES_SMS_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let log_level = env::var("FEES_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            common,
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            sms: SmsGatewayConfig {
                api_url: sms_api_url,
                timeout_secs: sms_timeout_secs,
            },
            service_name: "fees-service".to_string(),
            log_level,
        })
    }
}
