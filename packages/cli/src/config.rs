// ABOUTME: Environment-driven configuration for the server and one-shot runs
// ABOUTME: Everything has a default except the provider API key

use std::env;
use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

use promptforge_api::PaymentConfig;
use promptforge_governor::GovernorConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub api_key: String,
    pub model: Option<String>,
    pub governor: GovernorConfig,
    pub cache_ttl: Duration,
    pub context_dir: String,
    pub checkpoint_dir: String,
    pub budget_secs: u64,
    pub agent_identifier: String,
    /// Present only when the payment service is fully configured.
    pub payment: Option<PaymentConfig>,
}

fn env_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            name,
            value,
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;
        let model = env::var("ANTHROPIC_MODEL").ok();

        let defaults = GovernorConfig::default();
        let governor = GovernorConfig {
            per_second: env_u32("RATE_LIMIT_PER_SECOND", defaults.per_second)?,
            per_minute: env_u32("RATE_LIMIT_PER_MINUTE", defaults.per_minute)?,
            per_hour: env_u32("RATE_LIMIT_PER_HOUR", defaults.per_hour)?,
            per_day: env_u32("RATE_LIMIT_PER_DAY", defaults.per_day)?,
            ..defaults
        };

        let cache_ttl = Duration::from_secs(env_u64("CACHE_TTL_SECS", 900)?);
        let budget_secs = env_u64(
            "PIPELINE_BUDGET_SECS",
            promptforge_pipeline::DEFAULT_BUDGET_SECS,
        )?;

        let context_dir =
            env::var("CONTEXT_DIR").unwrap_or_else(|_| "data/context".to_string());
        let checkpoint_dir =
            env::var("CHECKPOINT_DIR").unwrap_or_else(|_| "data/checkpoints".to_string());

        let agent_identifier =
            env::var("AGENT_IDENTIFIER").unwrap_or_else(|_| "promptforge-agent".to_string());

        // Payment is optional: the service runs unpaid unless the gateway
        // is fully configured.
        let payment = match (
            env::var("PAYMENT_SERVICE_URL"),
            env::var("PAYMENT_API_KEY"),
        ) {
            (Ok(service_url), Ok(api_key)) => Some(PaymentConfig {
                service_url,
                api_key,
                agent_identifier: agent_identifier.clone(),
                network: env::var("NETWORK").unwrap_or_else(|_| "Preprod".to_string()),
            }),
            _ => None,
        };

        Ok(Config {
            port,
            cors_origin,
            api_key,
            model,
            governor,
            cache_ttl,
            context_dir,
            checkpoint_dir,
            budget_secs,
            agent_identifier,
            payment,
        })
    }
}
