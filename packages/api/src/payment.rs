// ABOUTME: Masumi payment gateway client used to gate paid jobs
// ABOUTME: A trait seam so tests and unpaid deployments skip the network entirely

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment request failed: {0}")]
    Request(String),

    #[error("Payment service answered {status}: {message}")]
    Service { status: u16, message: String },
}

/// A created payment request, as surfaced to the purchaser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(rename = "blockchainIdentifier")]
    pub blockchain_identifier: String,
    #[serde(rename = "payByTime")]
    pub pay_by_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Expired,
}

/// Payment gateway operations needed by the job lifecycle.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Registers a payment request for one job and returns its identifiers.
    async fn create_payment_request(
        &self,
        identifier_from_purchaser: &str,
        input_data: &HashMap<String, String>,
    ) -> Result<PaymentRequest, PaymentError>;

    async fn check_payment_status(
        &self,
        blockchain_identifier: &str,
    ) -> Result<PaymentStatus, PaymentError>;

    /// Marks the payment complete, submitting a hash of the delivered
    /// result.
    async fn complete_payment(
        &self,
        blockchain_identifier: &str,
        result_hash: &str,
    ) -> Result<(), PaymentError>;
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub service_url: String,
    pub api_key: String,
    pub agent_identifier: String,
    pub network: String,
}

/// Client for the Masumi payment service HTTP API.
pub struct HttpPaymentClient {
    config: PaymentConfig,
    client: reqwest::Client,
}

impl HttpPaymentClient {
    pub fn new(config: PaymentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.service_url.trim_end_matches('/'), path)
    }
}

#[derive(Deserialize)]
struct ServiceEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct StatusData {
    status: String,
}

#[async_trait]
impl PaymentClient for HttpPaymentClient {
    async fn create_payment_request(
        &self,
        identifier_from_purchaser: &str,
        input_data: &HashMap<String, String>,
    ) -> Result<PaymentRequest, PaymentError> {
        let body = json!({
            "agentIdentifier": self.config.agent_identifier,
            "network": self.config.network,
            "identifierFromPurchaser": identifier_from_purchaser,
            "inputData": input_data,
        });

        let response = self
            .client
            .post(self.url("payment"))
            .header("token", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Service {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: ServiceEnvelope<PaymentRequest> = response
            .json()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;
        info!(
            blockchain_identifier = %envelope.data.blockchain_identifier,
            "payment request created"
        );
        Ok(envelope.data)
    }

    async fn check_payment_status(
        &self,
        blockchain_identifier: &str,
    ) -> Result<PaymentStatus, PaymentError> {
        let response = self
            .client
            .get(self.url("payment"))
            .header("token", &self.config.api_key)
            .query(&[("blockchainIdentifier", blockchain_identifier)])
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Service {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: ServiceEnvelope<StatusData> = response
            .json()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;
        debug!(status = %envelope.data.status, "payment status checked");

        Ok(match envelope.data.status.as_str() {
            "FundsLocked" | "Confirmed" | "completed" => PaymentStatus::Confirmed,
            "Expired" | "Refunded" => PaymentStatus::Expired,
            _ => PaymentStatus::Pending,
        })
    }

    async fn complete_payment(
        &self,
        blockchain_identifier: &str,
        result_hash: &str,
    ) -> Result<(), PaymentError> {
        let body = json!({
            "blockchainIdentifier": blockchain_identifier,
            "resultHash": result_hash,
        });

        let response = self
            .client
            .patch(self.url("payment"))
            .header("token", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Service {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
