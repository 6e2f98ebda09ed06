//! Payment session initiation
//!
//! Obtains a payment-session credential (client secret) from the external
//! payment intent service. Stores nothing itself; the caller owns the
//! pending record, so a failed initiation leaves no partial state and the
//! same request id can simply be resubmitted.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Inclusive tip bounds in whole currency units
pub const MIN_TIP: i64 = 1;
pub const MAX_TIP: i64 = 999;

/// Payment session errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Tip outside [1, 999]; raised before any network call
    #[error("Invalid tip amount: {0}")]
    InvalidAmount(i64),

    #[error("Payment service unreachable: {0}")]
    Unreachable(String),

    /// The service answered but refused to create a session
    #[error("Payment service rejected the request: {0}")]
    Rejected(String),

    #[error("Malformed payment service response: {0}")]
    Parse(String),
}

/// Reject tip amounts outside the accepted range
pub fn validate_tip_amount(amount: i64) -> Result<(), PaymentError> {
    if (MIN_TIP..=MAX_TIP).contains(&amount) {
        Ok(())
    } else {
        Err(PaymentError::InvalidAmount(amount))
    }
}

#[derive(Debug, Serialize)]
struct IntentRequest {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct IntentResponse {
    #[serde(rename = "clientSecret")]
    client_secret: Option<String>,
    error: Option<String>,
}

/// Client for the external payment intent service
///
/// The service contract is `POST / {"amount": n}` answering either
/// `{"clientSecret": "..."}` or `{"error": "..."}`.
pub struct PaymentIntentClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl PaymentIntentClient {
    pub fn new(endpoint: &str) -> reqline_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| reqline_common::Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Create a payment intent for `amount`, returning the session credential
    ///
    /// Validation happens before the request goes out; an out-of-range
    /// amount never reaches the network.
    pub async fn create_intent(&self, amount: i64) -> Result<String, PaymentError> {
        validate_tip_amount(amount)?;

        debug!(amount, endpoint = %self.endpoint, "Requesting payment intent");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&IntentRequest { amount })
            .send()
            .await
            .map_err(|e| PaymentError::Unreachable(e.to_string()))?;

        let body: IntentResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(PaymentError::Rejected(error));
        }

        body.client_secret
            .ok_or_else(|| PaymentError::Parse("response carried neither clientSecret nor error".to_string()))
    }
}
