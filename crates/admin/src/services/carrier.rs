//! Carrier tracking API client.
//!
//! The dashboard only consumes the carrier at this seam: hand it a tracking
//! number, get back a coarse status. The HTTP client below is deliberately
//! thin; label parsing and tracking-number extraction live outside this
//! system entirely.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use crate::config::CarrierConfig;

/// Coarse parcel status as reported by the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    /// Label created, not yet moving.
    Pending,
    /// Parcel is moving through the network.
    InTransit,
    /// Carrier reported delivery.
    Delivered,
    /// Carrier returned something we don't recognize.
    Unknown,
}

impl TrackingStatus {
    /// Map a carrier status code to a coarse status.
    #[must_use]
    pub fn from_carrier_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "pending" | "pre_transit" | "label_created" => Self::Pending,
            "in_transit" | "out_for_delivery" | "transit" => Self::InTransit,
            "delivered" => Self::Delivered,
            _ => Self::Unknown,
        }
    }
}

/// Errors from the carrier tracking API.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Request failed (network, timeout, non-2xx).
    #[error("carrier request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response did not have the expected shape.
    #[error("unexpected carrier response: {0}")]
    UnexpectedResponse(String),
}

/// Fetches the current status for a tracking number.
#[async_trait]
pub trait TrackingClient: Send + Sync {
    /// Look up a tracking number.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError` if the carrier request fails or the response
    /// is malformed.
    async fn fetch_status(&self, tracking_number: &str)
    -> Result<TrackingStatus, TrackingError>;
}

/// Response shape for the tracking endpoint.
#[derive(Debug, Deserialize)]
struct TrackingResponse {
    status: String,
}

/// HTTP implementation of [`TrackingClient`].
pub struct HttpTrackingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: secrecy::SecretString,
}

impl HttpTrackingClient {
    /// Build a client from carrier configuration.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized (startup-time only).
    #[must_use]
    pub fn new(config: &CarrierConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build carrier HTTP client");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl TrackingClient for HttpTrackingClient {
    async fn fetch_status(
        &self,
        tracking_number: &str,
    ) -> Result<TrackingStatus, TrackingError> {
        let url = format!("{}/v1/trackings/{tracking_number}", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?
            .error_for_status()?;

        let body: TrackingResponse = response
            .json()
            .await
            .map_err(|e| TrackingError::UnexpectedResponse(e.to_string()))?;

        Ok(TrackingStatus::from_carrier_code(&body.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_code_mapping() {
        assert_eq!(
            TrackingStatus::from_carrier_code("delivered"),
            TrackingStatus::Delivered
        );
        assert_eq!(
            TrackingStatus::from_carrier_code("IN_TRANSIT"),
            TrackingStatus::InTransit
        );
        assert_eq!(
            TrackingStatus::from_carrier_code("label_created"),
            TrackingStatus::Pending
        );
        assert_eq!(
            TrackingStatus::from_carrier_code("lost_in_the_void"),
            TrackingStatus::Unknown
        );
    }
}
