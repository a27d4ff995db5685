//! ExpiryStatsClient - Aggregate Expiration Service Adapter
//!
//! ## Responsibilities
//!
//! - Build the item payload and POST it to the aggregate expiration service
//! - Average days-remaining across the tracked collection
//! - Near-expiry item listing with per-item days remaining
//!
//! The wire format keeps the service's Italian field names (`alimenti`,
//! `media_scadenza`, `in_scadenza`, `giorni_rimanenti`).

use crate::error::{Error, Result};
use crate::models::FoodItem;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One item on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryEntry {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "scadenza")]
    pub expiration_date: String,
}

/// Request body for both aggregate endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryPayload {
    #[serde(rename = "alimenti")]
    pub items: Vec<ExpiryEntry>,
}

impl ExpiryPayload {
    /// Build the payload from the tracked collection
    pub fn from_items(items: &[FoodItem]) -> Self {
        Self {
            items: items
                .iter()
                .map(|item| ExpiryEntry {
                    name: item.name.clone(),
                    expiration_date: item.expiration_date.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AverageResponse {
    #[serde(rename = "media_scadenza")]
    average_days: Option<f64>,
}

/// Near-expiry item as reported by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImminentItem {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "scadenza")]
    pub expiration_date: String,
    #[serde(rename = "giorni_rimanenti")]
    pub days_remaining: i64,
}

#[derive(Debug, Deserialize)]
struct ImminentResponse {
    #[serde(rename = "in_scadenza", default)]
    items: Vec<ImminentItem>,
}

/// HTTP client for the aggregate expiration service
pub struct ExpiryStatsClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExpiryStatsClient {
    /// Create new stats client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create new stats client with custom timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Average days remaining across the given items
    ///
    /// `None` when the service has no average to report (empty collection).
    pub async fn average_days(&self, items: &[FoodItem]) -> Result<Option<f64>> {
        let url = format!("{}/scadenza-media", self.base_url);
        let payload = ExpiryPayload::from_items(items);

        let resp = self.client.post(&url).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Api(format!(
                "average expiry request failed: {}",
                resp.status()
            )));
        }

        let body: AverageResponse = resp.json().await?;
        tracing::debug!(average = ?body.average_days, "Average expiry fetched");
        Ok(body.average_days)
    }

    /// Near-expiry items as seen by the service
    pub async fn imminent_items(&self, items: &[FoodItem]) -> Result<Vec<ImminentItem>> {
        let url = format!("{}/scadenze-imminenti", self.base_url);
        let payload = ExpiryPayload::from_items(items);

        let resp = self.client.post(&url).json(&payload).send().await?;
        if !resp.status().is_success() {
            return Err(Error::Api(format!(
                "imminent expiry request failed: {}",
                resp.status()
            )));
        }

        let body: ImminentResponse = resp.json().await?;
        Ok(body.items)
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
