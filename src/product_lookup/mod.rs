//! ProductLookup - Barcode Resolution with Session Cache
//!
//! ## Responsibilities
//!
//! - Resolve a scanned barcode to product metadata via the remote product
//!   database
//! - Cache successful resolutions per barcode so repeated detections of the
//!   same code never re-issue the network call
//!
//! Failures are never cached: a not-found or unreachable lookup is
//! re-attempted on the next detection of the same barcode. There is no
//! in-flight suppression; two detections of an uncached barcode racing the
//! first response may both reach the network.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Product metadata resolved from a barcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    /// Product display name
    pub name: String,
    /// Printed expiration date if the database carries one
    pub expiration_date: Option<String>,
    /// Product image URL (primary field, front-image fallback)
    pub image_url: Option<String>,
}

/// Remote source of product metadata
///
/// Seam for the resolver so tests can count outbound calls.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn fetch(&self, barcode: &str) -> Result<ProductInfo>;
}

/// Raw lookup response from the product database
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: i64,
    product: Option<ProductPayload>,
}

#[derive(Debug, Deserialize)]
struct ProductPayload {
    product_name: Option<String>,
    expiration_date: Option<String>,
    image_url: Option<String>,
    image_front_url: Option<String>,
}

/// HTTP client for the public product database
pub struct ProductDbClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProductDbClient {
    /// Create new client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create new client with custom timeout
    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, base_url }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProductSource for ProductDbClient {
    async fn fetch(&self, barcode: &str) -> Result<ProductInfo> {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::LookupNetwork(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::LookupNetwork(format!(
                "product lookup returned {}",
                resp.status()
            )));
        }

        let body: LookupResponse = resp
            .json()
            .await
            .map_err(|e| Error::LookupParse(e.to_string()))?;

        if body.status != 1 {
            return Err(Error::LookupNotFound(barcode.to_string()));
        }

        let product = body
            .product
            .ok_or_else(|| Error::LookupParse("missing product object".to_string()))?;

        let name = product
            .product_name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::LookupParse("missing product_name".to_string()))?;

        Ok(ProductInfo {
            name,
            expiration_date: product.expiration_date,
            image_url: product.image_url.or(product.image_front_url),
        })
    }
}

/// Barcode resolver with per-session cache
pub struct BarcodeResolver {
    source: Arc<dyn ProductSource>,
    /// barcode -> resolved product
    cache: RwLock<HashMap<String, ProductInfo>>,
}

impl BarcodeResolver {
    /// Create new resolver over a product source
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a barcode, cache-first
    ///
    /// Only successful resolutions enter the cache; errors propagate to the
    /// caller uncached.
    pub async fn resolve(&self, barcode: &str) -> Result<ProductInfo> {
        {
            let cache = self.cache.read().await;
            if let Some(info) = cache.get(barcode) {
                tracing::debug!(barcode = %barcode, "Barcode cache hit");
                return Ok(info.clone());
            }
        }

        let info = self.source.fetch(barcode).await?;

        {
            let mut cache = self.cache.write().await;
            cache.insert(barcode.to_string(), info.clone());
        }

        tracing::info!(
            barcode = %barcode,
            product = %info.name,
            has_expiration = info.expiration_date.is_some(),
            "Barcode resolved"
        );

        Ok(info)
    }

    /// Whether a barcode is already cached
    pub async fn is_cached(&self, barcode: &str) -> bool {
        self.cache.read().await.contains_key(barcode)
    }

    /// Number of cached barcodes
    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drop all cached resolutions (scan session start)
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        tracing::debug!("Barcode cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts outbound calls and serves a fixed table
    struct CountingSource {
        calls: AtomicUsize,
        table: HashMap<String, ProductInfo>,
    }

    impl CountingSource {
        fn new(table: HashMap<String, ProductInfo>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                table,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductSource for CountingSource {
        async fn fetch(&self, barcode: &str) -> Result<ProductInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .get(barcode)
                .cloned()
                .ok_or_else(|| Error::LookupNotFound(barcode.to_string()))
        }
    }

    fn milk() -> ProductInfo {
        ProductInfo {
            name: "Milk".to_string(),
            expiration_date: Some("10/05/2025".to_string()),
            image_url: Some("https://img.example/milk.jpg".to_string()),
        }
    }

    fn milk_source() -> Arc<CountingSource> {
        let mut table = HashMap::new();
        table.insert("0001".to_string(), milk());
        Arc::new(CountingSource::new(table))
    }

    #[tokio::test]
    async fn test_second_detection_served_from_cache() {
        let source = milk_source();
        let resolver = BarcodeResolver::new(source.clone());

        let first = resolver.resolve("0001").await.unwrap();
        assert_eq!(first, milk());
        assert_eq!(source.calls(), 1);

        let second = resolver.resolve("0001").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1, "cache hit must not reach the network");
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached_and_reattempts() {
        let source = milk_source();
        let resolver = BarcodeResolver::new(source.clone());

        assert!(matches!(
            resolver.resolve("9999").await,
            Err(Error::LookupNotFound(_))
        ));
        assert!(!resolver.is_cached("9999").await);

        // Same barcode again re-attempts the network call
        let _ = resolver.resolve("9999").await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_fresh_lookup() {
        let source = milk_source();
        let resolver = BarcodeResolver::new(source.clone());

        resolver.resolve("0001").await.unwrap();
        resolver.clear_cache().await;
        assert_eq!(resolver.cache_len().await, 0);

        resolver.resolve("0001").await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_lookup_response_parsing() {
        let body = r#"{
            "status": 1,
            "product": {
                "product_name": "Latte",
                "image_front_url": "https://img.example/front.jpg"
            }
        }"#;
        let parsed: LookupResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.status, 1);
        let product = parsed.product.unwrap();
        assert_eq!(product.product_name.as_deref(), Some("Latte"));
        assert!(product.image_url.is_none());
        assert_eq!(
            product.image_front_url.as_deref(),
            Some("https://img.example/front.jpg")
        );
    }

    #[test]
    fn test_lookup_response_status_defaults_to_absent() {
        // Explicit zero and missing status both mean "not found"
        let parsed: LookupResponse = serde_json::from_str(r#"{"status": 0}"#).unwrap();
        assert_eq!(parsed.status, 0);
        let parsed: LookupResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(parsed.status, 0);
    }
}
