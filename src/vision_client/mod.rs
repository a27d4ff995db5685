//! VisionClient - Remote Text/Barcode Recognition Adapter
//!
//! ## Responsibilities
//!
//! - Upload camera frames to the external vision service
//! - Expose text recognition and barcode decoding behind trait seams so the
//!   scan session can be driven by mocks in tests
//!
//! Recognition is an external collaborator of the scan pipeline; this module
//! only adapts the wire protocol and maps failures into the per-frame
//! `Recognition` error.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// Recognizes free-form text in a frame
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize_text(&self, frame: &[u8]) -> Result<String>;
}

/// Decodes a barcode from a frame, if one is visible
#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    async fn decode_barcode(&self, frame: &[u8]) -> Result<Option<String>>;
}

/// Text recognition response
#[derive(Debug, Deserialize)]
struct RecognizeTextResponse {
    text: String,
}

/// Barcode decode response (`barcode` absent when nothing was readable)
#[derive(Debug, Deserialize)]
struct DecodeBarcodeResponse {
    #[serde(default)]
    barcode: Option<String>,
}

/// HTTP adapter for the vision service
pub struct VisionClient {
    client: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    /// Create new vision client
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    /// Create new vision client with custom timeout
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

    async fn post_frame(&self, endpoint: &str, frame: &[u8]) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, endpoint);

        let form = Form::new().part(
            "frame",
            Part::bytes(frame.to_vec())
                .file_name("frame.jpg")
                .mime_str("image/jpeg")
                .map_err(|e| Error::Recognition(e.to_string()))?,
        );

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Recognition(format!(
                "vision service returned {}",
                resp.status()
            )));
        }

        Ok(resp)
    }
}

#[async_trait]
impl TextRecognizer for VisionClient {
    async fn recognize_text(&self, frame: &[u8]) -> Result<String> {
        let resp = self.post_frame("/v1/recognize-text", frame).await?;
        let body: RecognizeTextResponse = resp
            .json()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;
        Ok(body.text)
    }
}

#[async_trait]
impl BarcodeDecoder for VisionClient {
    async fn decode_barcode(&self, frame: &[u8]) -> Result<Option<String>> {
        let resp = self.post_frame("/v1/decode-barcode", frame).await?;
        let body: DecodeBarcodeResponse = resp
            .json()
            .await
            .map_err(|e| Error::Recognition(e.to_string()))?;
        Ok(body.barcode.filter(|b| !b.is_empty()))
    }
}
