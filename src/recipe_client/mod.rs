//! RecipeClient - Remote Recipe Suggestion Adapter
//!
//! ## Responsibilities
//!
//! - Search recipes by query against the remote recipe API
//! - Fetch full recipe detail (ingredients, instructions) by id
//!
//! Both endpoints require the API key as a query parameter.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of search results, matching the mobile client
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;

/// Recipe list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub image: String,
}

/// Search response envelope
#[derive(Debug, Deserialize)]
struct RecipeSearchResponse {
    results: Vec<Recipe>,
}

/// One ingredient line of a recipe detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    /// Free-text ingredient line as printed in the recipe
    pub original: String,
}

/// Full recipe detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub image: String,
    #[serde(rename = "extendedIngredients", default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: String,
}

/// HTTP client for the recipe service
pub struct RecipeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RecipeClient {
    /// Create new recipe client
    pub fn new(base_url: String, api_key: String) -> Self {
        Self::with_timeout(base_url, api_key, Duration::from_secs(10))
    }

    /// Create new recipe client with custom timeout
    pub fn with_timeout(base_url: String, api_key: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Search recipes by query
    pub async fn search(&self, query: &str, number: u32) -> Result<Vec<Recipe>> {
        let url = format!("{}/recipes/complexSearch", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("number", &number.to_string()),
                ("apiKey", &self.api_key),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Api(format!(
                "recipe search failed: {}",
                resp.status()
            )));
        }

        let body: RecipeSearchResponse = resp.json().await?;
        tracing::debug!(query = %query, count = body.results.len(), "Recipe search done");
        Ok(body.results)
    }

    /// Fetch recipe detail by id
    pub async fn detail(&self, id: i64) -> Result<RecipeDetail> {
        let url = format!("{}/recipes/{}/information", self.base_url, id);

        let resp = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::Api(format!(
                "recipe detail failed: {}",
                resp.status()
            )));
        }

        let detail: RecipeDetail = resp.json().await?;
        Ok(detail)
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
