//! Shared models and types for FridgeScan
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
}

/// One tracked perishable item
///
/// Identity is the surrogate `id`, never the name. Two items may share a
/// name without merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    /// Surrogate identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Expiration date string in dd/MM/yyyy form
    pub expiration_date: String,
    /// Opaque reference to a locally or remotely stored image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl FoodItem {
    pub fn new(name: impl Into<String>, expiration_date: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            expiration_date: expiration_date.into(),
            image_ref: None,
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }
}

/// Tentatively resolved name+expiration pair produced by scanning
///
/// Not yet committed to the tracked collection. Both fields are required;
/// partial resolutions stay in the scan state until completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub name: String,
    pub expiration_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl CandidateItem {
    /// Promote the candidate into a tracked item
    pub fn into_food_item(self) -> FoodItem {
        let item = FoodItem::new(self.name, self.expiration_date);
        match self.image_ref {
            Some(image) => item.with_image(image),
            None => item,
        }
    }
}

/// Urgency bucket derived from days-until-expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyClass {
    /// 3 days or fewer remaining (including already expired)
    Critical,
    /// 4 to 7 days remaining
    Warning,
    /// More than 7 days remaining
    Normal,
    /// Expiration date could not be parsed
    Unknown,
}
