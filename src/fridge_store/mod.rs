//! FridgeStore - Tracked Item Collection
//!
//! ## Responsibilities
//!
//! - Hold the session's tracked perishables in memory
//! - Surrogate-id CRUD (names may collide without merging)
//! - Name search and expiring-soon filtering for the list surfaces
//!
//! There is no persistence; the collection lives and dies with the process.

use crate::error::{Error, Result};
use crate::expiration;
use crate::models::{FoodItem, UrgencyClass};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Request to add an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub expiration_date: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Request to edit an item from the detail view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Item decorated with its urgency class for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedItem {
    #[serde(flatten)]
    pub item: FoodItem,
    pub urgency: UrgencyClass,
    /// Whole days remaining; absent when the date is unparseable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_left: Option<i64>,
}

/// In-memory tracked item store
pub struct FridgeStore {
    items: RwLock<HashMap<Uuid, FoodItem>>,
}

impl FridgeStore {
    /// Create empty store
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Add a new item
    pub async fn add(&self, req: CreateItemRequest) -> Result<FoodItem> {
        if req.name.trim().is_empty() {
            return Err(Error::Validation("item name must not be empty".to_string()));
        }
        if req.expiration_date.trim().is_empty() {
            return Err(Error::Validation(
                "expiration date must not be empty".to_string(),
            ));
        }

        let mut item = FoodItem::new(req.name.trim(), req.expiration_date.trim());
        item.image_ref = req.image_ref;

        let mut items = self.items.write().await;
        items.insert(item.id, item.clone());

        tracing::info!(
            item_id = %item.id,
            name = %item.name,
            expiration = %item.expiration_date,
            "Item added"
        );
        Ok(item)
    }

    /// Insert an already-built item (scan candidate acceptance)
    pub async fn insert(&self, item: FoodItem) -> FoodItem {
        let mut items = self.items.write().await;
        items.insert(item.id, item.clone());
        tracing::info!(item_id = %item.id, name = %item.name, "Item inserted");
        item
    }

    /// Get one item
    pub async fn get(&self, id: Uuid) -> Option<FoodItem> {
        self.items.read().await.get(&id).cloned()
    }

    /// Edit an item from the detail view
    pub async fn update(&self, id: Uuid, req: UpdateItemRequest) -> Result<FoodItem> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))?;

        if let Some(name) = req.name {
            if name.trim().is_empty() {
                return Err(Error::Validation("item name must not be empty".to_string()));
            }
            item.name = name.trim().to_string();
        }
        if let Some(expiration_date) = req.expiration_date {
            if expiration_date.trim().is_empty() {
                return Err(Error::Validation(
                    "expiration date must not be empty".to_string(),
                ));
            }
            item.expiration_date = expiration_date.trim().to_string();
        }
        if let Some(image_ref) = req.image_ref {
            item.image_ref = Some(image_ref);
        }

        tracing::info!(item_id = %id, "Item updated");
        Ok(item.clone())
    }

    /// Remove an item (swipe-to-delete)
    pub async fn delete(&self, id: Uuid) -> Result<FoodItem> {
        let mut items = self.items.write().await;
        let removed = items
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("item {}", id)))?;
        tracing::info!(item_id = %id, name = %removed.name, "Item deleted");
        Ok(removed)
    }

    /// All items, classified against `today`, name-sorted for stable display
    pub async fn list(&self, today: NaiveDate) -> Vec<ClassifiedItem> {
        let items = self.items.read().await;
        let mut classified: Vec<ClassifiedItem> =
            items.values().map(|item| decorate(item, today)).collect();
        classified.sort_by(|a, b| a.item.name.cmp(&b.item.name).then(a.item.id.cmp(&b.item.id)));
        classified
    }

    /// Case-insensitive name search
    pub async fn search(&self, query: &str, today: NaiveDate) -> Vec<ClassifiedItem> {
        let needle = query.to_lowercase();
        self.list(today)
            .await
            .into_iter()
            .filter(|c| c.item.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Items within the expiring-soon window (0 to 3 days left)
    pub async fn expiring_soon(&self, today: NaiveDate) -> Vec<ClassifiedItem> {
        self.list(today)
            .await
            .into_iter()
            .filter(|c| expiration::is_expiring_soon(&c.item.expiration_date, today))
            .collect()
    }

    /// Plain snapshot of all items (aggregate payload building)
    pub async fn snapshot(&self) -> Vec<FoodItem> {
        self.items.read().await.values().cloned().collect()
    }

    /// Number of tracked items
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl Default for FridgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn decorate(item: &FoodItem, today: NaiveDate) -> ClassifiedItem {
    let urgency = expiration::classify(&item.expiration_date, today);
    let days_left = expiration::parse_expiration(&item.expiration_date)
        .map(|date| expiration::days_until(date, today));
    ClassifiedItem {
        item: item.clone(),
        urgency,
        days_left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_add_get_delete_roundtrip() {
        let store = FridgeStore::new();
        let item = store
            .add(CreateItemRequest {
                name: "Milk".to_string(),
                expiration_date: "02/01/2025".to_string(),
                image_ref: None,
            })
            .await
            .unwrap();

        assert_eq!(store.get(item.id).await.unwrap().name, "Milk");

        store.delete(item.id).await.unwrap();
        assert!(store.get(item.id).await.is_none());
        assert!(matches!(
            store.delete(item.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_blank_fields() {
        let store = FridgeStore::new();
        assert!(matches!(
            store
                .add(CreateItemRequest {
                    name: "  ".to_string(),
                    expiration_date: "02/01/2025".to_string(),
                    image_ref: None,
                })
                .await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_same_name_items_do_not_merge() {
        let store = FridgeStore::new();
        for _ in 0..2 {
            store
                .add(CreateItemRequest {
                    name: "Yogurt".to_string(),
                    expiration_date: "05/01/2025".to_string(),
                    image_ref: None,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_update_edits_fields() {
        let store = FridgeStore::new();
        let item = store
            .add(CreateItemRequest {
                name: "Cheese".to_string(),
                expiration_date: "02/01/2025".to_string(),
                image_ref: None,
            })
            .await
            .unwrap();

        let updated = store
            .update(
                item.id,
                UpdateItemRequest {
                    expiration_date: Some("09/01/2025".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.expiration_date, "09/01/2025");
        assert_eq!(updated.name, "Cheese");
    }

    #[tokio::test]
    async fn test_list_classifies_items() {
        let store = FridgeStore::new();
        store
            .add(CreateItemRequest {
                name: "Critical".to_string(),
                expiration_date: "02/01/2025".to_string(),
                image_ref: None,
            })
            .await
            .unwrap();
        store
            .add(CreateItemRequest {
                name: "Mystery".to_string(),
                expiration_date: "sometime".to_string(),
                image_ref: None,
            })
            .await
            .unwrap();

        let listed = store.list(today()).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].item.name, "Critical");
        assert_eq!(listed[0].urgency, UrgencyClass::Critical);
        assert_eq!(listed[0].days_left, Some(1));
        assert_eq!(listed[1].urgency, UrgencyClass::Unknown);
        assert_eq!(listed[1].days_left, None);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = FridgeStore::new();
        store
            .add(CreateItemRequest {
                name: "Parmigiano".to_string(),
                expiration_date: "01/03/2025".to_string(),
                image_ref: None,
            })
            .await
            .unwrap();

        assert_eq!(store.search("parmi", today()).await.len(), 1);
        assert_eq!(store.search("basil", today()).await.len(), 0);
    }

    #[tokio::test]
    async fn test_expiring_soon_excludes_expired_and_far() {
        let store = FridgeStore::new();
        for (name, date) in [
            ("InWindow", "03/01/2025"),
            ("Expired", "30/12/2024"),
            ("Far", "01/03/2025"),
        ] {
            store
                .add(CreateItemRequest {
                    name: name.to_string(),
                    expiration_date: date.to_string(),
                    image_ref: None,
                })
                .await
                .unwrap();
        }

        let soon = store.expiring_soon(today()).await;
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].item.name, "InWindow");
    }
}
