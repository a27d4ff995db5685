//! Application state
//!
//! Holds all shared components and state

use crate::expiry_stats_client::ExpiryStatsClient;
use crate::fridge_store::FridgeStore;
use crate::product_lookup::{BarcodeResolver, ProductDbClient};
use crate::recipe_client::RecipeClient;
use crate::scan_session::ScanSessionController;
use crate::vision_client::VisionClient;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Frame buffers available to one scan session
pub const SCAN_BUFFER_CAPACITY: usize = 4;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Product database URL (barcode lookup)
    pub product_db_url: String,
    /// Vision service URL (text recognition / barcode decoding)
    pub vision_url: String,
    /// Recipe service URL
    pub recipe_url: String,
    /// Recipe service API key
    pub recipe_api_key: String,
    /// Aggregate expiration service URL
    pub expiry_stats_url: String,
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            product_db_url: std::env::var("PRODUCT_DB_URL")
                .unwrap_or_else(|_| "https://world.openfoodfacts.org".to_string()),
            vision_url: std::env::var("VISION_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            recipe_url: std::env::var("RECIPE_URL")
                .unwrap_or_else(|_| "https://api.spoonacular.com".to_string()),
            recipe_api_key: std::env::var("RECIPE_API_KEY").unwrap_or_default(),
            expiry_stats_url: std::env::var("EXPIRY_STATS_URL")
                .unwrap_or_else(|_| "https://martinaa9.pythonanywhere.com".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Tracked item collection
    pub store: Arc<FridgeStore>,
    /// Barcode resolver with session cache
    pub resolver: Arc<BarcodeResolver>,
    /// Vision service adapter (text + barcode recognition)
    pub vision: Arc<VisionClient>,
    /// Recipe service adapter
    pub recipes: Arc<RecipeClient>,
    /// Aggregate expiration service adapter
    pub expiry_stats: Arc<ExpiryStatsClient>,
    /// The active scan session, one per screen visit
    pub scan: Arc<RwLock<Option<Arc<ScanSessionController>>>>,
    /// Process start, for the health endpoint
    pub started_at: Instant,
}

impl AppState {
    /// Build all components from configuration
    pub fn new(config: AppConfig) -> Self {
        let product_db = Arc::new(ProductDbClient::new(config.product_db_url.clone()));
        let resolver = Arc::new(BarcodeResolver::new(product_db));
        let vision = Arc::new(VisionClient::new(config.vision_url.clone()));
        let recipes = Arc::new(RecipeClient::new(
            config.recipe_url.clone(),
            config.recipe_api_key.clone(),
        ));
        let expiry_stats = Arc::new(ExpiryStatsClient::new(config.expiry_stats_url.clone()));

        Self {
            config,
            store: Arc::new(FridgeStore::new()),
            resolver,
            vision,
            recipes,
            expiry_stats,
            scan: Arc::new(RwLock::new(None)),
            started_at: Instant::now(),
        }
    }
}
