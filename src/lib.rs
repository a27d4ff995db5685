//! FridgeScan Core Service Library
//!
//! Expiration-aware item tracking with a near-real-time camera scan
//! pipeline.
//!
//! ## Architecture (10 Components)
//!
//! 1. DateExtractor - Date pattern matching over recognized text
//! 2. ExpirationClassifier - Urgency bucketing with injectable "today"
//! 3. ProductLookup - Barcode resolution with session cache
//! 4. VisionClient - Remote text/barcode recognition adapter
//! 5. ScanSession - Camera scan pipeline controller
//! 6. FridgeStore - Tracked item collection
//! 7. RecipeClient - Remote recipe suggestion adapter
//! 8. ExpiryStatsClient - Aggregate expiration service adapter
//! 9. WebAPI - REST API endpoints
//! 10. AppState - Shared component wiring
//!
//! ## Design Principles
//!
//! - Pure classification/extraction functions, deterministic under test
//! - Single-writer observable scan state, watch-channel readers
//! - Remote services behind thin reqwest adapters with trait seams

pub mod date_extractor;
pub mod error;
pub mod expiration;
pub mod expiry_stats_client;
pub mod fridge_store;
pub mod models;
pub mod product_lookup;
pub mod recipe_client;
pub mod scan_session;
pub mod state;
pub mod vision_client;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
