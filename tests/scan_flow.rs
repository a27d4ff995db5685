//! End-to-end scan pipeline tests: frames in, tracked items out.

use async_trait::async_trait;
use fridgescan::error::{Error, Result};
use fridgescan::fridge_store::FridgeStore;
use fridgescan::models::UrgencyClass;
use fridgescan::product_lookup::{BarcodeResolver, ProductInfo, ProductSource};
use fridgescan::scan_session::{ScanMode, ScanSessionController, SessionPhase};
use fridgescan::vision_client::{BarcodeDecoder, TextRecognizer};
use fridgescan::{date_extractor, expiration};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Product source serving a fixed table and counting outbound calls
struct CountingSource {
    calls: AtomicUsize,
    table: HashMap<String, ProductInfo>,
}

impl CountingSource {
    fn with_milk() -> Arc<Self> {
        let mut table = HashMap::new();
        table.insert(
            "0001".to_string(),
            ProductInfo {
                name: "Milk".to_string(),
                expiration_date: Some("10/05/2025".to_string()),
                image_url: Some("https://img.example/milk.jpg".to_string()),
            },
        );
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            table,
        })
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

/// Recognizer returning a fixed text block, as if from a product label
struct LabelText(&'static str);

#[async_trait]
impl TextRecognizer for LabelText {
    async fn recognize_text(&self, _frame: &[u8]) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Decoder returning a fixed barcode for every frame
struct FixedBarcode(&'static str);

#[async_trait]
impl BarcodeDecoder for FixedBarcode {
    async fn decode_barcode(&self, _frame: &[u8]) -> Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }
}

async fn wait_for_candidate(
    rx: &mut watch::Receiver<fridgescan::scan_session::ScanState>,
) -> fridgescan::scan_session::ScanState {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if rx.borrow().candidate.is_some() {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("scan state sender dropped");
        }
    })
    .await
    .expect("no candidate resolved in time")
}

#[tokio::test]
async fn test_barcode_scan_to_tracked_item() {
    let source = CountingSource::with_milk();
    let resolver = Arc::new(BarcodeResolver::new(source.clone()));
    let store = FridgeStore::new();

    let session = Arc::new(ScanSessionController::new(
        resolver.clone(),
        Arc::new(LabelText("")),
        Arc::new(FixedBarcode("0001")),
        4,
    ));

    session.grant_permission().unwrap();
    session.set_mode(ScanMode::Barcode).unwrap();

    let mut rx = session.subscribe();
    assert!(session.submit_frame(vec![0u8; 64]).unwrap());

    let state = wait_for_candidate(&mut rx).await;
    let candidate = state.candidate.clone().unwrap();
    assert_eq!(candidate.name, "Milk");
    assert_eq!(candidate.expiration_date, "10/05/2025");

    // A second detection of the same barcode resolves from the cache
    assert!(session.submit_frame(vec![1u8; 64]).unwrap());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(source.calls(), 1, "repeat detection must not hit the network");

    // Accept the candidate into the tracked collection
    let accepted = session.take_candidate().unwrap();
    let item = store.insert(accepted.into_food_item()).await;
    assert_eq!(store.len().await, 1);

    // The stored item classifies like any manually added one
    let today = chrono::NaiveDate::from_ymd_opt(2025, 5, 9).unwrap();
    assert_eq!(
        expiration::classify(&item.expiration_date, today),
        UrgencyClass::Critical
    );

    session.shutdown().await;
}

#[tokio::test]
async fn test_text_scan_extracts_label_date() {
    let resolver = Arc::new(BarcodeResolver::new(CountingSource::with_milk()));
    let session = Arc::new(ScanSessionController::new(
        resolver,
        Arc::new(LabelText("Best before 05-06-2025 Lot 22")),
        Arc::new(FixedBarcode("0001")),
        4,
    ));

    session.grant_permission().unwrap();
    assert_eq!(
        session.state().phase,
        SessionPhase::Previewing(ScanMode::Text)
    );

    let mut rx = session.subscribe();
    assert!(session.submit_frame(vec![0u8; 64]).unwrap());

    let state = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if rx.borrow().expiration_date.is_some() {
                return rx.borrow().clone();
            }
            rx.changed().await.expect("scan state sender dropped");
        }
    })
    .await
    .expect("no date extracted in time");

    assert_eq!(state.expiration_date.as_deref(), Some("05-06-2025"));
    // Text mode alone never produces a candidate (no product name)
    assert!(state.candidate.is_none());

    session.shutdown().await;
}

#[tokio::test]
async fn test_extractor_and_classifier_agree_on_scanned_dates() {
    // A scanned label date flows through extraction and classification
    let text = "LOTTO 22 SCAD 06/01/2025 conservare in frigo";
    let date = date_extractor::extract_date(text).unwrap();
    assert_eq!(date, "06/01/2025");

    let today = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    assert_eq!(expiration::classify(&date, today), UrgencyClass::Warning);
}

#[tokio::test]
async fn test_mode_switch_discards_stale_lookup() {
    // A lookup that completes after the analyzer was rebound must not
    // touch the state.
    struct SlowSource {
        release: Arc<tokio::sync::Notify>,
        info: ProductInfo,
    }

    #[async_trait]
    impl ProductSource for SlowSource {
        async fn fetch(&self, _barcode: &str) -> Result<ProductInfo> {
            self.release.notified().await;
            Ok(self.info.clone())
        }
    }

    let release = Arc::new(tokio::sync::Notify::new());
    let resolver = Arc::new(BarcodeResolver::new(Arc::new(SlowSource {
        release: release.clone(),
        info: ProductInfo {
            name: "Milk".to_string(),
            expiration_date: Some("10/05/2025".to_string()),
            image_url: None,
        },
    })));

    let session = Arc::new(ScanSessionController::new(
        resolver,
        Arc::new(LabelText("")),
        Arc::new(FixedBarcode("0001")),
        4,
    ));

    session.grant_permission().unwrap();
    session.set_mode(ScanMode::Barcode).unwrap();
    assert!(session.submit_frame(vec![0u8; 64]).unwrap());

    // Let the worker reach the blocked lookup, then rebind the analyzer
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.set_mode(ScanMode::Text).unwrap();

    // Complete the stale lookup
    release.notify_waiters();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = session.state();
    assert!(
        state.product_name.is_none(),
        "stale lookup completion must be discarded"
    );
    assert!(state.candidate.is_none());

    session.shutdown().await;
}
