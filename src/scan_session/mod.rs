//! ScanSession - Camera Scan Pipeline Controller
//!
//! ## Responsibilities
//!
//! - Permission gating (no pipeline starts before camera access is granted)
//! - Mutually exclusive text-mode / barcode-mode frame analysis
//! - Keep-only-latest frame backpressure with bounded buffer usage
//! - Observable scan state (single writer, watch-channel readers)
//! - Candidate item assembly once both name and expiration are resolved
//!
//! ## Concurrency model
//!
//! One background worker drains a one-deep frame slot sequentially. A frame's
//! buffer is released before its recognition result triggers any network
//! lookup, so frame N+1 is never analyzed while frame N still holds a
//! buffer. Mode switches and teardown bump a generation counter; lookup
//! completions carrying a stale generation are discarded instead of touching
//! released state.

use crate::date_extractor;
use crate::error::{Error, Result};
use crate::models::CandidateItem;
use crate::product_lookup::BarcodeResolver;
use crate::vision_client::{BarcodeDecoder, TextRecognizer};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// Active analyzer kind; only one is bound to the pipeline at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Text,
    Barcode,
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "mode", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Camera access not granted yet; no frames accepted
    AwaitingPermission,
    /// Pipeline bound with the given analyzer
    Previewing(ScanMode),
    /// Camera access refused; session-fatal
    Denied,
    /// Torn down; no background analysis continues
    Ended,
}

/// Observable scan state value object
///
/// Replaced wholesale through the single mutation point in the controller;
/// readers hold a `watch::Receiver` and always see a consistent snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanState {
    #[serde(flatten)]
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    /// Transient inline message from the last failed lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Present once both name and expiration date are resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateItem>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::AwaitingPermission,
            expiration_date: None,
            product_name: None,
            product_image: None,
            error_message: None,
            candidate: None,
        }
    }
}

impl ScanState {
    /// Re-derive the candidate from the resolved fields
    fn refresh_candidate(&mut self) {
        self.candidate = match (&self.product_name, &self.expiration_date) {
            (Some(name), Some(date)) => Some(CandidateItem {
                name: name.clone(),
                expiration_date: date.clone(),
                image_ref: self.product_image.clone(),
            }),
            _ => None,
        };
    }
}

/// A camera frame holding one pooled buffer
///
/// The buffer permit returns to the pool when the frame is dropped, on every
/// path (analysis success, analysis failure, backpressure drop).
pub struct Frame {
    data: Vec<u8>,
    _permit: OwnedSemaphorePermit,
}

impl Frame {
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Bounded pool of frame buffers
///
/// Models the camera pipeline's finite buffer supply: a frame that is never
/// released starves capture.
#[derive(Clone)]
pub struct FramePool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl FramePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wrap frame bytes in a pooled buffer; `None` when all buffers are in
    /// flight (the frame is discarded at capture)
    pub fn try_acquire(&self, data: Vec<u8>) -> Option<Frame> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        Some(Frame {
            data,
            _permit: permit,
        })
    }

    /// Buffers currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One-deep frame mailbox with keep-only-latest backpressure
///
/// A pending frame that has not been taken yet is replaced (and its buffer
/// released) when a newer frame arrives.
struct FrameSlot {
    latest: Mutex<Option<Frame>>,
    notify: Notify,
    closed: AtomicBool,
}

impl FrameSlot {
    fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Put a frame, dropping any older pending frame
    fn put(&self, frame: Frame) {
        let replaced = {
            let mut slot = self.latest.lock().expect("frame slot poisoned");
            slot.replace(frame).is_some()
        };
        if replaced {
            tracing::trace!("Pending frame dropped (keep-only-latest)");
        }
        self.notify.notify_one();
    }

    /// Wait for the next frame; `None` once the slot is closed
    async fn take(&self) -> Option<Frame> {
        loop {
            if let Some(frame) = self
                .latest
                .lock()
                .expect("frame slot poisoned")
                .take()
            {
                return Some(frame);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// Close the slot and drop any pending frame
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.latest.lock().expect("frame slot poisoned").take();
        self.notify.notify_waiters();
    }
}

/// Scan session controller
pub struct ScanSessionController {
    state_tx: watch::Sender<ScanState>,
    slot: Arc<FrameSlot>,
    pool: FramePool,
    resolver: Arc<BarcodeResolver>,
    text_recognizer: Arc<dyn TextRecognizer>,
    barcode_decoder: Arc<dyn BarcodeDecoder>,
    /// Bumped on analyzer rebind and teardown; stale completions are dropped
    generation: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ScanSessionController {
    /// Create a session in `AwaitingPermission`; no worker runs yet
    pub fn new(
        resolver: Arc<BarcodeResolver>,
        text_recognizer: Arc<dyn TextRecognizer>,
        barcode_decoder: Arc<dyn BarcodeDecoder>,
        buffer_capacity: usize,
    ) -> Self {
        let (state_tx, _) = watch::channel(ScanState::default());
        Self {
            state_tx,
            slot: Arc::new(FrameSlot::new()),
            pool: FramePool::new(buffer_capacity),
            resolver,
            text_recognizer,
            barcode_decoder,
            generation: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Subscribe to scan state updates
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> ScanState {
        self.state_tx.borrow().clone()
    }

    /// Frame buffer pool for this session
    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    /// Camera access granted: bind the pipeline and start the worker
    ///
    /// Fires once; the default analyzer is text mode. The phase check and the
    /// transition happen inside one modify closure, so concurrent grants
    /// cannot both observe `AwaitingPermission` and only the caller that
    /// performed the transition spawns the worker.
    pub fn grant_permission(&self) -> Result<()> {
        let mut outcome: Result<bool> = Ok(false);
        self.state_tx.send_if_modified(|state| match state.phase {
            SessionPhase::AwaitingPermission => {
                state.phase = SessionPhase::Previewing(ScanMode::Text);
                outcome = Ok(true);
                true
            }
            SessionPhase::Previewing(_) => false,
            SessionPhase::Denied => {
                outcome = Err(Error::PermissionDenied);
                false
            }
            SessionPhase::Ended => {
                outcome = Err(Error::Validation("scan session already ended".to_string()));
                false
            }
        });
        if !outcome? {
            return Ok(());
        }

        let state_tx = self.state_tx.clone();
        let slot = self.slot.clone();
        let resolver = self.resolver.clone();
        let text_recognizer = self.text_recognizer.clone();
        let barcode_decoder = self.barcode_decoder.clone();
        let generation = self.generation.clone();

        let handle = tokio::spawn(async move {
            Self::run_worker(
                state_tx,
                slot,
                resolver,
                text_recognizer,
                barcode_decoder,
                generation,
            )
            .await;
        });
        *self.worker.lock().expect("worker handle poisoned") = Some(handle);

        tracing::info!("Scan session previewing (text mode)");
        Ok(())
    }

    /// Camera access refused: session-fatal, no pipeline starts
    pub fn deny_permission(&self) {
        self.state_tx.send_modify(|state| {
            state.phase = SessionPhase::Denied;
            state.error_message = Some("Camera permission is required".to_string());
        });
        tracing::warn!("Scan session denied camera permission");
    }

    /// Rebind the active analyzer
    ///
    /// Late completions from the previous analyzer are invalidated.
    pub fn set_mode(&self, mode: ScanMode) -> Result<()> {
        let current = self.state_tx.borrow().phase;
        match current {
            SessionPhase::Previewing(active) if active == mode => Ok(()),
            SessionPhase::Previewing(_) => {
                self.generation.fetch_add(1, Ordering::SeqCst);
                self.state_tx.send_modify(|state| {
                    state.phase = SessionPhase::Previewing(mode);
                    state.error_message = None;
                });
                tracing::info!(mode = ?mode, "Scan analyzer rebound");
                Ok(())
            }
            SessionPhase::AwaitingPermission => Err(Error::Validation(
                "camera permission not granted yet".to_string(),
            )),
            SessionPhase::Denied => Err(Error::PermissionDenied),
            SessionPhase::Ended => {
                Err(Error::Validation("scan session already ended".to_string()))
            }
        }
    }

    /// Hand a captured frame to the pipeline
    ///
    /// Returns `Ok(false)` when the frame was discarded at capture because
    /// every buffer is in flight.
    pub fn submit_frame(&self, data: Vec<u8>) -> Result<bool> {
        match self.state_tx.borrow().phase {
            SessionPhase::Previewing(_) => {}
            SessionPhase::AwaitingPermission => {
                return Err(Error::Validation(
                    "camera permission not granted yet".to_string(),
                ))
            }
            SessionPhase::Denied => return Err(Error::PermissionDenied),
            SessionPhase::Ended => {
                return Err(Error::Validation("scan session already ended".to_string()))
            }
        }

        match self.pool.try_acquire(data) {
            Some(frame) => {
                self.slot.put(frame);
                Ok(true)
            }
            None => {
                tracing::trace!("Frame discarded at capture (no free buffers)");
                Ok(false)
            }
        }
    }

    /// Take the current candidate, if any, clearing it from the state
    pub fn take_candidate(&self) -> Option<CandidateItem> {
        let mut taken = None;
        self.state_tx.send_modify(|state| {
            taken = state.candidate.take();
            if taken.is_some() {
                state.expiration_date = None;
                state.product_name = None;
                state.product_image = None;
                state.error_message = None;
            }
        });
        taken
    }

    /// Tear the session down: unbind the pipeline and stop the worker
    ///
    /// In-flight lookups are not cancelled, but their completions carry a
    /// stale generation and are discarded.
    pub async fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_tx.send_modify(|state| {
            state.phase = SessionPhase::Ended;
        });
        self.slot.close();

        let handle = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        tracing::info!("Scan session ended");
    }

    /// Sequential frame worker: one frame at a time, buffer released before
    /// the next frame is taken
    async fn run_worker(
        state_tx: watch::Sender<ScanState>,
        slot: Arc<FrameSlot>,
        resolver: Arc<BarcodeResolver>,
        text_recognizer: Arc<dyn TextRecognizer>,
        barcode_decoder: Arc<dyn BarcodeDecoder>,
        counter: Arc<AtomicU64>,
    ) {
        while let Some(frame) = slot.take().await {
            let generation = counter.load(Ordering::SeqCst);
            let mode = match state_tx.borrow().phase {
                SessionPhase::Previewing(mode) => mode,
                _ => break,
            };

            match mode {
                ScanMode::Text => {
                    Self::process_text_frame(
                        &state_tx,
                        text_recognizer.as_ref(),
                        &counter,
                        frame,
                        generation,
                    )
                    .await
                }
                ScanMode::Barcode => {
                    Self::process_barcode_frame(
                        &state_tx,
                        barcode_decoder.as_ref(),
                        &resolver,
                        &counter,
                        frame,
                        generation,
                    )
                    .await
                }
            }
        }
        tracing::debug!("Scan worker stopped");
    }

    async fn process_text_frame(
        state_tx: &watch::Sender<ScanState>,
        text_recognizer: &dyn TextRecognizer,
        counter: &AtomicU64,
        frame: Frame,
        generation: u64,
    ) {
        let recognized = text_recognizer.recognize_text(frame.data()).await;
        // Buffer released here, before any further work on the result
        drop(frame);

        let text = match recognized {
            Ok(text) => text,
            Err(e) => {
                // Per-frame failure: logged, never surfaced, session continues
                tracing::warn!(error = %e, "Text recognition failed");
                return;
            }
        };

        let Some(date) = date_extractor::extract_date(&text) else {
            return;
        };

        if Self::is_stale(counter, generation) {
            tracing::debug!("Discarding stale text result");
            return;
        }

        state_tx.send_modify(|state| {
            state.expiration_date = Some(date.clone());
            state.error_message = None;
            state.refresh_candidate();
        });
        tracing::info!(date = %date, "Expiration date recognized");
    }

    async fn process_barcode_frame(
        state_tx: &watch::Sender<ScanState>,
        barcode_decoder: &dyn BarcodeDecoder,
        resolver: &BarcodeResolver,
        counter: &AtomicU64,
        frame: Frame,
        generation: u64,
    ) {
        let decoded = barcode_decoder.decode_barcode(frame.data()).await;
        drop(frame);

        let barcode = match decoded {
            Ok(Some(barcode)) => barcode,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Barcode decoding failed");
                return;
            }
        };

        match resolver.resolve(&barcode).await {
            Ok(product) => {
                if Self::is_stale(counter, generation) {
                    tracing::debug!(barcode = %barcode, "Discarding stale lookup result");
                    return;
                }
                state_tx.send_modify(|state| {
                    state.product_name = Some(product.name.clone());
                    state.product_image = product.image_url.clone();
                    if let Some(date) = &product.expiration_date {
                        state.expiration_date = Some(date.clone());
                    }
                    state.error_message = None;
                    state.refresh_candidate();
                });
            }
            Err(e) => {
                // Transient inline message; the scan session keeps running
                if Self::is_stale(counter, generation) {
                    return;
                }
                let message = match &e {
                    Error::LookupNetwork(_) => "Connection failed".to_string(),
                    Error::LookupNotFound(_) => "Product not found".to_string(),
                    Error::LookupParse(_) => "Parsing error".to_string(),
                    other => other.to_string(),
                };
                tracing::warn!(barcode = %barcode, error = %e, "Barcode lookup failed");
                state_tx.send_modify(|state| {
                    state.error_message = Some(message);
                });
            }
        }
    }

    fn is_stale(counter: &AtomicU64, generation: u64) -> bool {
        counter.load(Ordering::SeqCst) != generation
    }
}
