//! API Routes

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Error;
use crate::fridge_store::{CreateItemRequest, UpdateItemRequest};
use crate::models::ApiResponse;
use crate::recipe_client::DEFAULT_SEARCH_LIMIT;
use crate::scan_session::{ScanMode, ScanSessionController};
use crate::state::{AppState, SCAN_BUFFER_CAPACITY};

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Items
        .route("/api/items", get(list_items))
        .route("/api/items", post(create_item))
        .route("/api/items/expiring", get(list_expiring_items))
        .route("/api/items/stats/average", get(average_expiry))
        .route("/api/items/stats/imminent", get(imminent_expiry))
        .route("/api/items/:id", get(get_item))
        .route("/api/items/:id", put(update_item))
        .route("/api/items/:id", delete(delete_item))
        // Recipes
        .route("/api/recipes", get(search_recipes))
        .route("/api/recipes/:id", get(recipe_detail))
        // Scan session
        .route("/api/scan/session", post(start_scan_session))
        .route("/api/scan/session", delete(end_scan_session))
        .route("/api/scan/session/permission", post(set_permission))
        .route("/api/scan/session/mode", put(set_scan_mode))
        .route("/api/scan/session/frames", post(submit_frame))
        .route("/api/scan/session/state", get(scan_state))
        .route("/api/scan/session/candidate/accept", post(accept_candidate))
        .with_state(state)
}

// ========================================
// Item Handlers
// ========================================

#[derive(Debug, Deserialize)]
struct ListItemsQuery {
    #[serde(default)]
    query: Option<String>,
}

async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<ListItemsQuery>,
) -> impl IntoResponse {
    let today = Utc::now().date_naive();
    let items = match params.query.as_deref() {
        Some(query) if !query.trim().is_empty() => state.store.search(query, today).await,
        _ => state.store.list(today).await,
    };
    Json(ApiResponse::success(items))
}

async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> impl IntoResponse {
    match state.store.add(req).await {
        Ok(item) => (StatusCode::CREATED, Json(ApiResponse::success(item))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.store.get(id).await {
        Some(item) => Json(ApiResponse::success(item)).into_response(),
        None => Error::NotFound(format!("item {}", id)).into_response(),
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    match state.store.update(id, req).await {
        Ok(item) => Json(ApiResponse::success(item)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    match state.store.delete(id).await {
        Ok(_) => Json(json!({"ok": true})).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_expiring_items(State(state): State<AppState>) -> impl IntoResponse {
    let today = Utc::now().date_naive();
    Json(ApiResponse::success(state.store.expiring_soon(today).await))
}

async fn average_expiry(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.store.snapshot().await;
    match state.expiry_stats.average_days(&items).await {
        Ok(average) => Json(ApiResponse::success(json!({ "average_days": average }))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn imminent_expiry(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.store.snapshot().await;
    match state.expiry_stats.imminent_items(&items).await {
        Ok(imminent) => Json(ApiResponse::success(imminent)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ========================================
// Recipe Handlers
// ========================================

#[derive(Debug, Deserialize)]
struct RecipeSearchQuery {
    query: String,
    #[serde(default)]
    number: Option<u32>,
}

async fn search_recipes(
    State(state): State<AppState>,
    Query(params): Query<RecipeSearchQuery>,
) -> impl IntoResponse {
    let number = params.number.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match state.recipes.search(&params.query, number).await {
        Ok(recipes) => Json(ApiResponse::success(recipes)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn recipe_detail(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.recipes.detail(id).await {
        Ok(detail) => Json(ApiResponse::success(detail)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ========================================
// Scan Session Handlers
// ========================================

async fn active_session(state: &AppState) -> Result<Arc<ScanSessionController>, Error> {
    state
        .scan
        .read()
        .await
        .clone()
        .ok_or_else(|| Error::NotFound("no active scan session".to_string()))
}

/// Start a scan session, replacing any previous one
///
/// The barcode cache is cleared so cached resolutions never outlive the
/// session that produced them.
async fn start_scan_session(State(state): State<AppState>) -> impl IntoResponse {
    let mut slot = state.scan.write().await;
    if let Some(previous) = slot.take() {
        previous.shutdown().await;
    }
    state.resolver.clear_cache().await;

    let session = Arc::new(ScanSessionController::new(
        state.resolver.clone(),
        state.vision.clone(),
        state.vision.clone(),
        SCAN_BUFFER_CAPACITY,
    ));
    let snapshot = session.state();
    *slot = Some(session);

    (StatusCode::CREATED, Json(ApiResponse::success(snapshot)))
}

async fn end_scan_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.scan.write().await.take();
    match session {
        Some(session) => {
            session.shutdown().await;
            Json(json!({"ok": true})).into_response()
        }
        None => Error::NotFound("no active scan session".to_string()).into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct PermissionRequest {
    granted: bool,
}

async fn set_permission(
    State(state): State<AppState>,
    Json(req): Json<PermissionRequest>,
) -> impl IntoResponse {
    let session = match active_session(&state).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    if req.granted {
        if let Err(e) = session.grant_permission() {
            return e.into_response();
        }
    } else {
        session.deny_permission();
    }
    Json(ApiResponse::success(session.state())).into_response()
}

#[derive(Debug, Deserialize)]
struct ModeRequest {
    mode: ScanMode,
}

async fn set_scan_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> impl IntoResponse {
    let session = match active_session(&state).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    match session.set_mode(req.mode) {
        Ok(()) => Json(ApiResponse::success(session.state())).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn submit_frame(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    if body.is_empty() {
        return Error::Validation("empty frame body".to_string()).into_response();
    }
    let session = match active_session(&state).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    match session.submit_frame(body.to_vec()) {
        Ok(accepted) => Json(ApiResponse::success(json!({ "accepted": accepted }))).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn scan_state(State(state): State<AppState>) -> impl IntoResponse {
    match active_session(&state).await {
        Ok(session) => Json(ApiResponse::success(session.state())).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Commit the resolved candidate into the tracked collection
async fn accept_candidate(State(state): State<AppState>) -> impl IntoResponse {
    let session = match active_session(&state).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };
    match session.take_candidate() {
        Some(candidate) => {
            let item = state.store.insert(candidate.into_food_item()).await;
            (StatusCode::CREATED, Json(ApiResponse::success(item))).into_response()
        }
        None => Error::Validation("no candidate resolved yet".to_string()).into_response(),
    }
}
