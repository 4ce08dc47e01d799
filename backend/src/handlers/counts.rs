//! HTTP handlers for count session endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CountService;
use crate::AppState;
use shared::{
    CountSession, CreateSessionRequest, CreatedSession, FinalizeResponse, Page, ScanRequest,
    SessionFilter, SetQuantityRequest, StockLedgerEntry,
};

/// List count sessions with optional filters
pub async fn list_sessions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<SessionFilter>,
) -> AppResult<Json<Page<CountSession>>> {
    let service = CountService::new(state.db);
    let page = service
        .list_sessions(current_user.0.tenant_id, filter)
        .await?;
    Ok(Json(page))
}

/// Create a count session in draft for one store
pub async fn create_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSessionRequest>,
) -> AppResult<Json<CreatedSession>> {
    let service = CountService::new(state.db);
    let created = service
        .create_session(current_user.0.tenant_id, input)
        .await?;
    Ok(Json(created))
}

/// Get one count session with its full line set
pub async fn get_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<CountSession>> {
    let service = CountService::new(state.db);
    let session = service
        .get_session(current_user.0.tenant_id, session_id)
        .await?;
    Ok(Json(session))
}

/// Apply a scan to a session and return the refreshed session
pub async fn scan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<ScanRequest>,
) -> AppResult<Json<CountSession>> {
    let service = CountService::new(state.db);
    let session = service
        .scan(current_user.0.tenant_id, session_id, input)
        .await?;
    Ok(Json(session))
}

/// Overwrite one line's counted quantity
pub async fn set_quantity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
    Json(input): Json<SetQuantityRequest>,
) -> AppResult<Json<CountSession>> {
    let service = CountService::new(state.db);
    let session = service
        .set_quantity(current_user.0.tenant_id, session_id, input)
        .await?;
    Ok(Json(session))
}

/// Finalize a session, committing its deltas to the stock ledger
pub async fn finalize_session(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<FinalizeResponse>> {
    let service = CountService::new(state.db);
    let response = service
        .finalize(current_user.0.tenant_id, session_id)
        .await?;
    Ok(Json(response))
}

/// Ledger entries written by a session's finalize
pub async fn session_ledger(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(session_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockLedgerEntry>>> {
    let service = CountService::new(state.db);
    let entries = service
        .session_ledger(current_user.0.tenant_id, session_id)
        .await?;
    Ok(Json(entries))
}
