//! HTTP handlers for store reference data

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CatalogService;
use crate::AppState;
use shared::Store;

/// List the tenant's stores
pub async fn list_stores(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Store>>> {
    let service = CatalogService::new(state.db);
    let stores = service.list_stores(current_user.0.tenant_id).await?;
    Ok(Json(stores))
}
