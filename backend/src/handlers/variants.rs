//! HTTP handlers for catalog variant search

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::CatalogService;
use crate::AppState;
use shared::Variant;

/// Query parameters for variant search
#[derive(Debug, Deserialize)]
pub struct SearchVariantsQuery {
    pub q: String,
    pub store_id: Option<Uuid>,
    pub limit: Option<u32>,
}

/// Search catalog variants by SKU, name, or barcode
pub async fn search_variants(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SearchVariantsQuery>,
) -> AppResult<Json<Vec<Variant>>> {
    let service = CatalogService::new(state.db);
    let variants = service
        .search_variants(
            current_user.0.tenant_id,
            &query.q,
            query.store_id,
            query.limit,
        )
        .await?;
    Ok(Json(variants))
}
