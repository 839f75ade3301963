//! Catalog handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::catalog::{CatalogFilter, PaginatedResponse};
use crate::error::Result;
use crate::models::Product;
use crate::state::AppState;

pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> Result<Json<PaginatedResponse<Product>>> {
    Ok(Json(crate::catalog::list_products(&state.db, &filter).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>> {
    Ok(Json(crate::catalog::get_product(&state.db, id).await?))
}
