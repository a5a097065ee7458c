//! Category catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use store::{Category, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Payload;

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// POST /categories — register a new category.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Payload(req): Payload<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.inventory.create_category(req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories — list every category.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.inventory.list_categories().await?))
}
