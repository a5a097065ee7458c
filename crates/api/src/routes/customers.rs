//! Customer registry endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CustomerId;
use serde::Deserialize;
use store::{Customer, NewCustomer, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Payload;

#[derive(Debug, Deserialize)]
pub struct CustomersQuery {
    pub cpf: Option<String>,
}

/// POST /customers — register a new customer.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Payload(req): Payload<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let customer = state.customers.create_customer(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id} — fetch one customer.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id = CustomerId::from_uuid(super::parse_id(&id)?);
    Ok(Json(state.customers.get_customer(id).await?))
}

/// PUT /customers/{id} — replace every field of one customer.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Payload(req): Payload<NewCustomer>,
) -> Result<Json<Customer>, ApiError> {
    let id = CustomerId::from_uuid(super::parse_id(&id)?);
    Ok(Json(state.customers.update_customer(id, req).await?))
}

/// GET /customers?cpf= — list customers, optionally filtered by cpf prefix.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<CustomersQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state.customers.list_customers(query.cpf.as_deref()).await?;
    Ok(Json(customers))
}
