//! Rental lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CustomerId, GameId, RentalId};
use serde::Deserialize;
use store::{NewRental, Rental, RentalDetail, RentalFilter, RentalStatus, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Payload;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsQuery {
    pub customer_id: Option<CustomerId>,
    pub game_id: Option<GameId>,
    pub status: Option<RentalStatus>,
}

impl RentalsQuery {
    fn into_filter(self) -> RentalFilter {
        let mut filter = RentalFilter::new();
        if let Some(id) = self.customer_id {
            filter = filter.customer(id);
        }
        if let Some(id) = self.game_id {
            filter = filter.game(id);
        }
        if let Some(status) = self.status {
            filter = filter.status(status);
        }
        filter
    }
}

/// POST /rentals — open a rental, priced at creation.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Payload(req): Payload<NewRental>,
) -> Result<(StatusCode, Json<Rental>), ApiError> {
    let rental = state.rentals.create_rental(req).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

/// GET /rentals?customerId=&gameId=&status= — list rentals with
/// customer and game details.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<RentalsQuery>,
) -> Result<Json<Vec<RentalDetail>>, ApiError> {
    let rentals = state.rentals.list_rentals(query.into_filter()).await?;
    Ok(Json(rentals))
}

/// POST /rentals/{id}/return — close an open rental, recording the fee.
#[tracing::instrument(skip(state))]
pub async fn close<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Rental>, ApiError> {
    let id = RentalId::from_uuid(super::parse_id(&id)?);
    Ok(Json(state.rentals.return_rental(id).await?))
}

/// DELETE /rentals/{id} — discard a rental that was never returned.
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = RentalId::from_uuid(super::parse_id(&id)?);
    state.rentals.delete_rental(id).await?;
    Ok(StatusCode::OK)
}
