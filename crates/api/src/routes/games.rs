//! Game catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use store::{Game, GameDetail, NewGame, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Payload;

#[derive(Debug, Deserialize)]
pub struct GamesQuery {
    pub name: Option<String>,
}

/// POST /games — add a game to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Payload(req): Payload<NewGame>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game = state.inventory.create_game(req).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// GET /games?name= — list games, optionally filtered by name prefix.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<GamesQuery>,
) -> Result<Json<Vec<GameDetail>>, ApiError> {
    let games = state.inventory.list_games(query.name.as_deref()).await?;
    Ok(Json(games))
}
