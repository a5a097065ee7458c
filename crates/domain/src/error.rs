//! Domain error taxonomy.

use thiserror::Error;
use uuid::Uuid;

use common::{GameId, RentalId};
use store::StoreError;

use crate::validate::ValidationError;

/// Errors that can occur during rental-business operations.
///
/// The same storage failure can mean different things per operation (a
/// missing customer is the caller's mistake when opening a rental, but
/// a plain not-found when fetched directly), so services map
/// [`StoreError`] themselves instead of relying on a blanket `From`.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request payload failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payload references a record that does not exist.
    #[error("{entity} does not exist: {id}")]
    InvalidReference { entity: &'static str, id: Uuid },

    /// The addressed resource does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A uniqueness rule rejected the change.
    #[error("{entity} with {field} {value:?} already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Every copy of the game is currently rented out.
    #[error("no copies of game {0} are available")]
    Unavailable(GameId),

    /// The rental was already returned.
    #[error("rental {0} is already closed")]
    AlreadyReturned(RentalId),

    /// The storage backend failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}
