use thiserror::Error;
use uuid::Uuid;

use common::{GameId, RentalId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record referenced by id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A uniqueness rule was violated.
    #[error("{entity} with {field} {value:?} already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Every copy of the game is currently rented out.
    #[error("no copies of game {0} are available")]
    OutOfStock(GameId),

    /// The rental has already been returned.
    #[error("rental {0} is already closed")]
    AlreadyReturned(RentalId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
