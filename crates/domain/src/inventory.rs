//! Catalog service: categories and games.

use store::{Category, Game, GameDetail, InventoryStore, NewGame, StoreError};

use crate::{DomainError, validate};

/// Service for managing the game catalog.
pub struct InventoryService<S: InventoryStore> {
    store: S,
}

impl<S: InventoryStore> InventoryService<S> {
    /// Creates a new inventory service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a category.
    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, name: String) -> Result<Category, DomainError> {
        validate::category_name(&name)?;
        self.store.insert_category(name).await.map_err(map_insert_err)
    }

    /// Lists every category.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.store.list_categories().await.map_err(DomainError::Store)
    }

    /// Registers a game in an existing category.
    #[tracing::instrument(skip(self))]
    pub async fn create_game(&self, new: NewGame) -> Result<Game, DomainError> {
        validate::game(&new)?;
        self.store.insert_game(new).await.map_err(map_insert_err)
    }

    /// Lists games, optionally narrowed to a name prefix.
    #[tracing::instrument(skip(self))]
    pub async fn list_games(
        &self,
        name_prefix: Option<&str>,
    ) -> Result<Vec<GameDetail>, DomainError> {
        self.store
            .list_games(name_prefix)
            .await
            .map_err(DomainError::Store)
    }
}

/// Inserts treat a dangling category reference as the caller's mistake.
fn map_insert_err(e: StoreError) -> DomainError {
    match e {
        StoreError::Duplicate {
            entity,
            field,
            value,
        } => DomainError::Conflict {
            entity,
            field,
            value,
        },
        StoreError::NotFound { entity, id } => DomainError::InvalidReference { entity, id },
        other => DomainError::Store(other),
    }
}
