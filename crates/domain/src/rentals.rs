//! Rental lifecycle service: open, list, return, delete.

use std::sync::Arc;

use common::RentalId;
use store::{NewRental, Rental, RentalDetail, RentalFilter, RentalStore, StoreError};

use crate::{Clock, DomainError, SystemClock, validate};

/// Service driving the rental lifecycle.
///
/// Dates come from the injected [`Clock`]: a rental opens dated today
/// and a return is judged against today, never against caller input.
pub struct RentalService<S: RentalStore> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: RentalStore> RentalService<S> {
    /// Creates a service using the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Opens a rental dated today, priced from the game's daily rate.
    #[tracing::instrument(skip(self))]
    pub async fn create_rental(&self, new: NewRental) -> Result<Rental, DomainError> {
        validate::days_rented(new.days_rented)?;

        let rental = self
            .store
            .open_rental(new, self.clock.today())
            .await
            .map_err(|e| match e {
                StoreError::NotFound { entity, id } => DomainError::InvalidReference { entity, id },
                StoreError::OutOfStock(game_id) => DomainError::Unavailable(game_id),
                other => DomainError::Store(other),
            })?;

        metrics::counter!("rentals_opened_total").increment(1);
        Ok(rental)
    }

    /// Lists rentals with customer and game details.
    #[tracing::instrument(skip(self))]
    pub async fn list_rentals(
        &self,
        filter: RentalFilter,
    ) -> Result<Vec<RentalDetail>, DomainError> {
        self.store
            .list_rentals(&filter)
            .await
            .map_err(DomainError::Store)
    }

    /// Closes an open rental as returned today, recording the delay fee.
    #[tracing::instrument(skip(self))]
    pub async fn return_rental(&self, id: RentalId) -> Result<Rental, DomainError> {
        let rental = self
            .store
            .close_rental(id, self.clock.today())
            .await
            .map_err(map_lifecycle_err)?;

        metrics::counter!("rentals_returned_total").increment(1);
        Ok(rental)
    }

    /// Deletes a rental that is still open.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rental(&self, id: RentalId) -> Result<(), DomainError> {
        self.store
            .delete_open_rental(id)
            .await
            .map_err(map_lifecycle_err)
    }
}

fn map_lifecycle_err(e: StoreError) -> DomainError {
    match e {
        StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
        StoreError::AlreadyReturned(id) => DomainError::AlreadyReturned(id),
        other => DomainError::Store(other),
    }
}
