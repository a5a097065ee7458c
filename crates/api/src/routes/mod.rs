//! Route handlers and shared application state.

pub mod categories;
pub mod customers;
pub mod games;
pub mod health;
pub mod metrics;
pub mod rentals;

use std::sync::Arc;

use domain::{Clock, CustomerService, InventoryService, RentalService};
use store::Store;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub inventory: InventoryService<S>,
    pub customers: CustomerService<S>,
    pub rentals: RentalService<S>,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires every service to the given store, dating operations with
    /// the system clock.
    pub fn new(store: S) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            customers: CustomerService::new(store.clone()),
            rentals: RentalService::new(store),
        }
    }

    /// Same wiring with an injected clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            customers: CustomerService::with_clock(store.clone(), clock.clone()),
            rentals: RentalService::with_clock(store, clock),
        }
    }
}

fn parse_id(id: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
