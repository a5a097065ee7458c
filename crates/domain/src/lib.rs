//! Business rules for the rental service.
//!
//! This crate provides:
//! - field validation for request payloads
//! - a [`Clock`] abstraction so date-dependent rules are testable
//! - the application services ([`InventoryService`], [`CustomerService`],
//!   [`RentalService`]) that drive the storage layer
//! - the [`DomainError`] taxonomy the API layer maps to status codes

pub mod clock;
pub mod customers;
pub mod error;
pub mod inventory;
pub mod rentals;
pub mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use customers::CustomerService;
pub use error::DomainError;
pub use inventory::InventoryService;
pub use rentals::RentalService;
pub use validate::ValidationError;
