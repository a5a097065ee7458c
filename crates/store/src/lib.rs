//! Storage layer for the rental service.
//!
//! Defines the record types the rest of the system works with, the
//! storage traits ([`InventoryStore`], [`CustomerStore`], [`RentalStore`]),
//! and two backends with identical observable semantics: [`PgStore`] for
//! production and [`MemoryStore`] for tests and benchmarks.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use records::{
    Category, Customer, Game, GameDetail, NewCustomer, NewGame, NewRental, Rental, RentalCustomer,
    RentalDetail, RentalGame, RentalStatus,
};
pub use store::{CustomerStore, InventoryStore, RentalFilter, RentalStore, Store};
