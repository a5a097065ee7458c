//! Types shared by every layer of the rental service.

pub mod types;

pub use types::{CategoryId, CustomerId, GameId, Money, RentalId};
