use async_trait::async_trait;
use chrono::NaiveDate;

use common::{CustomerId, GameId, RentalId};

use crate::{
    Category, Customer, Game, GameDetail, NewCustomer, NewGame, NewRental, Rental, RentalDetail,
    RentalStatus, Result,
};

/// Filter for rental listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RentalFilter {
    /// Only rentals held by this customer.
    pub customer_id: Option<CustomerId>,

    /// Only rentals of this game.
    pub game_id: Option<GameId>,

    /// Only rentals in this lifecycle state.
    pub status: Option<RentalStatus>,
}

impl RentalFilter {
    /// Creates an empty filter matching every rental.
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrows to rentals held by a customer.
    pub fn customer(mut self, id: CustomerId) -> Self {
        self.customer_id = Some(id);
        self
    }

    /// Narrows to rentals of a game.
    pub fn game(mut self, id: GameId) -> Self {
        self.game_id = Some(id);
        self
    }

    /// Narrows to open or closed rentals.
    pub fn status(mut self, status: RentalStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Catalog storage: categories and games.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Inserts a category with a fresh id.
    ///
    /// Fails with `Duplicate` when the name is already taken.
    async fn insert_category(&self, name: String) -> Result<Category>;

    /// Lists every category, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Inserts a game with a fresh id.
    ///
    /// Fails with `NotFound` when the category does not exist and with
    /// `Duplicate` when the name is already taken.
    async fn insert_game(&self, new: NewGame) -> Result<Game>;

    /// Lists games joined with their category name, ordered by name,
    /// optionally narrowed to a case-insensitive name prefix.
    async fn list_games(&self, name_prefix: Option<&str>) -> Result<Vec<GameDetail>>;
}

/// Customer registry storage.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Inserts a customer with a fresh id.
    ///
    /// Fails with `Duplicate` when the CPF is already registered.
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer>;

    /// Fetches a single customer.
    ///
    /// Returns None if the customer doesn't exist.
    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>>;

    /// Replaces every field of an existing customer.
    ///
    /// Fails with `NotFound` when the id is unknown and with `Duplicate`
    /// when the CPF belongs to a different customer.
    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> Result<Customer>;

    /// Lists customers ordered by name, optionally narrowed to a CPF prefix.
    async fn list_customers(&self, cpf_prefix: Option<&str>) -> Result<Vec<Customer>>;
}

/// Rental ledger storage.
#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Opens a rental dated `rent_date`, pricing it from the game's
    /// daily rate.
    ///
    /// The existence checks, the stock-availability check, and the
    /// insert happen atomically: two concurrent calls can never hand
    /// out more copies than the game's `stock_total`.
    async fn open_rental(&self, new: NewRental, rent_date: NaiveDate) -> Result<Rental>;

    /// Lists rentals joined with customer and game details, ordered by
    /// rent date.
    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<RentalDetail>>;

    /// Closes an open rental on `returned_on`, recording the delay fee.
    ///
    /// Fails with `AlreadyReturned` when the rental is closed; closing
    /// is guarded so a rental can only ever be returned once.
    async fn close_rental(&self, id: RentalId, returned_on: NaiveDate) -> Result<Rental>;

    /// Deletes a rental that is still open.
    ///
    /// Fails with `AlreadyReturned` when the rental has been closed.
    async fn delete_open_rental(&self, id: RentalId) -> Result<()>;
}

/// Marker for backends implementing the full storage surface.
pub trait Store: InventoryStore + CustomerStore + RentalStore {}

// Blanket implementation for all full backends
impl<T: InventoryStore + CustomerStore + RentalStore> Store for T {}
