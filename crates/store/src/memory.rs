use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use common::{CategoryId, CustomerId, GameId, Money, RentalId};

use crate::{
    Category, Customer, Game, GameDetail, NewCustomer, NewGame, NewRental, Rental, RentalCustomer,
    RentalDetail, RentalGame, RentalStatus, Result, StoreError,
    store::{CustomerStore, InventoryStore, RentalFilter, RentalStore},
};

/// In-memory store implementation for tests and benchmarks.
///
/// Keeps every table in a single lock so mutations observe the same
/// atomicity as the PostgreSQL transactions, and mirrors its ordering
/// and error mapping.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    categories: Vec<Category>,
    games: Vec<Game>,
    customers: Vec<Customer>,
    rentals: Vec<Rental>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every table.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.categories.clear();
        inner.games.clear();
        inner.customers.clear();
        inner.rentals.clear();
    }
}

fn matches_prefix(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn insert_category(&self, name: String) -> Result<Category> {
        let mut inner = self.inner.write().await;

        if inner.categories.iter().any(|c| c.name == name) {
            return Err(StoreError::Duplicate {
                entity: "category",
                field: "name",
                value: name,
            });
        }

        let category = Category {
            id: CategoryId::new(),
            name,
        };
        inner.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories = inner.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_game(&self, new: NewGame) -> Result<Game> {
        let mut inner = self.inner.write().await;

        if inner.games.iter().any(|g| g.name == new.name) {
            return Err(StoreError::Duplicate {
                entity: "game",
                field: "name",
                value: new.name,
            });
        }
        if !inner.categories.iter().any(|c| c.id == new.category_id) {
            return Err(StoreError::NotFound {
                entity: "category",
                id: new.category_id.as_uuid(),
            });
        }

        let game = Game {
            id: GameId::new(),
            name: new.name,
            image: new.image,
            stock_total: new.stock_total,
            category_id: new.category_id,
            price_per_day: new.price_per_day,
        };
        inner.games.push(game.clone());
        Ok(game)
    }

    async fn list_games(&self, name_prefix: Option<&str>) -> Result<Vec<GameDetail>> {
        let inner = self.inner.read().await;

        let mut games: Vec<GameDetail> = inner
            .games
            .iter()
            .filter(|g| {
                name_prefix.is_none_or(|prefix| matches_prefix(&g.name, prefix))
            })
            .filter_map(|g| {
                // The insert check guarantees the category exists.
                let category = inner.categories.iter().find(|c| c.id == g.category_id)?;
                Some(GameDetail {
                    id: g.id,
                    name: g.name.clone(),
                    image: g.image.clone(),
                    stock_total: g.stock_total,
                    category_id: g.category_id,
                    price_per_day: g.price_per_day,
                    category_name: category.name.clone(),
                })
            })
            .collect();

        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
        let mut inner = self.inner.write().await;

        if inner.customers.iter().any(|c| c.cpf == new.cpf) {
            return Err(StoreError::Duplicate {
                entity: "customer",
                field: "cpf",
                value: new.cpf,
            });
        }

        let customer = Customer {
            id: CustomerId::new(),
            name: new.name,
            phone: new.phone,
            cpf: new.cpf,
            birthday: new.birthday,
        };
        inner.customers.push(customer.clone());
        Ok(customer)
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let inner = self.inner.read().await;
        Ok(inner.customers.iter().find(|c| c.id == id).cloned())
    }

    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> Result<Customer> {
        let mut inner = self.inner.write().await;

        if inner
            .customers
            .iter()
            .any(|c| c.cpf == new.cpf && c.id != id)
        {
            return Err(StoreError::Duplicate {
                entity: "customer",
                field: "cpf",
                value: new.cpf,
            });
        }

        let Some(customer) = inner.customers.iter_mut().find(|c| c.id == id) else {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            });
        };

        customer.name = new.name;
        customer.phone = new.phone;
        customer.cpf = new.cpf;
        customer.birthday = new.birthday;
        Ok(customer.clone())
    }

    async fn list_customers(&self, cpf_prefix: Option<&str>) -> Result<Vec<Customer>> {
        let inner = self.inner.read().await;

        let mut customers: Vec<Customer> = inner
            .customers
            .iter()
            .filter(|c| cpf_prefix.is_none_or(|prefix| matches_prefix(&c.cpf, prefix)))
            .cloned()
            .collect();

        customers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(customers)
    }
}

#[async_trait]
impl RentalStore for MemoryStore {
    async fn open_rental(&self, new: NewRental, rent_date: NaiveDate) -> Result<Rental> {
        // The single write lock plays the role of the row lock in the
        // PostgreSQL backend: check and insert cannot interleave.
        let mut inner = self.inner.write().await;

        let Some((stock_total, price_per_day)) = inner
            .games
            .iter()
            .find(|g| g.id == new.game_id)
            .map(|g| (g.stock_total, g.price_per_day))
        else {
            return Err(StoreError::NotFound {
                entity: "game",
                id: new.game_id.as_uuid(),
            });
        };

        if !inner.customers.iter().any(|c| c.id == new.customer_id) {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: new.customer_id.as_uuid(),
            });
        }

        let open = inner
            .rentals
            .iter()
            .filter(|r| r.game_id == new.game_id && r.is_open())
            .count();
        if open as i64 >= i64::from(stock_total) {
            return Err(StoreError::OutOfStock(new.game_id));
        }

        let rental = Rental {
            id: RentalId::new(),
            customer_id: new.customer_id,
            game_id: new.game_id,
            rent_date,
            days_rented: new.days_rented,
            return_date: None,
            original_price: price_per_day.multiply(i64::from(new.days_rented)),
            delay_fee: None,
        };
        inner.rentals.push(rental.clone());
        Ok(rental)
    }

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<RentalDetail>> {
        let inner = self.inner.read().await;

        let mut rentals = Vec::new();
        for r in &inner.rentals {
            if let Some(customer_id) = filter.customer_id
                && r.customer_id != customer_id
            {
                continue;
            }
            if let Some(game_id) = filter.game_id
                && r.game_id != game_id
            {
                continue;
            }
            if let Some(status) = filter.status
                && r.status() != status
            {
                continue;
            }

            // Open rentals pin their customer and game in place, so the
            // joins cannot miss.
            let Some(customer) = inner.customers.iter().find(|c| c.id == r.customer_id) else {
                continue;
            };
            let Some(game) = inner.games.iter().find(|g| g.id == r.game_id) else {
                continue;
            };
            let Some(category) = inner.categories.iter().find(|c| c.id == game.category_id)
            else {
                continue;
            };

            rentals.push(RentalDetail {
                id: r.id,
                customer_id: r.customer_id,
                game_id: r.game_id,
                rent_date: r.rent_date,
                days_rented: r.days_rented,
                return_date: r.return_date,
                original_price: r.original_price,
                delay_fee: r.delay_fee,
                customer: RentalCustomer {
                    id: customer.id,
                    name: customer.name.clone(),
                },
                game: RentalGame {
                    id: game.id,
                    name: game.name.clone(),
                    category_id: game.category_id,
                    category_name: category.name.clone(),
                },
            });
        }

        rentals.sort_by(|a, b| {
            a.rent_date
                .cmp(&b.rent_date)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        Ok(rentals)
    }

    async fn close_rental(&self, id: RentalId, returned_on: NaiveDate) -> Result<Rental> {
        let mut inner = self.inner.write().await;

        let Some(index) = inner.rentals.iter().position(|r| r.id == id) else {
            return Err(StoreError::NotFound {
                entity: "rental",
                id: id.as_uuid(),
            });
        };
        if inner.rentals[index].return_date.is_some() {
            return Err(StoreError::AlreadyReturned(id));
        }

        let game_id = inner.rentals[index].game_id;
        let price_per_day: Money = inner
            .games
            .iter()
            .find(|g| g.id == game_id)
            .map(|g| g.price_per_day)
            .ok_or(StoreError::NotFound {
                entity: "game",
                id: game_id.as_uuid(),
            })?;

        let fee = inner.rentals[index].delay_fee_for(returned_on, price_per_day);
        let rental = &mut inner.rentals[index];
        rental.return_date = Some(returned_on);
        rental.delay_fee = Some(fee);
        Ok(rental.clone())
    }

    async fn delete_open_rental(&self, id: RentalId) -> Result<()> {
        let mut inner = self.inner.write().await;

        let Some(index) = inner.rentals.iter().position(|r| r.id == id) else {
            return Err(StoreError::NotFound {
                entity: "rental",
                id: id.as_uuid(),
            });
        };
        if inner.rentals[index].return_date.is_some() {
            return Err(StoreError::AlreadyReturned(id));
        }

        inner.rentals.remove(index);
        Ok(())
    }
}
