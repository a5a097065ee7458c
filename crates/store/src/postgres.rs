use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use uuid::Uuid;

use common::{CategoryId, CustomerId, GameId, Money, RentalId};

use crate::{
    Category, Customer, Game, GameDetail, NewCustomer, NewGame, NewRental, Rental, RentalCustomer,
    RentalDetail, RentalGame, RentalStatus, Result, StoreError,
    store::{CustomerStore, InventoryStore, RentalFilter, RentalStore},
};

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and returns a store over a fresh pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
        })
    }

    fn row_to_game(row: &PgRow) -> Result<Game> {
        Ok(Game {
            id: GameId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            image: row.try_get("image")?,
            stock_total: row.try_get("stock_total")?,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            price_per_day: Money::from_cents(row.try_get("price_per_day")?),
        })
    }

    fn row_to_customer(row: &PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            cpf: row.try_get("cpf")?,
            birthday: row.try_get("birthday")?,
        })
    }

    fn row_to_rental(row: &PgRow) -> Result<Rental> {
        Ok(Rental {
            id: RentalId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            game_id: GameId::from_uuid(row.try_get::<Uuid, _>("game_id")?),
            rent_date: row.try_get("rent_date")?,
            days_rented: row.try_get("days_rented")?,
            return_date: row.try_get::<Option<NaiveDate>, _>("return_date")?,
            original_price: Money::from_cents(row.try_get("original_price")?),
            delay_fee: row
                .try_get::<Option<i64>, _>("delay_fee")?
                .map(Money::from_cents),
        })
    }

    fn row_to_rental_detail(row: &PgRow) -> Result<RentalDetail> {
        let rental = Self::row_to_rental(row)?;
        Ok(RentalDetail {
            customer: RentalCustomer {
                id: rental.customer_id,
                name: row.try_get("customer_name")?,
            },
            game: RentalGame {
                id: rental.game_id,
                name: row.try_get("game_name")?,
                category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
                category_name: row.try_get("category_name")?,
            },
            id: rental.id,
            customer_id: rental.customer_id,
            game_id: rental.game_id,
            rent_date: rental.rent_date,
            days_rented: rental.days_rented,
            return_date: rental.return_date,
            original_price: rental.original_price,
            delay_fee: rental.delay_fee,
        })
    }
}

/// Escapes LIKE metacharacters so user input always matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn insert_category(&self, name: String) -> Result<Category> {
        let category = Category {
            id: CategoryId::new(),
            name,
        };

        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("categories_name_key")
                {
                    return StoreError::Duplicate {
                        entity: "category",
                        field: "name",
                        value: category.name.clone(),
                    };
                }
                StoreError::Database(e)
            })?;

        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn insert_game(&self, new: NewGame) -> Result<Game> {
        let game = Game {
            id: GameId::new(),
            name: new.name,
            image: new.image,
            stock_total: new.stock_total,
            category_id: new.category_id,
            price_per_day: new.price_per_day,
        };

        sqlx::query(
            r#"
            INSERT INTO games (id, name, image, stock_total, category_id, price_per_day)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(game.id.as_uuid())
        .bind(&game.name)
        .bind(&game.image)
        .bind(game.stock_total)
        .bind(game.category_id.as_uuid())
        .bind(game.price_per_day.cents())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("games_name_key") => {
                        return StoreError::Duplicate {
                            entity: "game",
                            field: "name",
                            value: game.name.clone(),
                        };
                    }
                    Some("games_category_id_fkey") => {
                        return StoreError::NotFound {
                            entity: "category",
                            id: game.category_id.as_uuid(),
                        };
                    }
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        Ok(game)
    }

    async fn list_games(&self, name_prefix: Option<&str>) -> Result<Vec<GameDetail>> {
        let mut sql = String::from(
            r#"
            SELECT g.id, g.name, g.image, g.stock_total, g.category_id, g.price_per_day,
                   c.name AS category_name
            FROM games g
            JOIN categories c ON c.id = g.category_id
            "#,
        );
        if name_prefix.is_some() {
            sql.push_str(" WHERE g.name ILIKE $1");
        }
        sql.push_str(" ORDER BY g.name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(prefix) = name_prefix {
            query = query.bind(format!("{}%", escape_like(prefix)));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let game = Self::row_to_game(row)?;
                Ok(GameDetail {
                    id: game.id,
                    name: game.name,
                    image: game.image,
                    stock_total: game.stock_total,
                    category_id: game.category_id,
                    price_per_day: game.price_per_day,
                    category_name: row.try_get("category_name")?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn insert_customer(&self, new: NewCustomer) -> Result<Customer> {
        let customer = Customer {
            id: CustomerId::new(),
            name: new.name,
            phone: new.phone,
            cpf: new.cpf,
            birthday: new.birthday,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, phone, cpf, birthday)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.cpf)
        .bind(customer.birthday)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("customers_cpf_key")
            {
                return StoreError::Duplicate {
                    entity: "customer",
                    field: "cpf",
                    value: customer.cpf.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(customer)
    }

    async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, name, phone, cpf, birthday FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    async fn update_customer(&self, id: CustomerId, new: NewCustomer) -> Result<Customer> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, cpf = $4, birthday = $5
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.cpf)
        .bind(new.birthday)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("customers_cpf_key")
            {
                return StoreError::Duplicate {
                    entity: "customer",
                    field: "cpf",
                    value: new.cpf.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: id.as_uuid(),
            });
        }

        Ok(Customer {
            id,
            name: new.name,
            phone: new.phone,
            cpf: new.cpf,
            birthday: new.birthday,
        })
    }

    async fn list_customers(&self, cpf_prefix: Option<&str>) -> Result<Vec<Customer>> {
        let mut sql = String::from("SELECT id, name, phone, cpf, birthday FROM customers");
        if cpf_prefix.is_some() {
            sql.push_str(" WHERE cpf ILIKE $1");
        }
        sql.push_str(" ORDER BY name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(prefix) = cpf_prefix {
            query = query.bind(format!("{}%", escape_like(prefix)));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_customer).collect()
    }
}

#[async_trait]
impl RentalStore for PgStore {
    async fn open_rental(&self, new: NewRental, rent_date: NaiveDate) -> Result<Rental> {
        // Row lock on the game serializes concurrent openings, so the
        // availability count below cannot go stale before the insert.
        let mut tx = self.pool.begin().await?;

        let game_row = sqlx::query(
            "SELECT stock_total, price_per_day FROM games WHERE id = $1 FOR UPDATE",
        )
        .bind(new.game_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(game_row) = game_row else {
            return Err(StoreError::NotFound {
                entity: "game",
                id: new.game_id.as_uuid(),
            });
        };

        let customer_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
                .bind(new.customer_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if !customer_exists {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: new.customer_id.as_uuid(),
            });
        }

        let open: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rentals WHERE game_id = $1 AND return_date IS NULL",
        )
        .bind(new.game_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let stock_total: i32 = game_row.try_get("stock_total")?;
        if open >= i64::from(stock_total) {
            return Err(StoreError::OutOfStock(new.game_id));
        }

        let price_per_day = Money::from_cents(game_row.try_get("price_per_day")?);
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

        sqlx::query(
            r#"
            INSERT INTO rentals
                (id, customer_id, game_id, rent_date, days_rented, return_date, original_price, delay_fee)
            VALUES ($1, $2, $3, $4, $5, NULL, $6, NULL)
            "#,
        )
        .bind(rental.id.as_uuid())
        .bind(rental.customer_id.as_uuid())
        .bind(rental.game_id.as_uuid())
        .bind(rental.rent_date)
        .bind(rental.days_rented)
        .bind(rental.original_price.cents())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rental)
    }

    async fn list_rentals(&self, filter: &RentalFilter) -> Result<Vec<RentalDetail>> {
        let mut sql = String::from(
            r#"
            SELECT r.id, r.customer_id, r.game_id, r.rent_date, r.days_rented,
                   r.return_date, r.original_price, r.delay_fee,
                   c.name AS customer_name,
                   g.name AS game_name, g.category_id,
                   cat.name AS category_name
            FROM rentals r
            JOIN customers c ON c.id = r.customer_id
            JOIN games g ON g.id = r.game_id
            JOIN categories cat ON cat.id = g.category_id
            WHERE 1=1
            "#,
        );
        let mut param_count = 0;

        // Build dynamic query
        if filter.customer_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND r.customer_id = ${param_count}"));
        }
        if filter.game_id.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND r.game_id = ${param_count}"));
        }
        match filter.status {
            Some(RentalStatus::Open) => sql.push_str(" AND r.return_date IS NULL"),
            Some(RentalStatus::Closed) => sql.push_str(" AND r.return_date IS NOT NULL"),
            None => {}
        }

        sql.push_str(" ORDER BY r.rent_date ASC, r.id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id.as_uuid());
        }
        if let Some(game_id) = filter.game_id {
            query = query.bind(game_id.as_uuid());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_rental_detail).collect()
    }

    async fn close_rental(&self, id: RentalId, returned_on: NaiveDate) -> Result<Rental> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            SELECT r.id, r.customer_id, r.game_id, r.rent_date, r.days_rented,
                   r.return_date, r.original_price, r.delay_fee,
                   g.price_per_day
            FROM rentals r
            JOIN games g ON g.id = r.game_id
            WHERE r.id = $1
            FOR UPDATE OF r
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound {
                entity: "rental",
                id: id.as_uuid(),
            });
        };

        let mut rental = Self::row_to_rental(&row)?;
        if rental.return_date.is_some() {
            return Err(StoreError::AlreadyReturned(id));
        }

        let price_per_day = Money::from_cents(row.try_get("price_per_day")?);
        let fee = rental.delay_fee_for(returned_on, price_per_day);

        sqlx::query("UPDATE rentals SET return_date = $2, delay_fee = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(returned_on)
            .bind(fee.cents())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        rental.return_date = Some(returned_on);
        rental.delay_fee = Some(fee);
        Ok(rental)
    }

    async fn delete_open_rental(&self, id: RentalId) -> Result<()> {
        let result = sqlx::query("DELETE FROM rentals WHERE id = $1 AND return_date IS NULL")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing matched the guard: either the rental is closed or gone.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM rentals WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Err(StoreError::AlreadyReturned(id))
        } else {
            Err(StoreError::NotFound {
                entity: "rental",
                id: id.as_uuid(),
            })
        }
    }
}
