//! Record types shared by the storage backends and the HTTP surface.
//!
//! These structs serialize straight to the wire shape (camelCase keys,
//! bare-integer cents, `YYYY-MM-DD` dates), so the API layer does not
//! maintain a parallel set of DTOs.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use common::{CategoryId, CustomerId, GameId, Money, RentalId};

/// A game category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A game title in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub image: String,
    pub stock_total: i32,
    pub category_id: CategoryId,
    pub price_per_day: Money,
}

/// A game joined with its category name for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    pub id: GameId,
    pub name: String,
    pub image: String,
    pub stock_total: i32,
    pub category_id: CategoryId,
    pub price_per_day: Money,
    pub category_name: String,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub phone: String,
    pub cpf: String,
    pub birthday: NaiveDate,
}

/// Payload for creating a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGame {
    pub name: String,
    pub image: String,
    pub stock_total: i32,
    pub category_id: CategoryId,
    pub price_per_day: Money,
}

/// Payload for creating or replacing a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub cpf: String,
    pub birthday: NaiveDate,
}

/// Payload for opening a rental.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRental {
    pub customer_id: CustomerId,
    pub game_id: GameId,
    pub days_rented: i32,
}

/// Whether a rental is still out or has been returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Open,
    Closed,
}

/// A rental row.
///
/// `original_price` is locked in when the rental opens; `return_date`
/// and `delay_fee` stay `None` until the game comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: RentalId,
    pub customer_id: CustomerId,
    pub game_id: GameId,
    pub rent_date: NaiveDate,
    pub days_rented: i32,
    pub return_date: Option<NaiveDate>,
    pub original_price: Money,
    pub delay_fee: Option<Money>,
}

impl Rental {
    /// Returns true while the game is still out.
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn status(&self) -> RentalStatus {
        if self.is_open() {
            RentalStatus::Open
        } else {
            RentalStatus::Closed
        }
    }

    /// The last day the game can come back without a fee.
    pub fn due_date(&self) -> NaiveDate {
        self.rent_date + Duration::days(i64::from(self.days_rented))
    }

    /// Fee owed when returning on `returned_on`: one daily price per
    /// whole day past the due date, zero when on time.
    pub fn delay_fee_for(&self, returned_on: NaiveDate, price_per_day: Money) -> Money {
        let days_late = (returned_on - self.due_date()).num_days();
        if days_late > 0 {
            price_per_day.multiply(days_late)
        } else {
            Money::zero()
        }
    }
}

/// A rental joined with customer and game details for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalDetail {
    pub id: RentalId,
    pub customer_id: CustomerId,
    pub game_id: GameId,
    pub rent_date: NaiveDate,
    pub days_rented: i32,
    pub return_date: Option<NaiveDate>,
    pub original_price: Money,
    pub delay_fee: Option<Money>,
    pub customer: RentalCustomer,
    pub game: RentalGame,
}

/// The customer slice embedded in a rental listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalCustomer {
    pub id: CustomerId,
    pub name: String,
}

/// The game slice embedded in a rental listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalGame {
    pub id: GameId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rental(rent_date: NaiveDate, days_rented: i32) -> Rental {
        Rental {
            id: RentalId::new(),
            customer_id: CustomerId::new(),
            game_id: GameId::new(),
            rent_date,
            days_rented,
            return_date: None,
            original_price: Money::from_cents(1500).multiply(i64::from(days_rented)),
            delay_fee: None,
        }
    }

    #[test]
    fn due_date_is_rent_date_plus_days_rented() {
        let r = rental(date(2021, 6, 20), 3);
        assert_eq!(r.due_date(), date(2021, 6, 23));
    }

    #[test]
    fn no_fee_when_returned_before_due_date() {
        let r = rental(date(2021, 6, 20), 3);
        let fee = r.delay_fee_for(date(2021, 6, 22), Money::from_cents(1500));
        assert_eq!(fee, Money::zero());
    }

    #[test]
    fn no_fee_when_returned_exactly_on_due_date() {
        let r = rental(date(2021, 6, 20), 3);
        let fee = r.delay_fee_for(date(2021, 6, 23), Money::from_cents(1500));
        assert_eq!(fee, Money::zero());
    }

    #[test]
    fn fee_charges_daily_price_per_day_late() {
        let r = rental(date(2021, 6, 20), 3);
        let fee = r.delay_fee_for(date(2021, 6, 25), Money::from_cents(1500));
        assert_eq!(fee, Money::from_cents(3000));
    }

    #[test]
    fn fee_spans_month_boundaries() {
        let r = rental(date(2021, 1, 30), 2);
        let fee = r.delay_fee_for(date(2021, 2, 3), Money::from_cents(1000));
        assert_eq!(fee, Money::from_cents(2000));
    }

    #[test]
    fn status_follows_return_date() {
        let mut r = rental(date(2021, 6, 20), 3);
        assert_eq!(r.status(), RentalStatus::Open);
        r.return_date = Some(date(2021, 6, 23));
        assert_eq!(r.status(), RentalStatus::Closed);
    }

    #[test]
    fn rental_serializes_with_camel_case_keys() {
        let r = rental(date(2021, 6, 20), 3);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["rentDate"], "2021-06-20");
        assert_eq!(json["daysRented"], 3);
        assert_eq!(json["returnDate"], serde_json::Value::Null);
        assert_eq!(json["originalPrice"], 4500);
        assert_eq!(json["delayFee"], serde_json::Value::Null);
    }

    #[test]
    fn new_game_deserializes_from_camel_case() {
        let new: NewGame = serde_json::from_str(
            r#"{
                "name": "Targui",
                "image": "http://example.com/targui.jpg",
                "stockTotal": 3,
                "categoryId": "3e906b74-cfc3-4527-a7ce-ec145e1bbf27",
                "pricePerDay": 1500
            }"#,
        )
        .unwrap();
        assert_eq!(new.stock_total, 3);
        assert_eq!(new.price_per_day, Money::from_cents(1500));
    }

    #[test]
    fn rental_status_parses_lowercase() {
        assert_eq!(
            serde_json::from_str::<RentalStatus>("\"open\"").unwrap(),
            RentalStatus::Open
        );
        assert_eq!(
            serde_json::from_str::<RentalStatus>("\"closed\"").unwrap(),
            RentalStatus::Closed
        );
        assert!(serde_json::from_str::<RentalStatus>("\"late\"").is_err());
    }
}
