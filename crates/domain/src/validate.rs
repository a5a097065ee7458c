//! Field validation for request payloads.
//!
//! Error messages use the wire names of the offending fields (e.g.
//! `stockTotal`), since they travel back to API clients verbatim.

use chrono::NaiveDate;
use thiserror::Error;

use store::{NewCustomer, NewGame};

/// A request field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Required { field: &'static str },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be {expected}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
    },
}

/// Validates a category name.
pub fn category_name(name: &str) -> Result<(), ValidationError> {
    non_empty("name", name)
}

/// Validates a game payload.
pub fn game(new: &NewGame) -> Result<(), ValidationError> {
    non_empty("name", &new.name)?;
    if !(new.image.starts_with("http://") || new.image.starts_with("https://")) {
        return Err(ValidationError::Invalid {
            field: "image",
            expected: "an http or https URL",
        });
    }
    if new.stock_total <= 0 {
        return Err(ValidationError::NotPositive {
            field: "stockTotal",
        });
    }
    if !new.price_per_day.is_positive() {
        return Err(ValidationError::NotPositive {
            field: "pricePerDay",
        });
    }
    Ok(())
}

/// Validates a customer payload against today's date.
pub fn customer(new: &NewCustomer, today: NaiveDate) -> Result<(), ValidationError> {
    non_empty("name", &new.name)?;
    digits("phone", "10 or 11 digits", &new.phone, 10, 11)?;
    digits("cpf", "exactly 11 digits", &new.cpf, 11, 11)?;
    if new.birthday > today {
        return Err(ValidationError::Invalid {
            field: "birthday",
            expected: "a date not in the future",
        });
    }
    Ok(())
}

/// Validates a rental duration.
pub fn days_rented(days: i32) -> Result<(), ValidationError> {
    if days <= 0 {
        return Err(ValidationError::NotPositive {
            field: "daysRented",
        });
    }
    Ok(())
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn digits(
    field: &'static str,
    expected: &'static str,
    value: &str,
    min_len: usize,
    max_len: usize,
) -> Result<(), ValidationError> {
    let well_formed = (min_len..=max_len).contains(&value.len())
        && value.chars().all(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(ValidationError::Invalid { field, expected });
    }
    Ok(())
}
