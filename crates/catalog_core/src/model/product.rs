//! Product domain model.
//!
//! # Responsibility
//! - Define the product record and its insert-side draft.
//! - Convert between decimal prices and the integer minor units kept in storage.
//!
//! # Invariants
//! - `price` is non-negative and carries at most [`PRICE_SCALE`] fractional digits.
//! - `name` is never blank.

use super::ValidationError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// System-assigned product identifier.
pub type ProductId = i64;

/// Number of fractional digits a stored price may carry.
pub const PRICE_SCALE: u32 = 2;

/// Canonical product record as persisted in `products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Small integer category code.
    pub category: u8,
    pub description: Option<String>,
}

impl Product {
    /// Validates field invariants before persistence or after read-back.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.price)
    }

    /// Returns the `(id, name)` projection of this product.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Insert-side product draft; the identifier is assigned by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: u8,
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: Decimal, category: u8) -> Self {
        Self {
            name: name.into(),
            price,
            category,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.price)
    }

    /// Materializes the stored record once storage has assigned `id`.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            category: self.category,
            description: self.description,
        }
    }
}

/// Lightweight `(id, name)` projection used by listing screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
}

/// Addressable product attributes, used for sorting and example matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Id,
    Name,
    Price,
    Category,
    Description,
}

impl ProductField {
    pub const ALL: [ProductField; 5] = [
        ProductField::Id,
        ProductField::Name,
        ProductField::Price,
        ProductField::Category,
        ProductField::Description,
    ];

    /// Storage column backing this field.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price_cents",
            Self::Category => "category",
            Self::Description => "description",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::Category => "category",
            Self::Description => "description",
        }
    }

    /// Whether storage allows `NULL` for this field.
    pub fn is_nullable(self) -> bool {
        matches!(self, Self::Description)
    }
}

impl Display for ProductField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "category" => Ok(Self::Category),
            "description" => Ok(Self::Description),
            other => Err(format!("unknown product field `{other}`")),
        }
    }
}

/// Converts a validated price to storage minor units.
///
/// Returns `None` when the price is not representable exactly.
pub fn price_to_cents(price: Decimal) -> Option<i64> {
    if price.normalize().scale() > PRICE_SCALE {
        return None;
    }
    price.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// Converts storage minor units back to a decimal price.
pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, PRICE_SCALE)
}

/// Smallest cent amount that is `>= price`, for inclusive lower bounds.
pub fn price_floor_bound(price: Decimal) -> Option<i64> {
    price.checked_mul(Decimal::ONE_HUNDRED)?.ceil().to_i64()
}

/// Largest cent amount that is `<= price`, for inclusive upper bounds.
pub fn price_ceiling_bound(price: Decimal) -> Option<i64> {
    price.checked_mul(Decimal::ONE_HUNDRED)?.floor().to_i64()
}

/// Validates a price on its own, as used by bulk price updates.
pub fn validate_price(price: Decimal) -> Result<(), ValidationError> {
    if price < Decimal::ZERO {
        return Err(ValidationError::NegativePrice(price));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::PriceScale(price));
    }
    if price_to_cents(price).is_none() {
        return Err(ValidationError::PriceOutOfRange(price));
    }
    Ok(())
}

fn validate_fields(name: &str, price: Decimal) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyProductName);
    }
    validate_price(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_round_trips_through_cents() {
        let price = Decimal::new(1999, 2);
        let cents = price_to_cents(price).expect("two-digit price is storable");
        assert_eq!(cents, 1999);
        assert_eq!(cents_to_price(cents), price);
    }

    #[test]
    fn whole_prices_compare_equal_after_storage() {
        let price = Decimal::from(10);
        assert_eq!(cents_to_price(price_to_cents(price).unwrap()), price);
    }

    #[test]
    fn bounds_round_toward_the_inclusive_side() {
        let value = Decimal::new(15005, 3);
        assert_eq!(price_floor_bound(value), Some(1501));
        assert_eq!(price_ceiling_bound(value), Some(1500));
    }

    #[test]
    fn validate_rejects_blank_name_and_bad_prices() {
        let blank = NewProduct::new("  ", Decimal::ONE, 0);
        assert_eq!(blank.validate(), Err(ValidationError::EmptyProductName));

        let negative = NewProduct::new("Widget", Decimal::new(-1, 0), 0);
        assert!(matches!(
            negative.validate(),
            Err(ValidationError::NegativePrice(_))
        ));

        let fractional = NewProduct::new("Widget", Decimal::new(1001, 3), 0);
        assert!(matches!(
            fractional.validate(),
            Err(ValidationError::PriceScale(_))
        ));
    }

    #[test]
    fn trailing_zeros_do_not_count_against_scale() {
        let price = Decimal::new(10500, 3);
        assert!(validate_price(price).is_ok());
        assert_eq!(price_to_cents(price), Some(1050));
    }

    #[test]
    fn field_parses_case_insensitively() {
        assert_eq!("PRICE".parse::<ProductField>(), Ok(ProductField::Price));
        assert!("weight".parse::<ProductField>().is_err());
    }
}
