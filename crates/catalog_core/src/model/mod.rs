//! Domain model for the catalog: products and the user/profile/address graph.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Identifiers are system-assigned positive integers.
//! - Prices are non-negative with at most two fractional digits.

use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod product;
pub mod user;

/// Field-level validation failure for catalog entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyProductName,
    NegativePrice(Decimal),
    PriceScale(Decimal),
    PriceOutOfRange(Decimal),
    EmptyUserName,
    InvalidEmail(String),
    EmptyAddressField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProductName => write!(f, "product name cannot be empty"),
            Self::NegativePrice(price) => write!(f, "price cannot be negative: {price}"),
            Self::PriceScale(price) => {
                write!(f, "price has more than two fractional digits: {price}")
            }
            Self::PriceOutOfRange(price) => write!(f, "price is out of storable range: {price}"),
            Self::EmptyUserName => write!(f, "user name cannot be empty"),
            Self::InvalidEmail(email) => write!(f, "invalid email address `{email}`"),
            Self::EmptyAddressField(field) => write!(f, "address {field} cannot be empty"),
        }
    }
}

impl Error for ValidationError {}
