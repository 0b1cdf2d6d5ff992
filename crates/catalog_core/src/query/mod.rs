//! Storage-agnostic product query model.
//!
//! # Responsibility
//! - Express product filters as a small predicate algebra ([`ProductSpec`]).
//! - Translate optional filter criteria and query-by-example probes into specs.
//! - Describe pagination and sorting requests and their page results.
//!
//! # Invariants
//! - Every spec can be evaluated in memory; SQL compilation lives in
//!   `repo::product_repo` and must agree with [`ProductSpec::matches`].
//! - Page requests are validated at construction and cannot hold a negative
//!   index or a non-positive size.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod example;
pub mod page;
pub mod spec;

pub use example::{ExampleMatcher, NullHandling, ProductProbe};
pub use page::{Direction, Order, Page, PageRequest, Sort};
pub use spec::{PriceComparison, ProductFilter, ProductSpec, StringMatcher, TextField};

/// Rejected query input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    InvalidPageSize(i64),
    InvalidPageIndex(i64),
    PageOutOfRange { page: i64, size: i64 },
    InvalidSort(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPageSize(size) => write!(f, "page size must be positive, got {size}"),
            Self::InvalidPageIndex(page) => {
                write!(f, "page index must not be negative, got {page}")
            }
            Self::PageOutOfRange { page, size } => {
                write!(f, "page {page} with size {size} exceeds the addressable range")
            }
            Self::InvalidSort(message) => write!(f, "invalid sort: {message}"),
        }
    }
}

impl Error for QueryError {}
