//! Core data-access and service layer for the catalog.
//! This crate owns the product query algebra and every persistence invariant.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::product::{NewProduct, Product, ProductField, ProductId, ProductSummary};
pub use model::user::{
    Address, AddressId, NewAddress, NewUser, Profile, ProfileId, ProfileWithUser, User,
    UserDetails, UserId,
};
pub use model::ValidationError;
pub use query::{
    Direction, ExampleMatcher, NullHandling, Order, Page, PageRequest, ProductFilter,
    ProductProbe, ProductSpec, QueryError, Sort, StringMatcher,
};
pub use repo::product_repo::{ProductRepository, SqliteProductRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::product_service::{default_example_matcher, ProductService};
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
