//! Product use-case service.
//!
//! # Responsibility
//! - Provide product lookup, filtering, example matching and paging entry points.
//! - Provide transactional delete and bulk price update entry points.
//! - Emit one log event per returned product plus a summary event.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Filter criteria combine with AND in the order name, min price, max price.

use super::{require_positive_id, ServiceError, ServiceResult};
use crate::model::product::{
    NewProduct, Product, ProductField, ProductId, ProductSummary,
};
use crate::query::{
    ExampleMatcher, Page, PageRequest, ProductFilter, ProductProbe, ProductSpec, Sort,
    StringMatcher,
};
use crate::repo::product_repo::ProductRepository;
use crate::repo::EntityKind;
use log::{debug, info};
use rust_decimal::Decimal;

/// Name fragment used by [`ProductService::fetch_products_by_example`].
pub const EXAMPLE_PROBE_NAME: &str = "product";

/// Matcher used for name-based example queries: case-insensitive
/// containment, ignoring `id` and `description`.
pub fn default_example_matcher() -> ExampleMatcher {
    ExampleMatcher::matching()
        .with_string_matcher(StringMatcher::Containing)
        .with_ignore_case(true)
        .with_ignored_fields(&[ProductField::Id, ProductField::Description])
}

/// Use-case service wrapper for product queries and writes.
pub struct ProductService<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> ProductService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_product(&self, product: &NewProduct) -> ServiceResult<Product> {
        let created = self.repo.create_product(product)?;
        info!(
            "event=product_create module=product_service status=ok id={} category={}",
            created.id, created.category
        );
        Ok(created)
    }

    /// Gets one product by id.
    ///
    /// # Errors
    /// - `InvalidArgument` for a non-positive id.
    /// - `NotFound` when no product has `id`.
    pub fn fetch_product(&self, id: ProductId) -> ServiceResult<Product> {
        let id = require_positive_id(EntityKind::Product, id)?;
        let product = self
            .repo
            .get_product(id)?
            .ok_or(ServiceError::NotFound {
                entity: EntityKind::Product,
                id,
            })?;
        log_product("fetch_product", &product);
        Ok(product)
    }

    /// Runs the canonical name probe ([`EXAMPLE_PROBE_NAME`]) with
    /// [`default_example_matcher`].
    pub fn fetch_products_by_example(&self) -> ServiceResult<Vec<Product>> {
        let probe = ProductProbe::default().with_name(EXAMPLE_PROBE_NAME);
        self.fetch_products_matching(&probe, &default_example_matcher())
    }

    /// Matches products structurally against a template.
    pub fn fetch_products_matching(
        &self,
        probe: &ProductProbe,
        matcher: &ExampleMatcher,
    ) -> ServiceResult<Vec<Product>> {
        let products = self.repo.find_by_example(probe, matcher)?;
        log_products("fetch_products_by_example", &products);
        Ok(products)
    }

    /// Fixed-shape criteria query; `None` arguments are skipped.
    pub fn fetch_products_by_criteria(
        &self,
        name: Option<&str>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> ServiceResult<Vec<Product>> {
        let products = self.repo.find_by_criteria(name, min_price, max_price)?;
        log_products("fetch_products_by_criteria", &products);
        Ok(products)
    }

    /// Builds one combined predicate from the present criteria and runs it.
    ///
    /// With no criteria every product is returned.
    pub fn fetch_products_by_specifications(
        &self,
        name: Option<String>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> ServiceResult<Vec<Product>> {
        self.fetch_products(&ProductFilter::new(name, min_price, max_price))
    }

    pub fn fetch_products(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        let spec = filter.to_spec();
        debug!(
            "event=product_filter module=product_service name={} min_price={} max_price={}",
            filter.name.is_some(),
            display_bound(filter.min_price),
            display_bound(filter.max_price)
        );
        let products = self.repo.find_all(&spec)?;
        log_products("fetch_products_by_specifications", &products);
        Ok(products)
    }

    /// Returns one page of all products.
    ///
    /// # Errors
    /// - `InvalidArgument` when `size <= 0` or `page < 0`.
    pub fn fetch_paged_products(
        &self,
        page: i64,
        size: i64,
        sort: Sort,
    ) -> ServiceResult<Page<Product>> {
        self.fetch_filtered_page(&ProductFilter::default(), page, size, sort)
    }

    /// Returns one page of the products matching `filter`.
    pub fn fetch_filtered_page(
        &self,
        filter: &ProductFilter,
        page: i64,
        size: i64,
        sort: Sort,
    ) -> ServiceResult<Page<Product>> {
        let request = PageRequest::of(page, size, sort)?;
        let result = self.repo.find_page(&filter.to_spec(), &request)?;

        for product in &result.content {
            log_product("fetch_paged_products", product);
        }
        info!(
            "event=fetch_paged_products module=product_service status=ok page={} size={} total_pages={} total_elements={}",
            result.number, result.size, result.total_pages, result.total_elements
        );
        Ok(result)
    }

    /// Runs an arbitrary spec with an explicit sort order.
    pub fn fetch_products_sorted(
        &self,
        spec: &ProductSpec,
        sort: &Sort,
    ) -> ServiceResult<Vec<Product>> {
        let products = self.repo.find_sorted(spec, sort)?;
        log_products("fetch_products_sorted", &products);
        Ok(products)
    }

    pub fn list_product_summaries(
        &self,
        filter: &ProductFilter,
    ) -> ServiceResult<Vec<ProductSummary>> {
        Ok(self.repo.list_summaries(&filter.to_spec())?)
    }

    /// Deletes one product in its own transaction.
    ///
    /// # Errors
    /// - `InvalidArgument` for a non-positive id.
    /// - `NotFound` when no product has `id`.
    pub fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        let id = require_positive_id(EntityKind::Product, id)?;
        self.repo.delete_product(id)?;
        info!("event=product_delete module=product_service status=ok id={id}");
        Ok(())
    }

    /// Sets `price` on every product of `category`; returns updated rows.
    pub fn update_product_prices(&self, price: Decimal, category: u8) -> ServiceResult<usize> {
        let updated = self.repo.update_price_by_category(price, category)?;
        info!(
            "event=product_price_update module=product_service status=ok category={} updated={}",
            category, updated
        );
        Ok(updated)
    }
}

fn log_products(operation: &str, products: &[Product]) {
    for product in products {
        log_product(operation, product);
    }
    info!(
        "event={} module=product_service status=ok count={}",
        operation,
        products.len()
    );
}

fn log_product(operation: &str, product: &Product) {
    info!(
        "event=product_loaded module=product_service op={} id={} name={:?} price={} category={}",
        operation, product.id, product.name, product.price, product.category
    );
}

fn display_bound(bound: Option<Decimal>) -> String {
    bound.map_or_else(|| "none".to_string(), |value| value.to_string())
}
