//! CLI demo entry point.
//!
//! # Responsibility
//! - Load `CATALOG_*` configuration and open the configured database.
//! - Seed a small catalog when empty and print filtered and paged queries.

use catalog_core::{
    CatalogConfig, Direction, NewProduct, ProductField, ProductFilter, ProductRepository,
    ProductService, ProductSpec, Sort, SqliteProductRepository,
};
use log::info;
use rust_decimal::Decimal;
use std::error::Error;

fn main() {
    if let Err(err) = run() {
        eprintln!("catalog_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CatalogConfig::from_env()?;
    config.init_logging()?;
    let conn = config.open_db()?;

    let repo = SqliteProductRepository::try_new(&conn)?;
    if repo.count(&ProductSpec::All)? == 0 {
        for product in demo_products() {
            repo.create_product(&product)?;
        }
        info!("event=demo_seed module=cli status=ok");
    }
    let service = ProductService::new(repo);

    println!("catalog_core version={}", catalog_core::core_version());

    let filter = ProductFilter::new(Some("product".to_string()), Some(Decimal::ONE), None);
    for product in service.fetch_products(&filter)? {
        println!(
            "match id={} name={:?} price={}",
            product.id, product.name, product.price
        );
    }

    let page = service.fetch_paged_products(
        0,
        config.default_page_size,
        Sort::by(ProductField::Price, Direction::Desc),
    )?;
    println!(
        "page {}/{} total_elements={}",
        page.number + 1,
        page.total_pages,
        page.total_elements
    );
    for product in &page.content {
        println!("  {} {}", product.name, product.price);
    }
    Ok(())
}

fn demo_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Widget", Decimal::new(1000, 2), 1).with_description("small blue widget"),
        NewProduct::new("Gadget", Decimal::new(2000, 2), 2),
        NewProduct::new("Product Alpha", Decimal::new(150, 2), 1),
        NewProduct::new("Big Product", Decimal::new(99999, 2), 3),
    ]
}
