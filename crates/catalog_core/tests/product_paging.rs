use catalog_core::db::open_db_in_memory;
use catalog_core::{
    Direction, NewProduct, ProductField, ProductFilter, ProductRepository, ProductService,
    ServiceError, Sort, SqliteProductRepository,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn seed(conn: &Connection, rows: &[(&str, i64, u8)]) {
    let repo = SqliteProductRepository::try_new(conn).unwrap();
    for (name, price, category) in rows {
        repo.create_product(&NewProduct::new(*name, Decimal::from(*price), *category))
            .unwrap();
    }
}

#[test]
fn first_page_of_two_rows_with_size_one() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[("Widget", 10, 1), ("Gadget", 20, 1)]);
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let page = service
        .fetch_paged_products(0, 1, Sort::unsorted())
        .unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].name, "Widget");
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.total_elements, 2);
    assert!(page.has_next());
}

#[test]
fn non_positive_size_is_invalid_argument() {
    let conn = open_db_in_memory().unwrap();
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    for size in [0, -1] {
        let err = service
            .fetch_paged_products(0, size, Sort::unsorted())
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)), "size {size}");
    }
}

#[test]
fn negative_page_index_is_invalid_argument() {
    let conn = open_db_in_memory().unwrap();
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let err = service
        .fetch_paged_products(-1, 10, Sort::unsorted())
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
}

#[test]
fn empty_collection_yields_zero_count_page() {
    let conn = open_db_in_memory().unwrap();
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let page = service
        .fetch_paged_products(0, 10, Sort::unsorted())
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.total_elements, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.has_next());
}

#[test]
fn page_past_the_end_is_empty_but_keeps_totals() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[("Widget", 10, 1), ("Gadget", 20, 1), ("Gizmo", 30, 2)]);
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let page = service
        .fetch_paged_products(5, 2, Sort::unsorted())
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.number, 5);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
}

#[test]
fn sorted_pages_cover_every_row_once() {
    let conn = open_db_in_memory().unwrap();
    seed(
        &conn,
        &[
            ("Alpha", 30, 1),
            ("Bravo", 10, 1),
            ("Charlie", 30, 2),
            ("Delta", 20, 2),
            ("Echo", 10, 3),
        ],
    );
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());
    let sort = Sort::by(ProductField::Price, Direction::Desc).then(ProductField::Name, Direction::Asc);

    let mut names = Vec::new();
    for index in 0..3 {
        let page = service.fetch_paged_products(index, 2, sort.clone()).unwrap();
        assert_eq!(page.total_pages, 3);
        names.extend(page.content.into_iter().map(|product| product.name));
    }

    assert_eq!(names, vec!["Alpha", "Charlie", "Delta", "Bravo", "Echo"]);
}

#[test]
fn filtered_page_counts_only_matching_rows() {
    let conn = open_db_in_memory().unwrap();
    seed(
        &conn,
        &[("Widget", 10, 1), ("Gadget", 20, 1), ("Gizmo", 30, 2), ("Doohickey", 40, 2)],
    );
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let filter = ProductFilter::new(None, Some(Decimal::from(20)), None);
    let page = service
        .fetch_filtered_page(&filter, 1, 2, Sort::by(ProductField::Price, Direction::Asc))
        .unwrap();

    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 2);
    let names: Vec<&str> = page.content.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Doohickey"]);
    assert!(page.has_previous());
}

#[test]
fn page_map_preserves_metadata() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[("Widget", 10, 1), ("Gadget", 20, 1)]);
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    let page = service
        .fetch_paged_products(0, 1, Sort::by(ProductField::Name, Direction::Asc))
        .unwrap()
        .map(|product| product.summary());

    assert_eq!(page.content[0].name, "Gadget");
    assert_eq!(page.total_elements, 2);
    assert_eq!(page.total_pages, 2);
}

#[test]
fn paging_inside_caller_transaction_reuses_it() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn, &[("Widget", 10, 1), ("Gadget", 20, 1), ("Gizmo", 30, 2)]);
    let service = ProductService::new(SqliteProductRepository::try_new(&conn).unwrap());

    conn.execute_batch("BEGIN IMMEDIATE;").unwrap();
    conn.execute(
        "INSERT INTO products (name, price_cents, category) VALUES ('Pending', 500, 3);",
        [],
    )
    .unwrap();

    let page = service
        .fetch_paged_products(0, 10, Sort::unsorted())
        .unwrap();
    assert_eq!(page.total_elements, 4);
    assert_eq!(page.content.len(), 4);
    assert!(!conn.is_autocommit());

    conn.execute_batch("ROLLBACK;").unwrap();
    let page = service
        .fetch_paged_products(0, 10, Sort::unsorted())
        .unwrap();
    assert_eq!(page.total_elements, 3);
}
