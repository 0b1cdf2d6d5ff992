//! Product repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and bulk-update APIs over the `products` table.
//! - Compile [`ProductSpec`] predicates and [`Sort`] orders into parameterised SQL.
//! - Execute filtered, example-based and paginated product queries.
//!
//! # Invariants
//! - Compiled SQL agrees with [`ProductSpec::matches`] row for row.
//! - Every operand is bound as a parameter; only fixed column names are
//!   interpolated into SQL text.
//! - Unsorted queries return rows by ascending `id`; sorted queries break
//!   ties by ascending `id` so pages never overlap.
//! - Read paths reject invalid persisted rows instead of masking them.

use super::{ensure_schema, EntityKind, RepoError, RepoResult};
use crate::db::{register_functions, FOLD_CASE_FN};
use crate::model::product::{
    cents_to_price, price_ceiling_bound, price_floor_bound, price_to_cents, validate_price,
    NewProduct, Product, ProductField, ProductId, ProductSummary,
};
use crate::query::{
    ExampleMatcher, Page, PageRequest, PriceComparison, ProductProbe, ProductSpec,
    Sort, StringMatcher, TextField,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use rust_decimal::Decimal;

const PRODUCT_SELECT_SQL: &str = "SELECT
    id,
    name,
    price_cents,
    category,
    description
FROM products";

const PRODUCT_COLUMNS: &[&str] = &["id", "name", "price_cents", "category", "description"];

/// Repository interface for product persistence and queries.
pub trait ProductRepository {
    /// Inserts a product and returns it with its assigned id.
    fn create_product(&self, product: &NewProduct) -> RepoResult<Product>;
    /// Replaces every column of an existing product.
    fn update_product(&self, product: &Product) -> RepoResult<()>;
    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>>;
    /// Deletes one product; `NotFound` when no row has `id`.
    fn delete_product(&self, id: ProductId) -> RepoResult<()>;
    /// Sets `price` on every product in `category`; returns affected rows.
    fn update_price_by_category(&self, price: Decimal, category: u8) -> RepoResult<usize>;
    fn count(&self, spec: &ProductSpec) -> RepoResult<u64>;
    fn find_sorted(&self, spec: &ProductSpec, sort: &Sort) -> RepoResult<Vec<Product>>;
    /// Counts and slices in one read snapshot.
    ///
    /// Opens a deferred transaction when the connection is in autocommit
    /// mode; inside a caller-owned transaction it reads through that one.
    fn find_page(&self, spec: &ProductSpec, request: &PageRequest) -> RepoResult<Page<Product>>;
    /// Fixed-shape query where each `None` criterion is skipped.
    fn find_by_criteria(
        &self,
        name: Option<&str>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> RepoResult<Vec<Product>>;
    fn list_summaries(&self, spec: &ProductSpec) -> RepoResult<Vec<ProductSummary>>;

    fn find_all(&self, spec: &ProductSpec) -> RepoResult<Vec<Product>> {
        self.find_sorted(spec, &Sort::unsorted())
    }

    fn find_by_example(
        &self,
        probe: &ProductProbe,
        matcher: &ExampleMatcher,
    ) -> RepoResult<Vec<Product>> {
        self.find_all(&matcher.to_spec(probe))
    }
}

/// SQLite-backed product repository.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, &[("products", PRODUCT_COLUMNS)])?;
        register_functions(conn)?;
        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn create_product(&self, product: &NewProduct) -> RepoResult<Product> {
        product.validate()?;
        let cents = storable_cents(product.price)?;

        self.conn.execute(
            "INSERT INTO products (
                name,
                price_cents,
                category,
                description
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                product.name.as_str(),
                cents,
                i64::from(product.category),
                product.description.as_deref(),
            ],
        )?;

        Ok(product.clone().into_product(self.conn.last_insert_rowid()))
    }

    fn update_product(&self, product: &Product) -> RepoResult<()> {
        product.validate()?;
        let cents = storable_cents(product.price)?;

        let changed = self.conn.execute(
            "UPDATE products
             SET
                name = ?1,
                price_cents = ?2,
                category = ?3,
                description = ?4
             WHERE id = ?5;",
            params![
                product.name.as_str(),
                cents,
                i64::from(product.category),
                product.description.as_deref(),
                product.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Product,
                id: product.id,
            });
        }

        Ok(())
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRODUCT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_product_row(row)?));
        }

        Ok(None)
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM products WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Product,
                id,
            });
        }
        tx.commit()?;
        Ok(())
    }

    fn update_price_by_category(&self, price: Decimal, category: u8) -> RepoResult<usize> {
        validate_price(price)?;
        let cents = storable_cents(price)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE products SET price_cents = ?1 WHERE category = ?2;",
            params![cents, i64::from(category)],
        )?;
        tx.commit()?;
        Ok(changed)
    }

    fn count(&self, spec: &ProductSpec) -> RepoResult<u64> {
        count_matching(self.conn, &compile_spec(spec))
    }

    fn find_sorted(&self, spec: &ProductSpec, sort: &Sort) -> RepoResult<Vec<Product>> {
        let filter = compile_spec(spec);
        let sql = format!(
            "{PRODUCT_SELECT_SQL} WHERE {} {}",
            filter.clause,
            order_by_clause(sort)
        );
        query_products(self.conn, &sql, &filter.binds)
    }

    fn find_page(&self, spec: &ProductSpec, request: &PageRequest) -> RepoResult<Page<Product>> {
        let filter = compile_spec(spec);
        let limit = to_sql_integer(request.size())?;
        let offset = to_sql_integer(request.offset())?;

        // Count and slice must observe the same snapshot. A caller-owned
        // transaction already provides one.
        let tx = if self.conn.is_autocommit() {
            Some(Transaction::new_unchecked(
                self.conn,
                TransactionBehavior::Deferred,
            )?)
        } else {
            None
        };
        let total_elements = count_matching(self.conn, &filter)?;

        let sql = format!(
            "{PRODUCT_SELECT_SQL} WHERE {} {} LIMIT ? OFFSET ?",
            filter.clause,
            order_by_clause(request.sort())
        );
        let mut binds = filter.binds;
        binds.push(Value::Integer(limit));
        binds.push(Value::Integer(offset));
        let content = query_products(self.conn, &sql, &binds)?;
        if let Some(tx) = tx {
            tx.commit()?;
        }

        Ok(Page::new(content, request, total_elements))
    }

    fn find_by_criteria(
        &self,
        name: Option<&str>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> RepoResult<Vec<Product>> {
        let mut min_cents = None;
        match min_price.map(lower_bound) {
            Some(CentsBound::Within(cents)) => min_cents = Some(cents),
            Some(CentsBound::MatchNone) => return Ok(Vec::new()),
            Some(CentsBound::MatchAll) | None => {}
        }
        let mut max_cents = None;
        match max_price.map(upper_bound) {
            Some(CentsBound::Within(cents)) => max_cents = Some(cents),
            Some(CentsBound::MatchNone) => return Ok(Vec::new()),
            Some(CentsBound::MatchAll) | None => {}
        }

        let sql = format!(
            "{PRODUCT_SELECT_SQL}
             WHERE (?1 IS NULL OR instr({FOLD_CASE_FN}(name), ?1) > 0)
               AND (?2 IS NULL OR price_cents >= ?2)
               AND (?3 IS NULL OR price_cents <= ?3)
             ORDER BY id ASC;"
        );
        let binds = [
            name.map_or(Value::Null, |value| Value::Text(value.to_lowercase())),
            min_cents.map_or(Value::Null, Value::Integer),
            max_cents.map_or(Value::Null, Value::Integer),
        ];
        query_products(self.conn, &sql, &binds)
    }

    fn list_summaries(&self, spec: &ProductSpec) -> RepoResult<Vec<ProductSummary>> {
        let filter = compile_spec(spec);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM products WHERE {} ORDER BY id ASC",
            filter.clause
        ))?;
        let mut rows = stmt.query(params_from_iter(filter.binds.iter()))?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(ProductSummary {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(summaries)
    }
}

/// Parameterised `WHERE` fragment compiled from a spec.
#[derive(Debug, Clone, PartialEq)]
struct SqlFilter {
    clause: String,
    binds: Vec<Value>,
}

/// Inclusive price bound expressed in storage cents.
///
/// Bounds beyond the `i64` cent range lie outside every storable price, so
/// they collapse to a constant predicate instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CentsBound {
    Within(i64),
    MatchAll,
    MatchNone,
}

fn compile_spec(spec: &ProductSpec) -> SqlFilter {
    let mut filter = SqlFilter {
        clause: String::new(),
        binds: Vec::new(),
    };
    push_spec(spec, &mut filter);
    filter
}

fn push_spec(spec: &ProductSpec, out: &mut SqlFilter) {
    match spec {
        ProductSpec::All => out.clause.push_str("1 = 1"),
        ProductSpec::IdIs(id) => {
            out.clause.push_str("id = ?");
            out.binds.push(Value::Integer(*id));
        }
        ProductSpec::Text {
            field,
            matcher,
            value,
            ignore_case,
        } => push_text(*field, *matcher, value, *ignore_case, out),
        ProductSpec::Price { comparison, value } => match comparison {
            PriceComparison::Equal => match price_to_cents(*value) {
                Some(cents) => {
                    out.clause.push_str("price_cents = ?");
                    out.binds.push(Value::Integer(cents));
                }
                // Stored prices carry at most two fractional digits.
                None => out.clause.push_str("0 = 1"),
            },
            PriceComparison::AtLeast => push_bound(">=", lower_bound(*value), out),
            PriceComparison::AtMost => push_bound("<=", upper_bound(*value), out),
        },
        ProductSpec::CategoryIs(category) => {
            out.clause.push_str("category = ?");
            out.binds.push(Value::Integer(i64::from(*category)));
        }
        ProductSpec::IsNull(field) => {
            out.clause.push_str(field.column());
            out.clause.push_str(" IS NULL");
        }
        ProductSpec::And(left, right) => push_binary("AND", left, right, out),
        ProductSpec::Or(left, right) => push_binary("OR", left, right, out),
        ProductSpec::Not(inner) => {
            out.clause.push_str("NOT (");
            push_spec(inner, out);
            out.clause.push(')');
        }
    }
}

fn push_binary(operator: &str, left: &ProductSpec, right: &ProductSpec, out: &mut SqlFilter) {
    out.clause.push('(');
    push_spec(left, out);
    out.clause.push(' ');
    out.clause.push_str(operator);
    out.clause.push(' ');
    push_spec(right, out);
    out.clause.push(')');
}

fn push_bound(operator: &str, bound: CentsBound, out: &mut SqlFilter) {
    match bound {
        CentsBound::Within(cents) => {
            out.clause.push_str("price_cents ");
            out.clause.push_str(operator);
            out.clause.push_str(" ?");
            out.binds.push(Value::Integer(cents));
        }
        CentsBound::MatchAll => out.clause.push_str("1 = 1"),
        CentsBound::MatchNone => out.clause.push_str("0 = 1"),
    }
}

fn push_text(
    field: TextField,
    matcher: StringMatcher,
    value: &str,
    ignore_case: bool,
    out: &mut SqlFilter,
) {
    let column = field.field().column();
    // The operand is folded here so only the stored side needs `fold_case`.
    let (stored, operand) = if ignore_case {
        (format!("{FOLD_CASE_FN}({column})"), value.to_lowercase())
    } else {
        (column.to_string(), value.to_string())
    };

    let (condition, bind_count) = match matcher {
        StringMatcher::Exact => (format!("{stored} = ?"), 1),
        StringMatcher::Containing => (format!("instr({stored}, ?) > 0"), 1),
        StringMatcher::StartingWith => (format!("substr({stored}, 1, length(?)) = ?"), 2),
        StringMatcher::EndingWith => (
            format!(
                "length({stored}) >= length(?) AND substr({stored}, length({stored}) - length(?) + 1) = ?"
            ),
            3,
        ),
    };

    // Keep the result two-valued for nullable columns so NOT behaves like the
    // in-memory evaluation.
    if field.field().is_nullable() {
        out.clause
            .push_str(&format!("({column} IS NOT NULL AND ({condition}))"));
    } else {
        out.clause.push_str(&format!("({condition})"));
    }
    for _ in 0..bind_count {
        out.binds.push(Value::Text(operand.clone()));
    }
}

fn order_by_clause(sort: &Sort) -> String {
    let mut keys: Vec<String> = sort
        .orders()
        .iter()
        .map(|order| format!("{} {}", order.field.column(), order.direction.as_sql()))
        .collect();
    if !sort.sorts_by(ProductField::Id) {
        keys.push("id ASC".to_string());
    }
    format!("ORDER BY {}", keys.join(", "))
}

fn lower_bound(price: Decimal) -> CentsBound {
    match price_floor_bound(price) {
        Some(cents) => CentsBound::Within(cents),
        None if price.is_sign_negative() => CentsBound::MatchAll,
        None => CentsBound::MatchNone,
    }
}

fn upper_bound(price: Decimal) -> CentsBound {
    match price_ceiling_bound(price) {
        Some(cents) => CentsBound::Within(cents),
        None if price.is_sign_negative() => CentsBound::MatchNone,
        None => CentsBound::MatchAll,
    }
}

fn storable_cents(price: Decimal) -> RepoResult<i64> {
    price_to_cents(price).ok_or_else(|| {
        RepoError::InvalidArgument(format!("price {price} cannot be stored exactly"))
    })
}

fn to_sql_integer(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidArgument(format!("value {value} exceeds SQL integer range")))
}

fn count_matching(conn: &Connection, filter: &SqlFilter) -> RepoResult<u64> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM products WHERE {}", filter.clause),
        params_from_iter(filter.binds.iter()),
        |row| row.get(0),
    )?;
    u64::try_from(total).map_err(|_| RepoError::InvalidData(format!("negative row count {total}")))
}

fn query_products(conn: &Connection, sql: &str, binds: &[Value]) -> RepoResult<Vec<Product>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(binds.iter()))?;
    let mut products = Vec::new();
    while let Some(row) = rows.next()? {
        products.push(parse_product_row(row)?);
    }
    Ok(products)
}

fn parse_product_row(row: &Row<'_>) -> RepoResult<Product> {
    let category_code: i64 = row.get("category")?;
    let category = u8::try_from(category_code).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid category `{category_code}` in products.category"
        ))
    })?;

    let product = Product {
        id: row.get("id")?,
        name: row.get("name")?,
        price: cents_to_price(row.get("price_cents")?),
        category,
        description: row.get("description")?,
    };
    product.validate().map_err(|err| {
        RepoError::InvalidData(format!("invalid product row id={}: {err}", product.id))
    })?;
    Ok(product)
}
