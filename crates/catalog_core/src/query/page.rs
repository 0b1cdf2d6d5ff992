//! Pagination and sorting requests and page results.

use super::QueryError;
use crate::model::product::ProductField;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub field: ProductField,
    pub direction: Direction,
}

/// Ordered sequence of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: ProductField, direction: Direction) -> Self {
        Self::unsorted().then(field, direction)
    }

    /// Appends a lower-precedence key.
    pub fn then(mut self, field: ProductField, direction: Direction) -> Self {
        self.orders.push(Order { field, direction });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn sorts_by(&self, field: ProductField) -> bool {
        self.orders.iter().any(|order| order.field == field)
    }

    /// Parses `field[:asc|:desc]` keys separated by commas, e.g. `price:desc,name`.
    pub fn parse(value: &str) -> Result<Self, QueryError> {
        let mut sort = Self::unsorted();
        for key in value.split(',').map(str::trim).filter(|key| !key.is_empty()) {
            let (field, direction) = match key.split_once(':') {
                Some((field, direction)) => (field, direction.trim()),
                None => (key, "asc"),
            };
            let field = field.parse::<ProductField>().map_err(QueryError::InvalidSort)?;
            let direction = match direction.to_ascii_lowercase().as_str() {
                "asc" => Direction::Asc,
                "desc" => Direction::Desc,
                other => {
                    return Err(QueryError::InvalidSort(format!(
                        "unknown direction `{other}` for `{field}`"
                    )))
                }
            };
            sort = sort.then(field, direction);
        }
        Ok(sort)
    }
}

/// Zero-based page index, positive page size and sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u64,
    size: u64,
    sort: Sort,
}

impl PageRequest {
    /// Validates and builds a page request.
    ///
    /// # Errors
    /// - `InvalidPageSize` when `size <= 0`.
    /// - `InvalidPageIndex` when `page < 0`.
    /// - `PageOutOfRange` when the row offset does not fit in `i64`.
    pub fn of(page: i64, size: i64, sort: Sort) -> Result<Self, QueryError> {
        if size <= 0 {
            return Err(QueryError::InvalidPageSize(size));
        }
        if page < 0 {
            return Err(QueryError::InvalidPageIndex(page));
        }
        if page.checked_mul(size).is_none() {
            return Err(QueryError::PageOutOfRange { page, size });
        }
        Ok(Self {
            page: page.unsigned_abs(),
            size: size.unsigned_abs(),
            sort,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of rows preceding this page; fits `i64` by construction.
    pub fn offset(&self) -> u64 {
        self.page * self.size
    }
}

/// One slice of a larger result set with total-count metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
            total_pages: total_elements.div_ceil(request.size()),
        }
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_rejects_non_positive_size_and_negative_index() {
        assert_eq!(
            PageRequest::of(0, 0, Sort::unsorted()),
            Err(QueryError::InvalidPageSize(0))
        );
        assert_eq!(
            PageRequest::of(0, -3, Sort::unsorted()),
            Err(QueryError::InvalidPageSize(-3))
        );
        assert_eq!(
            PageRequest::of(-1, 10, Sort::unsorted()),
            Err(QueryError::InvalidPageIndex(-1))
        );
        assert!(matches!(
            PageRequest::of(i64::MAX, 2, Sort::unsorted()),
            Err(QueryError::PageOutOfRange { .. })
        ));
    }

    #[test]
    fn total_pages_is_ceiling_of_total_over_size() {
        let request = PageRequest::of(0, 3, Sort::unsorted()).unwrap();
        assert_eq!(Page::<()>::new(Vec::new(), &request, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(Vec::new(), &request, 3).total_pages, 1);
        assert_eq!(Page::<()>::new(Vec::new(), &request, 7).total_pages, 3);
    }

    #[test]
    fn has_next_and_previous_follow_page_position() {
        let first = PageRequest::of(0, 1, Sort::unsorted()).unwrap();
        let page = Page::new(vec![1], &first, 2);
        assert!(page.has_next());
        assert!(!page.has_previous());

        let last = PageRequest::of(1, 1, Sort::unsorted()).unwrap();
        let page = Page::new(vec![2], &last, 2);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn sort_parse_reads_fields_and_directions() {
        let sort = Sort::parse("price:desc, name").unwrap();
        assert_eq!(
            sort,
            Sort::by(ProductField::Price, Direction::Desc).then(ProductField::Name, Direction::Asc)
        );
        assert!(Sort::parse("").unwrap().is_unsorted());
        assert!(matches!(
            Sort::parse("price:sideways"),
            Err(QueryError::InvalidSort(_))
        ));
        assert!(matches!(
            Sort::parse("weight"),
            Err(QueryError::InvalidSort(_))
        ));
    }
}
