//! Composable product predicates.

use crate::model::product::{Product, ProductField, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Not;

/// How a text predicate compares the stored value with its operand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringMatcher {
    #[default]
    Exact,
    Containing,
    StartingWith,
    EndingWith,
}

/// Text-valued product fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Name,
    Description,
}

impl TextField {
    pub fn field(self) -> ProductField {
        match self {
            Self::Name => ProductField::Name,
            Self::Description => ProductField::Description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceComparison {
    Equal,
    AtLeast,
    AtMost,
}

/// Boolean condition over a [`Product`].
///
/// Case-insensitive text matching applies Unicode lowercasing to both sides,
/// the same folding the SQL `fold_case` function performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSpec {
    /// Matches every product.
    All,
    IdIs(ProductId),
    Text {
        field: TextField,
        matcher: StringMatcher,
        value: String,
        ignore_case: bool,
    },
    Price {
        comparison: PriceComparison,
        value: Decimal,
    },
    CategoryIs(u8),
    /// True when the field is stored as `NULL`; never true for required fields.
    IsNull(ProductField),
    And(Box<ProductSpec>, Box<ProductSpec>),
    Or(Box<ProductSpec>, Box<ProductSpec>),
    Not(Box<ProductSpec>),
}

impl ProductSpec {
    /// Case-insensitive containment on `name`.
    pub fn has_name(value: impl Into<String>) -> Self {
        Self::Text {
            field: TextField::Name,
            matcher: StringMatcher::Containing,
            value: value.into(),
            ignore_case: true,
        }
    }

    /// Inclusive lower price bound.
    pub fn price_at_least(value: Decimal) -> Self {
        Self::Price {
            comparison: PriceComparison::AtLeast,
            value,
        }
    }

    /// Inclusive upper price bound.
    pub fn price_at_most(value: Decimal) -> Self {
        Self::Price {
            comparison: PriceComparison::AtMost,
            value,
        }
    }

    pub fn in_category(category: u8) -> Self {
        Self::CategoryIs(category)
    }

    /// Conjunction; `All` is the identity on either side.
    pub fn and(self, other: ProductSpec) -> Self {
        match (self, other) {
            (Self::All, spec) | (spec, Self::All) => spec,
            (left, right) => Self::And(Box::new(left), Box::new(right)),
        }
    }

    /// Disjunction; `All` absorbs the other side.
    pub fn or(self, other: ProductSpec) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (left, right) => Self::Or(Box::new(left), Box::new(right)),
        }
    }

    /// Folds specs left-to-right with [`ProductSpec::and`]; empty input is `All`.
    pub fn all_of<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = ProductSpec>,
    {
        specs.into_iter().fold(Self::All, Self::and)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Evaluates the predicate against one product in memory.
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::IdIs(id) => product.id == *id,
            Self::Text {
                field,
                matcher,
                value,
                ignore_case,
            } => {
                let stored = match field {
                    TextField::Name => Some(product.name.as_str()),
                    TextField::Description => product.description.as_deref(),
                };
                stored.is_some_and(|stored| text_matches(stored, value, *matcher, *ignore_case))
            }
            Self::Price { comparison, value } => match comparison {
                PriceComparison::Equal => product.price == *value,
                PriceComparison::AtLeast => product.price >= *value,
                PriceComparison::AtMost => product.price <= *value,
            },
            Self::CategoryIs(category) => product.category == *category,
            Self::IsNull(field) => match field {
                ProductField::Description => product.description.is_none(),
                _ => false,
            },
            Self::And(left, right) => left.matches(product) && right.matches(product),
            Self::Or(left, right) => left.matches(product) || right.matches(product),
            Self::Not(inner) => !inner.matches(product),
        }
    }
}

impl Not for ProductSpec {
    type Output = ProductSpec;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

fn text_matches(stored: &str, operand: &str, matcher: StringMatcher, ignore_case: bool) -> bool {
    let (stored, operand) = if ignore_case {
        (stored.to_lowercase(), operand.to_lowercase())
    } else {
        (stored.to_string(), operand.to_string())
    };
    match matcher {
        StringMatcher::Exact => stored == operand,
        StringMatcher::Containing => stored.contains(&operand),
        StringMatcher::StartingWith => stored.starts_with(&operand),
        StringMatcher::EndingWith => stored.ends_with(&operand),
    }
}

/// Optional, independent filter criteria for product listing.
///
/// An absent criterion is not applied; `Some("")` is a present criterion that
/// every name satisfies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn new(
        name: Option<String>,
        min_price: Option<Decimal>,
        max_price: Option<Decimal>,
    ) -> Self {
        Self {
            name,
            min_price,
            max_price,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.min_price.is_none() && self.max_price.is_none()
    }

    /// Combines present criteria with AND in the order name, min, max.
    pub fn to_spec(&self) -> ProductSpec {
        ProductSpec::all_of(
            [
                self.name.clone().map(ProductSpec::has_name),
                self.min_price.map(ProductSpec::price_at_least),
                self.max_price.map(ProductSpec::price_at_most),
            ]
            .into_iter()
            .flatten(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: ProductId, name: &str, price: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price: Decimal::from(price),
            category: 1,
            description: None,
        }
    }

    #[test]
    fn empty_filter_is_match_all() {
        let spec = ProductFilter::default().to_spec();
        assert!(spec.is_all());
        assert!(spec.matches(&product(1, "anything", 0)));
    }

    #[test]
    fn filter_combines_present_criteria_left_to_right() {
        let filter = ProductFilter::new(
            Some("dg".to_string()),
            Some(Decimal::from(5)),
            Some(Decimal::from(25)),
        );
        let expected = ProductSpec::And(
            Box::new(ProductSpec::And(
                Box::new(ProductSpec::has_name("dg")),
                Box::new(ProductSpec::price_at_least(Decimal::from(5))),
            )),
            Box::new(ProductSpec::price_at_most(Decimal::from(25))),
        );
        assert_eq!(filter.to_spec(), expected);
    }

    #[test]
    fn min_price_selects_only_products_at_or_above_bound() {
        let spec = ProductFilter::new(None, Some(Decimal::from(15)), None).to_spec();
        assert!(!spec.matches(&product(1, "Widget", 10)));
        assert!(spec.matches(&product(2, "Gadget", 20)));
        assert!(ProductSpec::price_at_least(Decimal::from(20)).matches(&product(2, "Gadget", 20)));
        assert!(ProductSpec::price_at_most(Decimal::from(20)).matches(&product(2, "Gadget", 20)));
    }

    #[test]
    fn name_match_is_case_insensitive_containment() {
        let spec = ProductSpec::has_name("GADG");
        assert!(spec.matches(&product(2, "Gadget", 20)));
        assert!(!spec.matches(&product(1, "Widget", 10)));
    }

    #[test]
    fn text_predicate_on_missing_description_is_false_and_negation_is_true() {
        let spec = ProductSpec::Text {
            field: TextField::Description,
            matcher: StringMatcher::Containing,
            value: "x".to_string(),
            ignore_case: false,
        };
        let item = product(1, "Widget", 10);
        assert!(!spec.matches(&item));
        assert!((!spec).matches(&item));
    }

    #[test]
    fn ignore_case_folds_non_ascii_letters() {
        let spec = ProductSpec::has_name("éclair");
        assert!(spec.matches(&product(1, "ÉCLAIR ROYAL", 4)));
        assert!(!spec.matches(&product(2, "ECLAIR", 4)));
    }

    #[test]
    fn double_negation_restores_the_predicate() {
        let item = product(1, "Widget", 10);
        let spec = !!ProductSpec::has_name("wid");
        assert!(spec.matches(&item));
        assert!(matches!(spec, ProductSpec::Not(_)));
    }

    #[test]
    fn or_with_all_is_all() {
        let spec = ProductSpec::in_category(9).or(ProductSpec::All);
        assert!(spec.is_all());
    }

    #[test]
    fn is_null_only_applies_to_description() {
        let item = product(1, "Widget", 10);
        assert!(ProductSpec::IsNull(ProductField::Description).matches(&item));
        assert!(!ProductSpec::IsNull(ProductField::Name).matches(&item));
    }
}
