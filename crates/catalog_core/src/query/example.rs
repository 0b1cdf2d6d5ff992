//! Query-by-example: a partially populated product plus matching rules.
//!
//! A probe is turned into a [`ProductSpec`] so both matching strategies share
//! one evaluation and one SQL compilation path.

use super::spec::{PriceComparison, ProductSpec, StringMatcher, TextField};
use crate::model::product::{ProductField, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Template product; only populated fields take part in matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductProbe {
    pub id: Option<ProductId>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<u8>,
    pub description: Option<String>,
}

impl ProductProbe {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_category(mut self, category: u8) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Treatment of probe fields left unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullHandling {
    /// Unset fields are not compared.
    #[default]
    Ignore,
    /// Unset fields must be stored as `NULL`.
    Include,
}

/// Rules applied when comparing a probe against stored products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleMatcher {
    pub string_matcher: StringMatcher,
    pub ignore_case: bool,
    pub ignored_fields: BTreeSet<ProductField>,
    pub null_handling: NullHandling,
}

impl ExampleMatcher {
    /// Exact, case-sensitive matching on every populated field.
    pub fn matching() -> Self {
        Self::default()
    }

    pub fn with_string_matcher(mut self, string_matcher: StringMatcher) -> Self {
        self.string_matcher = string_matcher;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_ignored_fields(mut self, fields: &[ProductField]) -> Self {
        self.ignored_fields.extend(fields.iter().copied());
        self
    }

    pub fn with_include_null_values(mut self) -> Self {
        self.null_handling = NullHandling::Include;
        self
    }

    pub fn is_ignored(&self, field: ProductField) -> bool {
        self.ignored_fields.contains(&field)
    }

    /// Builds the conjunction of per-field predicates in field declaration order.
    pub fn to_spec(&self, probe: &ProductProbe) -> ProductSpec {
        let mut specs = Vec::new();
        for field in ProductField::ALL {
            if self.is_ignored(field) {
                continue;
            }
            let spec = match field {
                ProductField::Id => probe.id.map(ProductSpec::IdIs),
                ProductField::Name => probe
                    .name
                    .as_ref()
                    .map(|value| self.text_spec(TextField::Name, value)),
                ProductField::Price => probe.price.map(|value| ProductSpec::Price {
                    comparison: PriceComparison::Equal,
                    value,
                }),
                ProductField::Category => probe.category.map(ProductSpec::CategoryIs),
                ProductField::Description => probe
                    .description
                    .as_ref()
                    .map(|value| self.text_spec(TextField::Description, value)),
            };
            match (spec, self.null_handling) {
                (Some(spec), _) => specs.push(spec),
                (None, NullHandling::Include) => specs.push(ProductSpec::IsNull(field)),
                (None, NullHandling::Ignore) => {}
            }
        }
        ProductSpec::all_of(specs)
    }

    fn text_spec(&self, field: TextField, value: &str) -> ProductSpec {
        ProductSpec::Text {
            field,
            matcher: self.string_matcher,
            value: value.to_string(),
            ignore_case: self.ignore_case,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::product::Product;

    fn gadget() -> Product {
        Product {
            id: 2,
            name: "Gadget".to_string(),
            price: Decimal::from(20),
            category: 3,
            description: Some("blue".to_string()),
        }
    }

    #[test]
    fn empty_probe_matches_everything_when_nulls_are_ignored() {
        let spec = ExampleMatcher::matching().to_spec(&ProductProbe::default());
        assert!(spec.is_all());
    }

    #[test]
    fn name_only_probe_with_containing_matcher_equals_has_name() {
        let matcher = ExampleMatcher::matching()
            .with_string_matcher(StringMatcher::Containing)
            .with_ignore_case(true)
            .with_ignored_fields(&[ProductField::Id, ProductField::Description]);
        let probe = ProductProbe::default().with_name("adg");
        assert_eq!(matcher.to_spec(&probe), ProductSpec::has_name("adg"));
    }

    #[test]
    fn exact_matcher_is_case_sensitive_by_default() {
        let probe = ProductProbe::default().with_name("gadget");
        assert!(!ExampleMatcher::matching().to_spec(&probe).matches(&gadget()));
        let relaxed = ExampleMatcher::matching().with_ignore_case(true);
        assert!(relaxed.to_spec(&probe).matches(&gadget()));
    }

    #[test]
    fn ignored_fields_are_not_compared() {
        let probe = ProductProbe::default()
            .with_name("Gadget")
            .with_description("red");
        let matcher = ExampleMatcher::matching().with_ignored_fields(&[ProductField::Description]);
        assert!(matcher.to_spec(&probe).matches(&gadget()));
    }

    #[test]
    fn include_null_values_requires_unset_fields_to_be_null() {
        let probe = ProductProbe::default().with_name("Gadget");
        let matcher = ExampleMatcher::matching()
            .with_include_null_values()
            .with_ignored_fields(&[ProductField::Id, ProductField::Price, ProductField::Category]);
        assert!(!matcher.to_spec(&probe).matches(&gadget()));

        let mut plain = gadget();
        plain.description = None;
        assert!(matcher.to_spec(&probe).matches(&plain));
    }
}
