//! Catalog browsing: search and variant filtering over a fetched product list.

use core::convert::Infallible;
use core::str::FromStr;

use crate::product::Product;

/// Menu variants offered by the shop, in display order.
pub const VARIANTS: [&str; 12] = [
    "Original",
    "Matcha",
    "Taro",
    "Strawberry",
    "Hazelnut",
    "Oreo",
    "Coklat Susu",
    "Coklat Keju",
    "Coklat Kacang",
    "White Coklat",
    "Coklat Mocha",
    "Coklat Caramel",
];

/// Label of the "no variant filter" chip.
pub const ALL_VARIANTS: &str = "All";

/// Variant chip selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VariantFilter {
    #[default]
    All,
    Only(String),
}

impl VariantFilter {
    pub fn matches(&self, variant: &str) -> bool {
        match self {
            VariantFilter::All => true,
            VariantFilter::Only(wanted) => wanted == variant,
        }
    }
}

impl FromStr for VariantFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == ALL_VARIANTS {
            Ok(VariantFilter::All)
        } else {
            Ok(VariantFilter::Only(s.to_string()))
        }
    }
}

/// Filter applied to a product list before display.
///
/// The cashier screen uses search + variant; the admin screen uses search +
/// the "show inactive" toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: String,
    pub variant: VariantFilter,
    pub include_inactive: bool,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn variant(mut self, variant: VariantFilter) -> Self {
        self.variant = variant;
        self
    }

    pub fn include_inactive(mut self, include: bool) -> Self {
        self.include_inactive = include;
        self
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.is_active {
            return false;
        }

        if !self.search.is_empty() {
            let query = self.search.to_lowercase();
            let hit = product.name.to_lowercase().contains(&query)
                || product.variant.to_lowercase().contains(&query);
            if !hit {
                return false;
            }
        }

        self.variant.matches(&product.variant)
    }

    /// Keep matching products, preserving input order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}
