//! Demo data for running without a backend.

use kasir_core::Money;
use kasir_products::{DEFAULT_PRODUCT_NAME, NewProduct, VARIANTS};

/// One active product per variant. Plain chocolate is the cheapest; the
/// premium variants cost more.
pub fn demo_menu() -> Vec<NewProduct> {
    VARIANTS
        .iter()
        .map(|variant| NewProduct {
            name: DEFAULT_PRODUCT_NAME.to_string(),
            variant: (*variant).to_string(),
            price: Money::new(demo_price(variant)),
            is_active: true,
        })
        .collect()
}

fn demo_price(variant: &str) -> i64 {
    match variant {
        "Original" => 10_000,
        "Hazelnut" | "Coklat Keju" | "Coklat Caramel" => 15_000,
        "Matcha" | "Taro" | "Oreo" => 13_000,
        _ => 12_000,
    }
}
