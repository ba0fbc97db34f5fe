use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kasir_core::{Money, ProductId};

/// Name prefilled in the product form; every menu item is a variant of it.
pub const DEFAULT_PRODUCT_NAME: &str = "Es Coklat";

/// A menu product as stored by the gateway (`products` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub variant: String,
    /// Unit price in the smallest currency unit.
    pub price: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Inactive products stay in the catalog but cannot be rung up.
    pub fn can_be_sold(&self) -> bool {
        self.is_active
    }

    /// `"{name} {variant}"`, as printed on receipts.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.variant)
    }

    /// Apply a partial update in place (what the gateway does on `PATCH`).
    pub fn apply_patch(&mut self, patch: &ProductPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(variant) = &patch.variant {
            self.variant.clone_from(variant);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }
}

/// Insert payload for a new product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub variant: String,
    pub price: Money,
    pub is_active: bool,
}

impl NewProduct {
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            variant: self.variant,
            price: self.price,
            is_active: self.is_active,
            created_at,
        }
    }
}

/// Partial update payload; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Patch that flips the product's active flag.
    pub fn toggle_active(product: &Product) -> Self {
        Self {
            is_active: Some(!product.is_active),
            ..Self::default()
        }
    }
}

impl From<NewProduct> for ProductPatch {
    fn from(value: NewProduct) -> Self {
        Self {
            name: Some(value.name),
            variant: Some(value.variant),
            price: Some(value.price),
            is_active: Some(value.is_active),
        }
    }
}

/// Per-field validation failures of a [`ProductForm`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductValidation {
    pub name: Option<&'static str>,
    pub variant: Option<&'static str>,
    pub price: Option<&'static str>,
}

impl ProductValidation {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.variant.is_none() && self.price.is_none()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        [self.name, self.variant, self.price].into_iter().flatten().collect()
    }
}

impl core::fmt::Display for ProductValidation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid product: {}", self.messages().join(", "))
    }
}

impl std::error::Error for ProductValidation {}

/// Raw admin form input, validated into a [`NewProduct`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub variant: String,
    /// Price as typed; parsed on validation.
    pub price: String,
    pub is_active: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRODUCT_NAME.to_string(),
            variant: String::new(),
            price: String::new(),
            is_active: true,
        }
    }
}

impl ProductForm {
    /// Prefill the form for editing an existing product.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            variant: product.variant.clone(),
            price: product.price.amount().to_string(),
            is_active: product.is_active,
        }
    }

    pub fn validate(&self) -> Result<NewProduct, ProductValidation> {
        let mut errors = ProductValidation::default();

        if self.name.trim().is_empty() {
            errors.name = Some("product name is required");
        }
        if self.variant.is_empty() {
            errors.variant = Some("variant is required");
        }
        let price = Money::parse_input(&self.price);
        if price.amount() <= 0 {
            errors.price = Some("price must be greater than 0");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewProduct {
            name: self.name.clone(),
            variant: self.variant.clone(),
            price,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        Product {
            id: ProductId::new(),
            name: DEFAULT_PRODUCT_NAME.to_string(),
            variant: "Matcha".to_string(),
            price: Money::new(12_000),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn default_form_is_prefilled_and_active() {
        let form = ProductForm::default();
        assert_eq!(form.name, "Es Coklat");
        assert!(form.is_active);
        assert!(form.variant.is_empty());
    }

    #[test]
    fn valid_form_produces_new_product() {
        let form = ProductForm {
            variant: "Taro".to_string(),
            price: "15000".to_string(),
            ..ProductForm::default()
        };

        let product = form.validate().unwrap();
        assert_eq!(product.price, Money::new(15_000));
        assert_eq!(product.variant, "Taro");
    }

    #[test]
    fn invalid_form_reports_every_field() {
        let form = ProductForm {
            name: "   ".to_string(),
            variant: String::new(),
            price: "0".to_string(),
            is_active: true,
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.name.is_some());
        assert!(errors.variant.is_some());
        assert!(errors.price.is_some());
        assert_eq!(errors.messages().len(), 3);
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let form = ProductForm {
            variant: "Oreo".to_string(),
            price: "gratis".to_string(),
            ..ProductForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.messages(), vec!["price must be greater than 0"]);
    }

    #[test]
    fn edit_form_round_trips_product_fields() {
        let product = sample_product();
        let form = ProductForm::from_product(&product);
        let validated = form.validate().unwrap();
        assert_eq!(validated.price, product.price);
        assert_eq!(validated.variant, product.variant);
    }

    #[test]
    fn toggle_patch_flips_active_only() {
        let mut product = sample_product();
        let patch = ProductPatch::toggle_active(&product);
        product.apply_patch(&patch);
        assert!(!product.is_active);
        assert_eq!(product.price, Money::new(12_000));

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "is_active": false }));
    }
}
