//! Products / catalog domain module.
//!
//! Product records as the gateway stores them, admin form validation, and the
//! filters used to browse the menu. Pure logic, no IO.

pub mod catalog;
pub mod product;

pub use catalog::{ALL_VARIANTS, CatalogFilter, VARIANTS, VariantFilter};
pub use product::{
    DEFAULT_PRODUCT_NAME, NewProduct, Product, ProductForm, ProductPatch, ProductValidation,
};
