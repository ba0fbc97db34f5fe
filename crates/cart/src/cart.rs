use serde::Serialize;

use kasir_core::{Money, ProductId};
use kasir_products::Product;
use kasir_sales::{NewTransactionItem, ReceiptLine};

/// Viewports narrower than this surface the cart drawer on every add.
pub const NARROW_VIEWPORT_MAX_WIDTH: u32 = 1024;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Viewport {
    Narrow,
    #[default]
    Wide,
}

impl Viewport {
    pub fn from_width(width: u32) -> Self {
        if width < NARROW_VIEWPORT_MAX_WIDTH {
            Self::Narrow
        } else {
            Self::Wide
        }
    }
}

/// One product in the cart.
///
/// `subtotal` is derived; every quantity change recomputes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    product_id: ProductId,
    name: String,
    variant: String,
    price: Money,
    quantity: u32,
    subtotal: Money,
}

impl LineItem {
    fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            variant: product.variant.clone(),
            price: product.price,
            quantity: 1,
            subtotal: product.price,
        }
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.subtotal = self.price.times(quantity);
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn to_transaction_item(&self) -> NewTransactionItem {
        NewTransactionItem {
            product_id: self.product_id,
            qty: self.quantity,
            price: self.price,
            subtotal: self.subtotal,
        }
    }

    pub fn to_receipt_line(&self) -> ReceiptLine {
        ReceiptLine {
            name: self.name.clone(),
            variant: self.variant.clone(),
            qty: self.quantity,
            price: self.price,
            subtotal: self.subtotal,
        }
    }
}

/// Result of [`Cart::add`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Quantity of the product after the add.
    pub quantity: u32,
    /// The drawer was opened because the viewport is narrow.
    pub surfaced: bool,
}

/// Line items for the sale in progress, in insertion order, at most one per
/// product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
    viewport: Viewport,
    open: bool,
}

impl Cart {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            items: Vec::new(),
            viewport,
            open: false,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Add one unit of `product`, creating its line if needed.
    pub fn add(&mut self, product: &Product) -> AddOutcome {
        let quantity = match self.position(product.id) {
            Some(idx) => {
                let line = &mut self.items[idx];
                let next = line.quantity.saturating_add(1);
                line.set_quantity(next);
                next
            }
            None => {
                self.items.push(LineItem::from_product(product));
                1
            }
        };

        let surfaced = self.viewport == Viewport::Narrow;
        if surfaced {
            self.open = true;
        }

        tracing::debug!(product_id = %product.id, quantity, "cart add");
        AddOutcome { quantity, surfaced }
    }

    /// Overwrite a line's quantity; zero or less removes it. Unknown products
    /// are ignored.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }

        if let Some(idx) = self.position(product_id) {
            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            self.items[idx].set_quantity(quantity);
            tracing::debug!(%product_id, quantity, "cart set quantity");
        }
    }

    pub fn increment(&mut self, product_id: ProductId) {
        if let Some(line) = self.get(product_id) {
            let next = i64::from(line.quantity) + 1;
            self.set_quantity(product_id, next);
        }
    }

    pub fn decrement(&mut self, product_id: ProductId) {
        if let Some(line) = self.get(product_id) {
            let next = i64::from(line.quantity) - 1;
            self.set_quantity(product_id, next);
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        if self.items.len() != before {
            tracing::debug!(%product_id, "cart remove");
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ subtotals.
    pub fn total(&self) -> Money {
        self.items.iter().map(|line| line.subtotal).sum()
    }

    /// Σ quantities.
    pub fn count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.items.iter().position(|line| line.product_id == product_id)
    }
}
