use serde::Serialize;

use kasir_core::{Money, UserId};
use kasir_sales::{NewTransaction, NewTransactionItem, ReceiptLine};

use crate::cart::Cart;

/// `paid - total`; negative means the customer has not paid enough.
pub fn change(paid: Money, total: Money) -> Money {
    paid - total
}

/// What the checkout dialog shows for the current cart and amount paid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutQuote {
    pub total: Money,
    pub paid: Money,
    pub change: Money,
    /// Non-empty cart and `paid >= total`.
    pub enabled: bool,
}

impl CheckoutQuote {
    pub fn evaluate(cart: &Cart, paid: Money) -> Self {
        let total = cart.total();
        let change = change(paid, total);
        Self {
            total,
            paid,
            change,
            enabled: !cart.is_empty() && change >= Money::ZERO,
        }
    }

    pub fn is_underpaid(&self) -> bool {
        self.change.is_negative()
    }

    /// `Rp 5.000`, or `Rp 5.000 (Kurang)` when short.
    pub fn change_label(&self) -> String {
        if self.is_underpaid() {
            format!("{} (Kurang)", self.change.abs())
        } else {
            self.change.to_string()
        }
    }
}

/// A sale ready to hand to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSale {
    pub transaction: NewTransaction,
    pub items: Vec<NewTransactionItem>,
    /// Cart lines as they were at checkout, for the receipt.
    pub lines: Vec<ReceiptLine>,
}

/// Amount paid and dialog state for the sale in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkout {
    paid: Money,
    dialog_open: bool,
}

impl Checkout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paid(&self) -> Money {
        self.paid
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn begin(&mut self) {
        self.dialog_open = true;
    }

    pub fn set_paid(&mut self, paid: Money) {
        self.paid = paid;
    }

    /// Set the amount paid from the cashier's text input.
    pub fn set_paid_input(&mut self, input: &str) {
        self.paid = Money::parse_input(input);
    }

    /// Close the dialog without paying; the cart is untouched.
    pub fn cancel(&mut self) {
        self.dialog_open = false;
        self.paid = Money::ZERO;
    }

    pub fn quote(&self, cart: &Cart) -> CheckoutQuote {
        CheckoutQuote::evaluate(cart, self.paid)
    }

    /// Build the gateway payload, or `None` when checkout is disabled.
    pub fn prepare(&self, cart: &Cart, cashier: Option<UserId>) -> Option<PendingSale> {
        let quote = self.quote(cart);
        if !quote.enabled {
            return None;
        }

        Some(PendingSale {
            transaction: NewTransaction {
                total: quote.total,
                paid: quote.paid,
                change: quote.change,
                user_id: cashier,
            },
            items: cart.items().iter().map(|l| l.to_transaction_item()).collect(),
            lines: cart.items().iter().map(|l| l.to_receipt_line()).collect(),
        })
    }

    /// The sale was persisted: clear the cart and reset for the next one.
    pub fn complete(&mut self, cart: &mut Cart) {
        cart.clear();
        self.paid = Money::ZERO;
        self.dialog_open = false;
        tracing::info!("checkout completed");
    }
}
