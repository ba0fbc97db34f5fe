//! Cart accumulator and checkout arithmetic.
//!
//! State for the sale in progress. Synchronous and owned by a single
//! terminal; persistence happens elsewhere.

pub mod cart;
pub mod checkout;

pub use cart::{AddOutcome, Cart, LineItem, NARROW_VIEWPORT_MAX_WIDTH, Viewport};
pub use checkout::{Checkout, CheckoutQuote, PendingSale, change};
