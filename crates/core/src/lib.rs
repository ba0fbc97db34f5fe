//! `kasir-core`: identifiers, money, and the domain error model shared by
//! every other crate. No IO lives here.

pub mod error;
pub mod id;
pub mod money;

pub use error::DomainError;
pub use id::{ProductId, TransactionId, UserId};
pub use money::Money;
