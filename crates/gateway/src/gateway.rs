use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kasir_auth::IdentityProvider;
use kasir_core::{ProductId, TransactionId};
use kasir_events::{AuthEvent, Subscription};
use kasir_products::{NewProduct, Product, ProductPatch};
use kasir_sales::{
    BestSeller, DailySales, NewTransaction, NewTransactionItem, RecordedTransaction, TodayStats,
    Transaction,
};

use crate::GatewayError;

/// Backend the terminal talks to: identity, catalog, sales, and dashboard
/// views.
///
/// Implementations must be shareable across tasks.
#[async_trait]
pub trait Gateway: IdentityProvider<Error = GatewayError> {
    /// Auth state changes, delivered after each sign-in or sign-out.
    fn auth_events(&self) -> Subscription<AuthEvent>;

    /// Products, newest first. `active_only` hides inactive ones.
    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, GatewayError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, GatewayError>;

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, GatewayError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError>;

    /// Transactions with the cashier joined, newest first, optionally bounded
    /// by `created_at` (both ends inclusive).
    async fn list_transactions(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Transaction>, GatewayError>;

    /// One transaction with cashier, items, and item products joined.
    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError>;

    /// Insert the transaction, then its items.
    async fn create_transaction(
        &self,
        transaction: NewTransaction,
        items: Vec<NewTransactionItem>,
    ) -> Result<RecordedTransaction, GatewayError>;

    async fn today_stats(&self, since: DateTime<Utc>) -> Result<TodayStats, GatewayError>;

    async fn best_selling(&self, limit: usize) -> Result<Vec<BestSeller>, GatewayError>;

    /// Newest day first.
    async fn daily_sales(&self, days: usize) -> Result<Vec<DailySales>, GatewayError>;
}
