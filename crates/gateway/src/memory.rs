//! In-process gateway for demos and tests.
//!
//! Keeps every table in memory behind one `RwLock` and reproduces what the
//! hosted backend does on its side: joins, receipt numbering, the dashboard
//! views, and the auth event stream.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use secrecy::{ExposeSecret, SecretString};

use kasir_auth::{AuthUser, IdentityProvider, Role, UserProfile};
use kasir_core::{DomainError, Money, ProductId, TransactionId, UserId};
use kasir_events::{AuthEvent, EventBus, InMemoryEventBus, Subscription};
use kasir_products::{NewProduct, Product, ProductPatch};
use kasir_sales::{
    BestSeller, CashierRef, DailySales, NewTransaction, NewTransactionItem, ProductRef,
    RecordedTransaction, TodayStats, Transaction, best_sellers, daily_sales, transaction_code,
};

use crate::{Gateway, GatewayError, seed};

#[derive(Debug)]
struct Account {
    email: String,
    password: SecretString,
    profile: UserProfile,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<Account>,
    current: Option<AuthUser>,
    products: Vec<Product>,
    transactions: Vec<Transaction>,
}

impl Tables {
    fn profile(&self, user_id: UserId) -> Option<&UserProfile> {
        self.accounts
            .iter()
            .map(|a| &a.profile)
            .find(|p| p.id == user_id)
    }

    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}

#[derive(Debug)]
pub struct InMemoryGateway {
    tables: RwLock<Tables>,
    events: InMemoryEventBus<AuthEvent>,
    offset: FixedOffset,
}

impl InMemoryGateway {
    /// Empty backend; `offset` is the shop's local time zone, used for
    /// receipt numbering and the daily sales view.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            events: InMemoryEventBus::new(),
            offset,
        }
    }

    /// Seed one active product per menu variant.
    pub fn with_demo_menu(mut self) -> Self {
        let now = Utc::now();
        let tables = self.tables_mut();
        for (i, draft) in seed::demo_menu().into_iter().enumerate() {
            // First variant newest, so newest-first listings follow menu order.
            let created_at = now - Duration::seconds(i as i64);
            tables.products.push(draft.into_product(ProductId::new(), created_at));
        }
        self
    }

    /// Register a staff account that can sign in with `email`/`password`.
    pub fn with_staff(
        mut self,
        email: &str,
        password: SecretString,
        full_name: &str,
        role: Role,
    ) -> Self {
        let profile = UserProfile {
            id: UserId::new(),
            email: Some(email.to_string()),
            full_name: Some(full_name.to_string()),
            role,
        };
        self.tables_mut().accounts.push(Account {
            email: email.to_string(),
            password,
            profile,
        });
        self
    }

    /// Profile registered for `email`, if any.
    pub fn staff(&self, email: &str) -> Option<UserProfile> {
        let tables = self.tables.read().ok()?;
        tables
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .map(|a| a.profile.clone())
    }

    fn tables_mut(&mut self) -> &mut Tables {
        match self.tables.get_mut() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, GatewayError> {
        self.tables
            .read()
            .map_err(|_| GatewayError::Storage("in-memory tables poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, GatewayError> {
        self.tables
            .write()
            .map_err(|_| GatewayError::Storage("in-memory tables poisoned".to_string()))
    }

    fn publish(&self, event: AuthEvent) -> Result<(), GatewayError> {
        self.events
            .publish(event)
            .map_err(|e| GatewayError::Storage(e.to_string()))
    }
}

/// Reject payloads whose amounts do not add up.
fn check_amounts(tx: &NewTransaction, items: &[NewTransactionItem]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::rejected("transaction has no items"));
    }
    for item in items {
        if item.qty == 0 {
            return Err(DomainError::rejected("item quantity must be positive"));
        }
        if item.subtotal != item.price.times(item.qty) {
            return Err(DomainError::inconsistent("item subtotal != price x qty"));
        }
    }
    let total: Money = items.iter().map(|i| i.subtotal).sum();
    if total != tx.total {
        return Err(DomainError::inconsistent("transaction total != sum of subtotals"));
    }
    if tx.change != tx.paid - tx.total || tx.change.is_negative() {
        return Err(DomainError::inconsistent("change must be paid - total and not negative"));
    }
    Ok(())
}

#[async_trait]
impl IdentityProvider for InMemoryGateway {
    type Error = GatewayError;

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, GatewayError> {
        let user = {
            let mut tables = self.write()?;
            let account = tables
                .accounts
                .iter()
                .find(|a| {
                    a.email.eq_ignore_ascii_case(email)
                        && a.password.expose_secret() == password.expose_secret()
                })
                .ok_or_else(|| GatewayError::Unauthorized("invalid login credentials".to_string()))?;
            let user = AuthUser {
                id: account.profile.id,
                email: Some(account.email.clone()),
            };
            tables.current = Some(user.clone());
            user
        };

        tracing::info!(user_id = %user.id, "in-memory sign-in");
        self.publish(AuthEvent::signed_in(user.id))?;
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.write()?.current = None;
        self.publish(AuthEvent::signed_out())
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, GatewayError> {
        Ok(self.read()?.current.clone())
    }

    async fn user_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, GatewayError> {
        Ok(self.read()?.profile(user_id).cloned())
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    fn auth_events(&self) -> Subscription<AuthEvent> {
        self.events.subscribe()
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, GatewayError> {
        let tables = self.read()?;
        let mut products: Vec<Product> = tables
            .products
            .iter()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        self.read()?
            .product(id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("product {id}")))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, GatewayError> {
        let product = product.into_product(ProductId::new(), Utc::now());
        self.write()?.products.push(product.clone());
        tracing::info!(product_id = %product.id, variant = %product.variant, "product created");
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, GatewayError> {
        let mut tables = self.write()?;
        let product = tables
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GatewayError::not_found(format!("product {id}")))?;
        product.apply_patch(&patch);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError> {
        let mut tables = self.write()?;
        let referenced = tables
            .transactions
            .iter()
            .flat_map(|tx| tx.items.iter())
            .any(|item| item.product_id == id);
        if referenced {
            return Err(GatewayError::Api(
                409,
                format!("product {id} is referenced by transaction items"),
            ));
        }

        let before = tables.products.len();
        tables.products.retain(|p| p.id != id);
        if tables.products.len() == before {
            return Err(GatewayError::not_found(format!("product {id}")));
        }
        Ok(())
    }

    async fn list_transactions(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let tables = self.read()?;
        let mut rows: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|tx| start.is_none_or(|s| tx.created_at >= s))
            .filter(|tx| end.is_none_or(|e| tx.created_at <= e))
            .map(|tx| Transaction {
                items: Vec::new(),
                ..tx.clone()
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        self.read()?
            .transactions
            .iter()
            .find(|tx| tx.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(format!("transaction {id}")))
    }

    async fn create_transaction(
        &self,
        transaction: NewTransaction,
        items: Vec<NewTransactionItem>,
    ) -> Result<RecordedTransaction, GatewayError> {
        check_amounts(&transaction, &items)?;

        let mut tables = self.write()?;
        let now = Utc::now();
        let today = now.with_timezone(&self.offset).date_naive();
        let sequence = tables
            .transactions
            .iter()
            .filter(|tx| tx.created_at.with_timezone(&self.offset).date_naive() == today)
            .count() as u32
            + 1;
        let id = TransactionId::new();

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let product = tables
                .product(item.product_id)
                .ok_or_else(|| GatewayError::not_found(format!("product {}", item.product_id)))?;
            let product_ref = ProductRef {
                name: product.name.clone(),
                variant: product.variant.clone(),
            };
            let mut row = item.into_item(id);
            row.product = Some(product_ref);
            rows.push(row);
        }

        let row = Transaction {
            id,
            transaction_code: transaction_code(today, sequence),
            user_id: transaction.user_id,
            total: transaction.total,
            paid: transaction.paid,
            change: transaction.change,
            created_at: now,
            cashier: None,
            items: Vec::new(),
        };

        let cashier = transaction
            .user_id
            .and_then(|uid| tables.profile(uid))
            .map(|p| CashierRef {
                full_name: p.full_name.clone(),
                email: p.email.clone(),
            });
        tables.transactions.push(Transaction {
            cashier,
            items: rows.clone(),
            ..row.clone()
        });

        tracing::info!(
            transaction_id = %id,
            code = %row.transaction_code,
            total = row.total.amount(),
            "transaction recorded"
        );

        let items = rows
            .into_iter()
            .map(|mut item| {
                item.product = None;
                item
            })
            .collect();
        Ok(RecordedTransaction {
            transaction: row,
            items,
        })
    }

    async fn today_stats(&self, since: DateTime<Utc>) -> Result<TodayStats, GatewayError> {
        Ok(TodayStats::compute(&self.read()?.transactions, since))
    }

    async fn best_selling(&self, limit: usize) -> Result<Vec<BestSeller>, GatewayError> {
        let tables = self.read()?;
        Ok(best_sellers(&tables.transactions, &tables.products, limit))
    }

    async fn daily_sales(&self, days: usize) -> Result<Vec<DailySales>, GatewayError> {
        Ok(daily_sales(&self.read()?.transactions, self.offset, days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_sales::start_of_day;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn gateway() -> InMemoryGateway {
        InMemoryGateway::new(wib())
            .with_demo_menu()
            .with_staff("admin@kasir.test", secret("admin123"), "Admin", Role::Admin)
            .with_staff("sari@kasir.test", secret("kasir123"), "Sari", Role::Cashier)
    }

    fn sale(product: &Product, qty: u32, paid: i64) -> (NewTransaction, Vec<NewTransactionItem>) {
        let subtotal = product.price.times(qty);
        (
            NewTransaction {
                total: subtotal,
                paid: Money::new(paid),
                change: Money::new(paid) - subtotal,
                user_id: None,
            },
            vec![NewTransactionItem {
                product_id: product.id,
                qty,
                price: product.price,
                subtotal,
            }],
        )
    }

    #[tokio::test]
    async fn sign_in_checks_password_and_emits_event() {
        let gw = gateway();
        let events = gw.auth_events();

        let err = gw.sign_in("sari@kasir.test", &secret("wrong")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized(_)));
        assert!(events.drain().is_empty());

        let user = gw.sign_in("SARI@kasir.test", &secret("kasir123")).await.unwrap();
        assert_eq!(gw.current_user().await.unwrap(), Some(user.clone()));
        let profile = gw.user_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.role, Role::Cashier);
        assert!(matches!(events.drain().as_slice(), [AuthEvent::SignedIn { .. }]));

        gw.sign_out().await.unwrap();
        assert!(gw.current_user().await.unwrap().is_none());
        assert!(matches!(events.drain().as_slice(), [AuthEvent::SignedOut { .. }]));
    }

    #[tokio::test]
    async fn product_crud() {
        let gw = gateway();
        assert_eq!(gw.list_products(true).await.unwrap().len(), 12);

        let created = gw
            .create_product(NewProduct {
                name: "Es Coklat".to_string(),
                variant: "Matcha".to_string(),
                price: Money::new(18_000),
                is_active: true,
            })
            .await
            .unwrap();
        assert_eq!(gw.list_products(true).await.unwrap()[0].id, created.id);

        let toggled = gw
            .update_product(created.id, ProductPatch::toggle_active(&created))
            .await
            .unwrap();
        assert!(!toggled.is_active);
        assert_eq!(gw.list_products(true).await.unwrap().len(), 12);
        assert_eq!(gw.list_products(false).await.unwrap().len(), 13);

        gw.delete_product(created.id).await.unwrap();
        assert!(matches!(
            gw.get_product(created.id).await,
            Err(GatewayError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn recorded_sales_feed_history_and_dashboard() {
        let gw = gateway();
        let products = gw.list_products(true).await.unwrap();
        let sari = gw.staff("sari@kasir.test").unwrap();

        let (mut tx, items) = sale(&products[0], 2, 50_000);
        tx.user_id = Some(sari.id);
        let first = gw.create_transaction(tx, items).await.unwrap();
        let (tx, items) = sale(&products[1], 1, products[1].price.amount());
        let second = gw.create_transaction(tx, items).await.unwrap();

        assert!(first.transaction.transaction_code.ends_with("-0001"));
        assert!(second.transaction.transaction_code.ends_with("-0002"));
        assert_eq!(first.items.len(), 1);
        assert_eq!(first.items[0].transaction_id, Some(first.transaction.id));

        let listed = gw.list_transactions(None, None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.transaction.id);
        assert_eq!(listed[1].cashier_name(), Some("Sari"));
        assert!(listed[1].items.is_empty());

        let detail = gw.get_transaction(first.transaction.id).await.unwrap();
        assert_eq!(detail.items[0].product.as_ref().unwrap().variant, products[0].variant);

        let since = start_of_day(Utc::now(), wib());
        let stats = gw.today_stats(since).await.unwrap();
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(
            stats.total_revenue,
            products[0].price.times(2) + products[1].price
        );

        let best = gw.best_selling(5).await.unwrap();
        assert_eq!(best[0].id, products[0].id);
        assert_eq!(best[0].total_sold, 2);

        let days = gw.daily_sales(7).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].total_transactions, 2);
    }

    #[tokio::test]
    async fn rejects_inconsistent_amounts() {
        let gw = gateway();
        let products = gw.list_products(true).await.unwrap();
        let (mut tx, items) = sale(&products[0], 1, 100_000);
        tx.total = Money::new(1);

        let err = gw.create_transaction(tx, items).await.unwrap_err();
        assert!(matches!(err, GatewayError::Domain(_)));
        assert!(gw.list_transactions(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_hugely_negative_payment() {
        let gw = gateway();
        let products = gw.list_products(true).await.unwrap();
        let (mut tx, items) = sale(&products[0], 1, -i64::MAX);
        tx.change = Money::new(i64::MAX - 5_000);

        let err = gw.create_transaction(tx, items.clone()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Domain(_)));

        let (tx, items) = sale(&products[0], 1, -i64::MAX);
        assert!(gw.create_transaction(tx, items).await.is_err());
        assert!(gw.list_transactions(None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sold_products_cannot_be_deleted() {
        let gw = gateway();
        let products = gw.list_products(true).await.unwrap();
        let (tx, items) = sale(&products[3], 1, 20_000);
        gw.create_transaction(tx, items).await.unwrap();

        let err = gw.delete_product(products[3].id).await.unwrap_err();
        assert!(matches!(err, GatewayError::Api(409, _)));
    }

    #[tokio::test]
    async fn list_transactions_respects_bounds() {
        let gw = gateway();
        let products = gw.list_products(true).await.unwrap();
        let (tx, items) = sale(&products[0], 1, 20_000);
        gw.create_transaction(tx, items).await.unwrap();

        let future = Utc::now() + Duration::hours(1);
        assert!(gw.list_transactions(Some(future), None).await.unwrap().is_empty());
        assert_eq!(gw.list_transactions(None, Some(future)).await.unwrap().len(), 1);
    }
}
