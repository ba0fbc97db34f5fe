//! One cashier terminal: session, menu, cart, and checkout over a gateway.
//!
//! Every screen action maps to a method here. Cart edits are synchronous;
//! anything that reaches the gateway is async and fails with
//! [`TerminalError`] without touching local state.

use std::sync::Arc;

use chrono::{FixedOffset, Utc};
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

use kasir_auth::{Route, RouteDecision, Session, SessionError, guard};
use kasir_cart::{AddOutcome, Cart, Checkout, CheckoutQuote, Viewport};
use kasir_core::{ProductId, TransactionId};
use kasir_events::{AuthEvent, Subscription};
use kasir_gateway::{Gateway, GatewayError};
use kasir_products::{CatalogFilter, Product, ProductForm, ProductPatch, ProductValidation};
use kasir_sales::{
    BEST_SELLER_LIMIT, DAILY_SALES_DAYS, Dashboard, HistoryFilter, HistorySummary, Receipt,
    ShopInfo, Transaction, start_of_day,
};

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    InvalidProduct(#[from] ProductValidation),

    #[error("product {0} is not on sale")]
    ProductUnavailable(ProductId),
}

/// Result of asking to check out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The sale was recorded; the cart is empty again.
    Completed(Receipt),
    /// Empty cart or not enough paid. Nothing was sent.
    Disabled(CheckoutQuote),
}

/// Filtered history with its header figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    pub transactions: Vec<Transaction>,
    pub summary: HistorySummary,
}

/// Static terminal settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalSettings {
    pub viewport: Viewport,
    pub offset: FixedOffset,
    pub shop: ShopInfo,
}

pub struct Terminal {
    gateway: Arc<dyn Gateway>,
    events: Subscription<AuthEvent>,
    settings: TerminalSettings,
    session: Session,
    menu: Vec<Product>,
    cart: Cart,
    checkout: Checkout,
}

impl Terminal {
    pub fn new(gateway: Arc<dyn Gateway>, settings: TerminalSettings) -> Self {
        let events = gateway.auth_events();
        let cart = Cart::new(settings.viewport);
        Self {
            gateway,
            events,
            settings,
            session: Session::new(),
            menu: Vec::new(),
            cart,
            checkout: Checkout::new(),
        }
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn checkout_state(&self) -> &Checkout {
        &self.checkout
    }

    // ── session ──────────────────────────────────────────────────────────

    /// Initial session check at startup.
    pub async fn restore(&mut self) -> Result<(), TerminalError> {
        self.session.refresh(&*self.gateway).await?;
        Ok(())
    }

    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<(), TerminalError> {
        self.session.sign_in(&*self.gateway, email, password).await?;
        // Our own sign-in is already reflected; skip its echo.
        self.events.drain();
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), TerminalError> {
        let result = self.session.sign_out(&*self.gateway).await;
        self.events.drain();
        self.menu.clear();
        self.cart.clear();
        self.checkout.cancel();
        result.map_err(TerminalError::from)
    }

    /// Apply auth changes made elsewhere (another tab, token expiry).
    pub async fn sync_auth(&mut self) -> Result<usize, TerminalError> {
        Ok(self.session.sync(&*self.gateway, &self.events).await?)
    }

    pub fn guard(&self, route: Route) -> RouteDecision {
        guard(route, &self.session)
    }

    // ── menu & cart ──────────────────────────────────────────────────────

    /// Fetch the active menu.
    pub async fn load_menu(&mut self) -> Result<&[Product], TerminalError> {
        self.session.require_user()?;
        self.menu = self.gateway.list_products(true).await?;
        Ok(&self.menu)
    }

    pub fn menu(&self, filter: &CatalogFilter) -> Vec<&Product> {
        filter.apply(&self.menu)
    }

    /// Ring up one unit of a menu product. Inactive or unknown products are
    /// refused.
    pub fn add_to_cart(&mut self, product_id: ProductId) -> Result<AddOutcome, TerminalError> {
        let product = self
            .menu
            .iter()
            .find(|p| p.id == product_id)
            .filter(|p| p.can_be_sold())
            .ok_or(TerminalError::ProductUnavailable(product_id))?;
        Ok(self.cart.add(product))
    }

    // ── checkout ─────────────────────────────────────────────────────────

    pub fn begin_checkout(&mut self) {
        self.checkout.begin();
    }

    pub fn enter_paid(&mut self, input: &str) -> CheckoutQuote {
        self.checkout.set_paid_input(input);
        self.quote()
    }

    pub fn cancel_checkout(&mut self) {
        self.checkout.cancel();
    }

    pub fn quote(&self) -> CheckoutQuote {
        self.checkout.quote(&self.cart)
    }

    /// Record the sale if checkout is enabled.
    ///
    /// On gateway failure the cart and amount paid are kept for a retry.
    pub async fn checkout(&mut self) -> Result<CheckoutOutcome, TerminalError> {
        let cashier = self.session.require_user()?.id;
        let Some(sale) = self.checkout.prepare(&self.cart, Some(cashier)) else {
            return Ok(CheckoutOutcome::Disabled(self.quote()));
        };

        let recorded = match self
            .gateway
            .create_transaction(sale.transaction, sale.items)
            .await
        {
            Ok(recorded) => recorded,
            Err(err) => {
                tracing::error!(error = %err, "failed to record transaction");
                return Err(err.into());
            }
        };

        self.checkout.complete(&mut self.cart);
        Ok(CheckoutOutcome::Completed(Receipt::with_lines(
            &recorded.transaction,
            sale.lines,
        )))
    }

    pub fn render_receipt(&self, receipt: &Receipt) -> String {
        receipt.render_text(&self.settings.shop, self.settings.offset)
    }

    // ── history & dashboard ──────────────────────────────────────────────

    /// Date bounds go to the gateway; the text search runs locally.
    pub async fn history(&self, filter: &HistoryFilter) -> Result<History, TerminalError> {
        self.session.require_user()?;
        let rows = self
            .gateway
            .list_transactions(filter.lower_bound(), filter.upper_bound())
            .await?;
        let transactions: Vec<Transaction> = rows.into_iter().filter(|t| filter.matches(t)).collect();
        let summary = HistorySummary::of(&transactions);
        Ok(History {
            transactions,
            summary,
        })
    }

    pub async fn transaction(&self, id: TransactionId) -> Result<Transaction, TerminalError> {
        self.session.require_user()?;
        Ok(self.gateway.get_transaction(id).await?)
    }

    pub async fn receipt(&self, id: TransactionId) -> Result<Receipt, TerminalError> {
        let tx = self.transaction(id).await?;
        Ok(Receipt::from_transaction(&tx))
    }

    pub async fn dashboard(&self) -> Result<Dashboard, TerminalError> {
        self.session.require_user()?;
        let since = start_of_day(Utc::now(), self.settings.offset);
        let (today, best_sellers, daily_sales) = tokio::try_join!(
            self.gateway.today_stats(since),
            self.gateway.best_selling(BEST_SELLER_LIMIT),
            self.gateway.daily_sales(DAILY_SALES_DAYS),
        )?;
        Ok(Dashboard {
            today,
            best_sellers,
            daily_sales,
        })
    }

    // ── product admin ────────────────────────────────────────────────────

    /// Every product, inactive ones included, filtered for the admin screen.
    pub async fn products(&self, filter: &CatalogFilter) -> Result<Vec<Product>, TerminalError> {
        self.session.require_admin()?;
        let all = self.gateway.list_products(false).await?;
        Ok(filter.apply(&all).into_iter().cloned().collect())
    }

    pub async fn create_product(&mut self, form: &ProductForm) -> Result<Product, TerminalError> {
        self.session.require_admin()?;
        let draft = form.validate()?;
        let product = self.gateway.create_product(draft).await?;
        self.refresh_menu_entry(&product);
        Ok(product)
    }

    pub async fn update_product(
        &mut self,
        id: ProductId,
        form: &ProductForm,
    ) -> Result<Product, TerminalError> {
        self.session.require_admin()?;
        let patch = ProductPatch::from(form.validate()?);
        let product = self.gateway.update_product(id, patch).await?;
        self.refresh_menu_entry(&product);
        Ok(product)
    }

    pub async fn toggle_product(&mut self, id: ProductId) -> Result<Product, TerminalError> {
        self.session.require_admin()?;
        let current = self.gateway.get_product(id).await?;
        let product = self
            .gateway
            .update_product(id, ProductPatch::toggle_active(&current))
            .await?;
        self.refresh_menu_entry(&product);
        Ok(product)
    }

    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), TerminalError> {
        self.session.require_admin()?;
        self.gateway.delete_product(id).await?;
        self.menu.retain(|p| p.id != id);
        Ok(())
    }

    /// Keep the cached menu in step with an admin edit.
    fn refresh_menu_entry(&mut self, product: &Product) {
        self.menu.retain(|p| p.id != product.id);
        if product.is_active {
            self.menu.insert(0, product.clone());
        }
    }
}
