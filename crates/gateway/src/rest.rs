//! Gateway over the hosted backend's REST interface.
//!
//! Tables and views are served PostgREST-style under `/rest/v1`, password
//! auth under `/auth/v1`. Every request carries the project's anon key as
//! `apikey`; the bearer token is the signed-in user's access token, or the
//! anon key before sign-in.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use kasir_auth::{AuthUser, IdentityProvider, UserProfile};
use kasir_core::{Money, ProductId, TransactionId, UserId};
use kasir_events::{AuthEvent, EventBus, InMemoryEventBus, Subscription};
use kasir_products::{NewProduct, Product, ProductPatch};
use kasir_sales::{
    BestSeller, DailySales, NewTransaction, NewTransactionItem, RecordedTransaction, TodayStats,
    Transaction, TransactionItem,
};

use crate::{Gateway, GatewayError};

const TRANSACTION_LIST_SELECT: &str = "*,user_profiles(full_name,email)";
const TRANSACTION_DETAIL_SELECT: &str =
    "*,user_profiles(full_name,email),transaction_items(*,products(name,variant))";

type Query = Vec<(&'static str, String)>;

/// Access token of the signed-in user.
#[derive(Debug)]
struct SignedIn {
    access_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct TotalRow {
    total: Money,
}

#[derive(Serialize)]
struct ItemInsert<'a> {
    transaction_id: TransactionId,
    #[serde(flatten)]
    item: &'a NewTransactionItem,
}

#[derive(Debug)]
pub struct RestGateway {
    client: Client,
    base_url: String,
    anon_key: SecretString,
    session: RwLock<Option<SignedIn>>,
    events: InMemoryEventBus<AuthEvent>,
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>, anon_key: SecretString) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key,
            session: RwLock::new(None),
            events: InMemoryEventBus::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let token = self
            .session
            .read()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.anon_key.clone());

        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token.expose_secret())
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{table}"))
    }

    fn set_session(&self, session: Option<SignedIn>) {
        if let Ok(mut slot) = self.session.write() {
            *slot = session;
        }
    }

    fn publish(&self, event: AuthEvent) {
        if let Err(err) = self.events.publish(event) {
            tracing::warn!(error = %err, "auth event not delivered");
        }
    }

    async fn send(req: RequestBuilder) -> Result<Response, GatewayError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %body, "gateway request failed");
        Err(GatewayError::from_status(status.as_u16(), body))
    }

    async fn fetch<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, GatewayError> {
        Self::send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// PostgREST returns arrays; single-row reads take the first element.
    async fn fetch_one<T: DeserializeOwned>(
        req: RequestBuilder,
        what: String,
    ) -> Result<T, GatewayError> {
        Self::fetch::<Vec<T>>(req)
            .await?
            .into_iter()
            .next()
            .ok_or(GatewayError::NotFound(what))
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn eq(value: impl core::fmt::Display) -> String {
    format!("eq.{value}")
}

fn product_list_query(active_only: bool) -> Query {
    let mut query = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc".to_string()),
    ];
    if active_only {
        query.push(("is_active", eq(true)));
    }
    query
}

fn transaction_list_query(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Query {
    let mut query = vec![
        ("select", TRANSACTION_LIST_SELECT.to_string()),
        ("order", "created_at.desc".to_string()),
    ];
    if let Some(start) = start {
        query.push(("created_at", format!("gte.{}", timestamp(start))));
    }
    if let Some(end) = end {
        query.push(("created_at", format!("lte.{}", timestamp(end))));
    }
    query
}

#[async_trait]
impl IdentityProvider for RestGateway {
    type Error = GatewayError;

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser, GatewayError> {
        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let req = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&body);
        let TokenResponse { access_token, user } = Self::fetch(req).await?;

        self.set_session(Some(SignedIn {
            access_token: SecretString::from(access_token),
        }));
        tracing::info!(user_id = %user.id, "signed in at gateway");
        self.publish(AuthEvent::signed_in(user.id));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let result = Self::send(self.request(Method::POST, "/auth/v1/logout"))
            .await
            .map(|_| ());
        self.set_session(None);
        self.publish(AuthEvent::signed_out());
        result
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, GatewayError> {
        let signed_in = self
            .session
            .read()
            .map(|s| s.is_some())
            .unwrap_or(false);
        if !signed_in {
            return Ok(None);
        }

        match Self::fetch::<AuthUser>(self.request(Method::GET, "/auth/v1/user")).await {
            Ok(user) => Ok(Some(user)),
            Err(GatewayError::Unauthorized(reason)) => {
                tracing::info!(%reason, "access token rejected, dropping session");
                self.set_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn user_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, GatewayError> {
        let req = self
            .table(Method::GET, "user_profiles")
            .query(&[("select", "*".to_string()), ("id", eq(user_id))]);
        let rows: Vec<UserProfile> = Self::fetch(req).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl Gateway for RestGateway {
    fn auth_events(&self) -> Subscription<AuthEvent> {
        self.events.subscribe()
    }

    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, GatewayError> {
        let req = self
            .table(Method::GET, "products")
            .query(&product_list_query(active_only));
        Self::fetch(req).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        let req = self
            .table(Method::GET, "products")
            .query(&[("select", "*".to_string()), ("id", eq(id))]);
        Self::fetch_one(req, format!("product {id}")).await
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, GatewayError> {
        let req = self
            .table(Method::POST, "products")
            .header("Prefer", "return=representation")
            .json(&product);
        Self::fetch_one(req, "created product".to_string()).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, GatewayError> {
        let req = self
            .table(Method::PATCH, "products")
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&patch);
        Self::fetch_one(req, format!("product {id}")).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError> {
        let req = self
            .table(Method::DELETE, "products")
            .query(&[("id", eq(id))]);
        Self::send(req).await.map(|_| ())
    }

    async fn list_transactions(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Transaction>, GatewayError> {
        let req = self
            .table(Method::GET, "transactions")
            .query(&transaction_list_query(start, end));
        Self::fetch(req).await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, GatewayError> {
        let req = self.table(Method::GET, "transactions").query(&[
            ("select", TRANSACTION_DETAIL_SELECT.to_string()),
            ("id", eq(id)),
        ]);
        Self::fetch_one(req, format!("transaction {id}")).await
    }

    async fn create_transaction(
        &self,
        transaction: NewTransaction,
        items: Vec<NewTransactionItem>,
    ) -> Result<RecordedTransaction, GatewayError> {
        let req = self
            .table(Method::POST, "transactions")
            .header("Prefer", "return=representation")
            .json(&transaction);
        let row: Transaction = Self::fetch_one(req, "created transaction".to_string()).await?;

        let inserts: Vec<ItemInsert<'_>> = items
            .iter()
            .map(|item| ItemInsert {
                transaction_id: row.id,
                item,
            })
            .collect();
        let req = self
            .table(Method::POST, "transaction_items")
            .header("Prefer", "return=representation")
            .json(&inserts);
        let items: Vec<TransactionItem> = Self::fetch(req).await.inspect_err(|e| {
            tracing::error!(
                transaction_id = %row.id,
                code = %row.transaction_code,
                error = %e,
                "item insert failed; transaction row left without items"
            );
        })?;

        tracing::info!(
            transaction_id = %row.id,
            code = %row.transaction_code,
            items = items.len(),
            "transaction recorded"
        );
        Ok(RecordedTransaction {
            transaction: row,
            items,
        })
    }

    async fn today_stats(&self, since: DateTime<Utc>) -> Result<TodayStats, GatewayError> {
        let req = self.table(Method::GET, "transactions").query(&[
            ("select", "total,created_at".to_string()),
            ("created_at", format!("gte.{}", timestamp(since))),
        ]);
        let rows: Vec<TotalRow> = Self::fetch(req).await?;
        Ok(TodayStats::from_totals(rows.into_iter().map(|r| r.total)))
    }

    async fn best_selling(&self, limit: usize) -> Result<Vec<BestSeller>, GatewayError> {
        let req = self
            .table(Method::GET, "best_selling_products")
            .query(&[("select", "*".to_string()), ("limit", limit.to_string())]);
        Self::fetch(req).await
    }

    async fn daily_sales(&self, days: usize) -> Result<Vec<DailySales>, GatewayError> {
        let req = self
            .table(Method::GET, "daily_sales_summary")
            .query(&[("select", "*".to_string()), ("limit", days.to_string())]);
        Self::fetch(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn gateway(url: &str) -> RestGateway {
        RestGateway::new(url, SecretString::from("anon-key".to_string())).unwrap()
    }

    #[test]
    fn requests_carry_key_and_bearer() {
        let gw = gateway("https://shop.example.com/");
        let req = gw
            .table(Method::GET, "products")
            .query(&product_list_query(true))
            .build()
            .unwrap();

        assert_eq!(
            req.url().as_str(),
            "https://shop.example.com/rest/v1/products?select=*&order=created_at.desc&is_active=eq.true"
        );
        assert_eq!(req.headers()["apikey"], "anon-key");
        assert_eq!(req.headers()["authorization"], "Bearer anon-key");
    }

    #[test]
    fn signed_in_requests_use_access_token() {
        let gw = gateway("https://shop.example.com");
        gw.set_session(Some(SignedIn {
            access_token: SecretString::from("user-jwt".to_string()),
        }));

        let req = gw.request(Method::POST, "/auth/v1/logout").build().unwrap();
        assert_eq!(req.headers()["authorization"], "Bearer user-jwt");
        assert_eq!(req.headers()["apikey"], "anon-key");
    }

    #[test]
    fn transaction_list_bounds_are_inclusive_filters() {
        let start = Utc.with_ymd_and_hms(2026, 10, 15, 17, 0, 0).unwrap();
        let query = transaction_list_query(Some(start), None);
        assert!(query.contains(&("created_at", "gte.2026-10-15T17:00:00.000Z".to_string())));
        assert!(query.contains(&("select", TRANSACTION_LIST_SELECT.to_string())));
        assert_eq!(transaction_list_query(None, None).len(), 2);
    }

    #[test]
    fn item_insert_flattens_item_fields() {
        let item = NewTransactionItem {
            product_id: ProductId::new(),
            qty: 2,
            price: Money::new(12_000),
            subtotal: Money::new(24_000),
        };
        let tx_id = TransactionId::new();
        let json = serde_json::to_value(ItemInsert {
            transaction_id: tx_id,
            item: &item,
        })
        .unwrap();

        assert_eq!(json["transaction_id"], serde_json::json!(tx_id));
        assert_eq!(json["qty"], 2);
        assert_eq!(json["subtotal"], 24_000);
    }

    #[tokio::test]
    async fn no_session_means_no_current_user() {
        let gw = gateway("http://127.0.0.1:9");
        assert!(gw.current_user().await.unwrap().is_none());
    }

    /// Serve canned `(status, body)` replies, one per connection, and hand
    /// back each request's head and body.
    async fn canned_backend(
        replies: Vec<(u16, String)>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let mut seen = Vec::new();
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    raw.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&raw).to_string();
                    if let Some(head_end) = text.find("\r\n\r\n") {
                        let length = text[..head_end]
                            .lines()
                            .find_map(|l| {
                                let (name, value) = l.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if raw.len() >= head_end + 4 + length || n == 0 {
                            break;
                        }
                    }
                    if n == 0 {
                        break;
                    }
                }
                seen.push(String::from_utf8_lossy(&raw).to_string());
                let reply = format!(
                    "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            seen
        });
        (url, server)
    }

    #[tokio::test]
    async fn failed_item_insert_surfaces_the_error() {
        let row = Transaction {
            id: TransactionId::new(),
            transaction_code: "TRX-20261016-0001".to_string(),
            user_id: None,
            total: Money::new(12_000),
            paid: Money::new(20_000),
            change: Money::new(8_000),
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).unwrap(),
            cashier: None,
            items: Vec::new(),
        };
        let (url, server) = canned_backend(vec![
            (201, serde_json::to_string(&vec![&row]).unwrap()),
            (500, r#"{"message":"insert failed"}"#.to_string()),
        ])
        .await;

        let item = NewTransactionItem {
            product_id: ProductId::new(),
            qty: 1,
            price: Money::new(12_000),
            subtotal: Money::new(12_000),
        };
        let sale = NewTransaction {
            total: Money::new(12_000),
            paid: Money::new(20_000),
            change: Money::new(8_000),
            user_id: None,
        };
        let err = gateway(&url)
            .create_transaction(sale, vec![item])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api(500, _)));

        let seen = server.await.unwrap();
        assert!(seen[0].starts_with("POST /rest/v1/transactions "));
        assert!(seen[1].starts_with("POST /rest/v1/transaction_items "));
        assert!(seen[1].contains(&row.id.to_string()));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let gw = gateway("http://127.0.0.1:9");
        let err = gw.list_products(true).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));
    }
}
