use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kasir_core::{Money, ProductId, TransactionId, UserId};

/// Cashier columns joined from `user_profiles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashierRef {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Product columns joined from `products` on a transaction item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub name: String,
    pub variant: String,
}

/// A persisted sale (`transactions` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Human-facing number printed on the receipt, assigned by the gateway.
    pub transaction_code: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub total: Money,
    pub paid: Money,
    pub change: Money,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "user_profiles", default, skip_serializing_if = "Option::is_none")]
    pub cashier: Option<CashierRef>,
    #[serde(rename = "transaction_items", default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    pub fn cashier_name(&self) -> Option<&str> {
        self.cashier.as_ref().and_then(|c| c.full_name.as_deref())
    }
}

/// One line of a persisted sale (`transaction_items` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    pub product_id: ProductId,
    pub qty: u32,
    pub price: Money,
    pub subtotal: Money,
    #[serde(rename = "products", default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
}

/// Insert payload for `transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub total: Money,
    pub paid: Money,
    pub change: Money,
    pub user_id: Option<UserId>,
}

/// Insert payload for `transaction_items`; `transaction_id` is filled in by
/// the gateway once the parent row exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransactionItem {
    pub product_id: ProductId,
    pub qty: u32,
    pub price: Money,
    pub subtotal: Money,
}

impl NewTransactionItem {
    pub fn into_item(self, transaction_id: TransactionId) -> TransactionItem {
        TransactionItem {
            transaction_id: Some(transaction_id),
            product_id: self.product_id,
            qty: self.qty,
            price: self.price,
            subtotal: self.subtotal,
            product: None,
        }
    }
}

/// A transaction together with the item rows that were inserted for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedTransaction {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

/// Receipt number in the form `TRX-YYYYMMDD-NNNN`; `sequence` counts sales
/// within the shop's local day.
pub fn transaction_code(date: NaiveDate, sequence: u32) -> String {
    format!("TRX-{}-{:04}", date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_code_is_date_and_padded_sequence() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(transaction_code(date, 7), "TRX-20261016-0007");
        assert_eq!(transaction_code(date, 12345), "TRX-20261016-12345");
    }

    #[test]
    fn deserializes_joined_rows() {
        let json = serde_json::json!({
            "id": "0190f3a2-7c1e-7000-8000-000000000001",
            "transaction_code": "TRX-20261016-0001",
            "user_id": null,
            "total": 24000,
            "paid": 50000,
            "change": 26000,
            "created_at": "2026-10-16T02:30:00Z",
            "user_profiles": { "full_name": "Sari", "email": "sari@example.com" },
            "transaction_items": [{
                "product_id": "0190f3a2-7c1e-7000-8000-0000000000aa",
                "qty": 2,
                "price": 12000,
                "subtotal": 24000,
                "products": { "name": "Es Coklat", "variant": "Matcha" }
            }]
        });

        let tx: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.cashier_name(), Some("Sari"));
        assert_eq!(tx.items.len(), 1);
        assert_eq!(tx.items[0].product.as_ref().unwrap().variant, "Matcha");
        assert_eq!(tx.change, Money::new(26_000));
    }

    #[test]
    fn list_rows_without_joins_deserialize() {
        let json = serde_json::json!({
            "id": "0190f3a2-7c1e-7000-8000-000000000001",
            "transaction_code": "TRX-20261016-0001",
            "total": 12000,
            "paid": 12000,
            "change": 0,
            "created_at": "2026-10-16T02:30:00Z"
        });

        let tx: Transaction = serde_json::from_value(json).unwrap();
        assert!(tx.cashier.is_none());
        assert!(tx.items.is_empty());
        assert!(tx.user_id.is_none());
    }
}
