//! Plain-text receipts sized for 58 mm thermal paper.

use std::fmt::Write as _;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use kasir_core::Money;

use crate::datefmt::format_date_time;
use crate::transaction::{Transaction, TransactionItem};

/// Characters per line on a 58 mm printer.
pub const RECEIPT_WIDTH: usize = 32;

/// Shop identity printed in the receipt header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    pub tagline: String,
    pub address: String,
    pub phone: String,
}

impl Default for ShopInfo {
    fn default() -> Self {
        Self {
            name: "ES COKLAT".to_string(),
            tagline: "Varian Rasa".to_string(),
            address: "Jl. Contoh UMKM No.1".to_string(),
            phone: "Telp: 0812-3456-7890".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub variant: String,
    pub qty: u32,
    pub price: Money,
    pub subtotal: Money,
}

impl ReceiptLine {
    /// Line from a persisted item; `None` when the item has no joined product.
    pub fn from_item(item: &TransactionItem) -> Option<Self> {
        let product = item.product.as_ref()?;
        Some(Self {
            name: product.name.clone(),
            variant: product.variant.clone(),
            qty: item.qty,
            price: item.price,
            subtotal: item.subtotal,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_code: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
    pub paid: Money,
    pub change: Money,
}

impl Receipt {
    /// Receipt for a transaction fetched with its joined items.
    pub fn from_transaction(tx: &Transaction) -> Self {
        let lines = tx.items.iter().filter_map(ReceiptLine::from_item).collect();
        Self::with_lines(tx, lines)
    }

    /// Receipt for a transaction with lines supplied by the caller, e.g. the
    /// cart lines right after checkout.
    pub fn with_lines(tx: &Transaction, lines: Vec<ReceiptLine>) -> Self {
        Self {
            transaction_code: tx.transaction_code.clone(),
            created_at: tx.created_at,
            lines,
            total: tx.total,
            paid: tx.paid,
            change: tx.change,
        }
    }

    /// Download name, `struk-{code}.txt`.
    pub fn file_name(&self) -> String {
        format!("struk-{}.txt", self.transaction_code)
    }

    pub fn render_text(&self, shop: &ShopInfo, offset: FixedOffset) -> String {
        let double = "=".repeat(RECEIPT_WIDTH);
        let single = "-".repeat(RECEIPT_WIDTH);
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "{double}");
        let _ = writeln!(out, "{}", center(&shop.name));
        let _ = writeln!(out, "{}", center(&shop.tagline));
        let _ = writeln!(out, "{}", center(&shop.address));
        let _ = writeln!(out, "{}", center(&shop.phone));
        let _ = writeln!(out, "{double}");
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", format_date_time(self.created_at, offset));
        let _ = writeln!(out, "No: {}", self.transaction_code);
        let _ = writeln!(out);
        let _ = writeln!(out, "{single}");

        for line in &self.lines {
            let _ = writeln!(out, "{} {}", line.name, line.variant);
            let _ = writeln!(out, "{} x {} = {}", line.qty, line.price, line.subtotal);
        }

        let _ = writeln!(out, "{single}");
        let _ = writeln!(out, "{:<10}{}", "TOTAL", self.total);
        let _ = writeln!(out, "{:<10}{}", "BAYAR", self.paid);
        let _ = writeln!(out, "{:<10}{}", "KEMBALI", self.change);
        let _ = writeln!(out);
        let _ = writeln!(out, "{double}");
        let _ = writeln!(out, "{}", center("Terima Kasih!"));
        let _ = writeln!(out, "{double}");
        out
    }
}

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::ProductRef;
    use chrono::TimeZone;
    use kasir_core::{ProductId, TransactionId};

    fn sample() -> Transaction {
        Transaction {
            id: TransactionId::new(),
            transaction_code: "TRX-20261016-0003".to_string(),
            user_id: None,
            total: Money::new(39_000),
            paid: Money::new(50_000),
            change: Money::new(11_000),
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 7, 5, 0).unwrap(),
            cashier: None,
            items: vec![
                TransactionItem {
                    transaction_id: None,
                    product_id: ProductId::new(),
                    qty: 2,
                    price: Money::new(12_000),
                    subtotal: Money::new(24_000),
                    product: Some(ProductRef {
                        name: "Es Coklat".to_string(),
                        variant: "Matcha".to_string(),
                    }),
                },
                TransactionItem {
                    transaction_id: None,
                    product_id: ProductId::new(),
                    qty: 1,
                    price: Money::new(15_000),
                    subtotal: Money::new(15_000),
                    product: Some(ProductRef {
                        name: "Es Coklat".to_string(),
                        variant: "Coklat Keju".to_string(),
                    }),
                },
            ],
        }
    }

    #[test]
    fn renders_lines_and_totals() {
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let text = Receipt::from_transaction(&sample()).render_text(&ShopInfo::default(), wib);

        assert!(text.contains("ES COKLAT"));
        assert!(text.contains("16 Oktober 2026 14:05"));
        assert!(text.contains("No: TRX-20261016-0003"));
        assert!(text.contains("Es Coklat Matcha\n2 x Rp 12.000 = Rp 24.000\n"));
        assert!(text.contains("Es Coklat Coklat Keju\n1 x Rp 15.000 = Rp 15.000\n"));
        assert!(text.contains("TOTAL     Rp 39.000\n"));
        assert!(text.contains("BAYAR     Rp 50.000\n"));
        assert!(text.contains("KEMBALI   Rp 11.000\n"));
        assert!(text.contains("Terima Kasih!"));
    }

    #[test]
    fn rules_fit_the_paper_width() {
        let text = Receipt::from_transaction(&sample()).render_text(
            &ShopInfo::default(),
            FixedOffset::east_opt(0).unwrap(),
        );
        let first = text.lines().next().unwrap();
        assert_eq!(first.len(), RECEIPT_WIDTH);
    }

    #[test]
    fn file_name_uses_code() {
        let receipt = Receipt::from_transaction(&sample());
        assert_eq!(receipt.file_name(), "struk-TRX-20261016-0003.txt");
    }

    #[test]
    fn items_without_product_join_are_left_out() {
        let mut tx = sample();
        tx.items[1].product = None;
        assert_eq!(Receipt::from_transaction(&tx).lines.len(), 1);
    }
}
