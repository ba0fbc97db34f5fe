//! Sales domain module.
//!
//! Persisted transactions, history filtering, dashboard aggregates, and
//! receipts. Pure logic, no IO.

pub mod datefmt;
pub mod history;
pub mod receipt;
pub mod stats;
pub mod transaction;

pub use datefmt::{format_date, format_date_time, format_short_date, format_time};
pub use history::{HistoryFilter, HistorySummary};
pub use receipt::{RECEIPT_WIDTH, Receipt, ReceiptLine, ShopInfo};
pub use stats::{
    BEST_SELLER_LIMIT, BestSeller, DAILY_SALES_DAYS, Dashboard, DailySales, SalesChartPoint,
    TodayStats, best_sellers, daily_sales, sales_chart, start_of_day,
};
pub use transaction::{
    CashierRef, NewTransaction, NewTransactionItem, ProductRef, RecordedTransaction, Transaction,
    TransactionItem, transaction_code,
};
