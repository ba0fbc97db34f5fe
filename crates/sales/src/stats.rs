//! Dashboard aggregates.
//!
//! The gateway serves `best_selling_products` and `daily_sales_summary` as
//! precomputed views; the functions here compute the same shapes from raw
//! transactions so an in-process gateway can serve them too.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use kasir_core::{Money, ProductId};
use kasir_products::Product;

use crate::datefmt::format_short_date;
use crate::transaction::Transaction;

/// Default number of best sellers on the dashboard.
pub const BEST_SELLER_LIMIT: usize = 5;
/// Default number of days in the sales chart.
pub const DAILY_SALES_DAYS: usize = 7;

/// Figures for transactions created since local midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodayStats {
    pub total_transactions: usize,
    pub total_revenue: Money,
    pub average_transaction: Money,
}

impl TodayStats {
    /// Aggregate the transactions created at or after `since`.
    pub fn compute<'a, I>(transactions: I, since: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        Self::from_totals(
            transactions
                .into_iter()
                .filter(|tx| tx.created_at >= since)
                .map(|tx| tx.total),
        )
    }

    /// Aggregate already-filtered transaction totals.
    pub fn from_totals<I>(totals: I) -> Self
    where
        I: IntoIterator<Item = Money>,
    {
        let (count, revenue) = totals
            .into_iter()
            .fold((0usize, Money::ZERO), |(n, sum), total| (n + 1, sum + total));

        Self {
            total_transactions: count,
            total_revenue: revenue,
            average_transaction: Money::average(revenue, count),
        }
    }
}

/// Local midnight of the day containing `now`, as a UTC instant.
pub fn start_of_day(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Row of the `best_selling_products` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestSeller {
    pub id: ProductId,
    pub name: String,
    pub variant: String,
    pub total_sold: u64,
    #[serde(default)]
    pub total_revenue: Money,
}

/// Row of the `daily_sales_summary` view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub sale_date: NaiveDate,
    pub total_revenue: Money,
    pub total_transactions: u64,
}

/// One bar of the dashboard sales chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesChartPoint {
    pub label: String,
    pub revenue: Money,
    pub transactions: u64,
}

/// Everything the dashboard screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub today: TodayStats,
    pub best_sellers: Vec<BestSeller>,
    pub daily_sales: Vec<DailySales>,
}

impl Dashboard {
    pub fn chart(&self) -> Vec<SalesChartPoint> {
        sales_chart(&self.daily_sales)
    }
}

/// Chart points oldest → newest from summary rows given newest → oldest.
pub fn sales_chart(days: &[DailySales]) -> Vec<SalesChartPoint> {
    days.iter()
        .rev()
        .map(|day| SalesChartPoint {
            label: format_short_date(day.sale_date),
            revenue: day.total_revenue,
            transactions: day.total_transactions,
        })
        .collect()
}

/// Rank products by units sold across all transaction items.
///
/// Ties break on revenue, then on variant. Items whose product is
/// unknown and carry no joined product columns are skipped.
pub fn best_sellers(transactions: &[Transaction], products: &[Product], limit: usize) -> Vec<BestSeller> {
    let catalog: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut totals: HashMap<ProductId, BestSeller> = HashMap::new();

    for item in transactions.iter().flat_map(|tx| tx.items.iter()) {
        let entry = match totals.get_mut(&item.product_id) {
            Some(entry) => entry,
            None => {
                let (name, variant) = match (catalog.get(&item.product_id), &item.product) {
                    (Some(p), _) => (p.name.clone(), p.variant.clone()),
                    (None, Some(joined)) => (joined.name.clone(), joined.variant.clone()),
                    (None, None) => continue,
                };
                totals.entry(item.product_id).or_insert(BestSeller {
                    id: item.product_id,
                    name,
                    variant,
                    total_sold: 0,
                    total_revenue: Money::ZERO,
                })
            }
        };
        entry.total_sold += u64::from(item.qty);
        entry.total_revenue += item.subtotal;
    }

    let mut ranked: Vec<BestSeller> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_sold
            .cmp(&a.total_sold)
            .then_with(|| b.total_revenue.cmp(&a.total_revenue))
            .then_with(|| a.variant.cmp(&b.variant))
    });
    ranked.truncate(limit);
    ranked
}

/// Per-day revenue and count, newest day first, at most `days` rows.
///
/// Only days with at least one transaction produce a row.
pub fn daily_sales(transactions: &[Transaction], offset: FixedOffset, days: usize) -> Vec<DailySales> {
    let mut by_day: BTreeMap<NaiveDate, (Money, u64)> = BTreeMap::new();

    for tx in transactions {
        let date = tx.created_at.with_timezone(&offset).date_naive();
        let slot = by_day.entry(date).or_insert((Money::ZERO, 0));
        slot.0 += tx.total;
        slot.1 += 1;
    }

    by_day
        .into_iter()
        .rev()
        .take(days)
        .map(|(sale_date, (total_revenue, total_transactions))| DailySales {
            sale_date,
            total_revenue,
            total_transactions,
        })
        .collect()
}
