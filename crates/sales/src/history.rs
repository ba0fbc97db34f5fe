//! Transaction history filtering and summary.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::Serialize;

use kasir_core::Money;

use crate::transaction::Transaction;

/// Filter for the transaction list screen.
///
/// Dates are calendar days in the shop's local offset; both bounds are
/// inclusive (the end date runs through 23:59:59.999).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFilter {
    pub search: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub offset: FixedOffset,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            start_date: None,
            end_date: None,
            offset: Utc.fix(),
        }
    }
}

impl HistoryFilter {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = query.into();
        self
    }

    pub fn start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    pub fn end_date(mut self, date: Option<NaiveDate>) -> Self {
        self.end_date = date;
        self
    }

    /// First instant included by `start_date`.
    pub fn lower_bound(&self) -> Option<DateTime<Utc>> {
        let date = self.start_date?;
        let naive = date.and_hms_opt(0, 0, 0)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Last instant included by `end_date`.
    pub fn upper_bound(&self) -> Option<DateTime<Utc>> {
        let date = self.end_date?;
        let naive = date.and_hms_milli_opt(23, 59, 59, 999)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        if !self.search.is_empty() {
            let query = self.search.to_lowercase();
            let code_hit = tx.transaction_code.to_lowercase().contains(&query);
            let cashier_hit = tx
                .cashier_name()
                .is_some_and(|name| name.to_lowercase().contains(&query));
            if !code_hit && !cashier_hit {
                return false;
            }
        }

        if let Some(lower) = self.lower_bound() {
            if tx.created_at < lower {
                return false;
            }
        }

        if let Some(upper) = self.upper_bound() {
            if tx.created_at > upper {
                return false;
            }
        }

        true
    }

    /// Keep matching transactions, preserving input order.
    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        transactions.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Header figures shown above the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub count: usize,
    pub revenue: Money,
    pub average: Money,
}

impl HistorySummary {
    pub fn of<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let (count, revenue) = transactions
            .into_iter()
            .fold((0usize, Money::ZERO), |(n, sum), tx| (n + 1, sum + tx.total));

        Self {
            count,
            revenue,
            average: Money::average(revenue, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::CashierRef;
    use kasir_core::TransactionId;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn tx(code: &str, cashier: &str, at: DateTime<Utc>, total: i64) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            transaction_code: code.to_string(),
            user_id: None,
            total: Money::new(total),
            paid: Money::new(total),
            change: Money::ZERO,
            created_at: at,
            cashier: Some(CashierRef {
                full_name: Some(cashier.to_string()),
                email: None,
            }),
            items: Vec::new(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            // 15 Oct 23:30 WIB
            tx("TRX-20261015-0001", "Sari", Utc.with_ymd_and_hms(2026, 10, 15, 16, 30, 0).unwrap(), 12_000),
            // 16 Oct 00:10 WIB
            tx("TRX-20261016-0001", "Budi", Utc.with_ymd_and_hms(2026, 10, 15, 17, 10, 0).unwrap(), 24_000),
            // 16 Oct 23:59 WIB
            tx("TRX-20261016-0002", "Sari", Utc.with_ymd_and_hms(2026, 10, 16, 16, 59, 0).unwrap(), 15_000),
        ]
    }

    #[test]
    fn search_matches_code_or_cashier() {
        let txs = sample();
        let f = HistoryFilter::new(wib()).search("budi");
        assert_eq!(f.apply(&txs).len(), 1);

        let f = HistoryFilter::new(wib()).search("20261016");
        assert_eq!(f.apply(&txs).len(), 2);

        let f = HistoryFilter::new(wib()).search("nobody");
        assert!(f.apply(&txs).is_empty());
    }

    #[test]
    fn date_bounds_are_inclusive_local_days() {
        let txs = sample();
        let f = HistoryFilter::new(wib())
            .start_date(Some(day(16)))
            .end_date(Some(day(16)));
        let codes: Vec<_> = f
            .apply(&txs)
            .into_iter()
            .map(|t| t.transaction_code.as_str())
            .collect();
        assert_eq!(codes, vec!["TRX-20261016-0001", "TRX-20261016-0002"]);
    }

    #[test]
    fn end_date_alone_cuts_off_later_days() {
        let txs = sample();
        let f = HistoryFilter::new(wib()).end_date(Some(day(15)));
        assert_eq!(f.apply(&txs).len(), 1);
    }

    #[test]
    fn summary_counts_revenue_and_average() {
        let txs = sample();
        let summary = HistorySummary::of(&txs);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.revenue, Money::new(51_000));
        assert_eq!(summary.average, Money::new(17_000));
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        let summary = HistorySummary::of(std::iter::empty());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, Money::ZERO);
    }
}
