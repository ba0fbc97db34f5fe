//! Indonesian date formatting for receipts, history rows, and charts.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

/// `16 Oktober 2026`
pub fn format_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), month_name(date), date.year())
}

/// `16 Okt`
pub fn format_short_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS_SHORT[date.month0() as usize])
}

/// `16 Oktober 2026 09:05`, in the shop's local offset.
pub fn format_date_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    format!(
        "{} {:02}:{:02}",
        format_date(local.date_naive()),
        local.hour(),
        local.minute()
    )
}

/// `09:05`, in the shop's local offset.
pub fn format_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    format!("{:02}:{:02}", local.hour(), local.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    #[test]
    fn formats_long_and_short_dates() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(format_date(date), "16 Oktober 2026");
        assert_eq!(format_short_date(date), "16 Okt");
    }

    #[test]
    fn date_time_uses_local_offset() {
        let at = Utc.with_ymd_and_hms(2026, 10, 15, 20, 5, 0).unwrap();
        assert_eq!(format_date_time(at, wib()), "16 Oktober 2026 03:05");
        assert_eq!(format_time(at, wib()), "03:05");
    }
}
