//! US-English display helpers for money, durations and dates.

use chrono::{NaiveDate, NaiveTime, Timelike};

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `123456` → `$1,234.56`.
pub fn format_currency(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}${}.{:02}", group_thousands(abs / 100), abs % 100)
}

/// `123456` → `$1,235`.
pub fn format_whole_dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let dollars = (cents.unsigned_abs() as f64 / 100.0).round() as u64;
    format!("{sign}${}", group_thousands(dollars))
}

/// Short dashboard figure: `$1.5M`, `$12K`, `$1.2K` or `$999.00`.
pub fn format_compact_currency(cents: i64) -> String {
    let dollars = cents as f64 / 100.0;
    if dollars >= 1_000_000.0 {
        format!("${:.1}M", dollars / 1_000_000.0)
    } else if dollars >= 10_000.0 {
        format!("${:.0}K", dollars / 1_000.0)
    } else if dollars >= 1_000.0 {
        format!("${:.1}K", dollars / 1_000.0)
    } else {
        format!("${dollars:.2}")
    }
}

/// `90` → `1h 30m`.
pub fn format_duration(minutes: i32) -> String {
    if minutes <= 0 {
        return "0min".to_string();
    }
    let (hours, mins) = (minutes / 60, minutes % 60);
    match (hours, mins) {
        (0, m) => format!("{m}min"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// `Jan 5, 2026`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `January 5, 2026`.
pub fn format_month_day_year(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// `Monday, January 5, 2026`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// `9:05 AM`.
pub fn format_time(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let suffix = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {suffix}", time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_has_grouping_and_sign() {
        assert_eq!(format_currency(123_456), "$1,234.56");
        assert_eq!(format_currency(5), "$0.05");
        assert_eq!(format_currency(-250), "-$2.50");
        assert_eq!(format_currency(100_000_000), "$1,000,000.00");
        assert_eq!(format_whole_dollars(123_456), "$1,235");
    }

    #[test]
    fn compact_currency_thresholds() {
        assert_eq!(format_compact_currency(150_000_000), "$1.5M");
        assert_eq!(format_compact_currency(1_200_000), "$12K");
        assert_eq!(format_compact_currency(120_000), "$1.2K");
        assert_eq!(format_compact_currency(99_900), "$999.00");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0min");
        assert_eq!(format_duration(45), "45min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(90), "1h 30m");
    }

    #[test]
    fn dates_and_times() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_date(date), "Jan 5, 2026");
        assert_eq!(format_month_day_year(date), "January 5, 2026");
        assert_eq!(format_long_date(date), "Monday, January 5, 2026");
        assert_eq!(
            format_time(NaiveTime::from_hms_opt(9, 5, 0).unwrap()),
            "9:05 AM"
        );
        assert_eq!(
            format_time(NaiveTime::from_hms_opt(0, 30, 0).unwrap()),
            "12:30 AM"
        );
        assert_eq!(
            format_time(NaiveTime::from_hms_opt(15, 0, 0).unwrap()),
            "3:00 PM"
        );
    }
}
