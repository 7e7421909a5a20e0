//! Display helpers: timestamps, addresses and amounts

use crate::types::LAMPORTS_PER_SOL;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;

/// Shown wherever a timestamp is missing or unreadable
pub const MISSING: &str = "—";

/// Anything a timestamp might arrive as
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    Missing,
    /// Seconds or milliseconds since the epoch
    Number(f64),
    /// Numeric string, RFC 3339 or `YYYY-MM-DD`
    Text(String),
    DateTime(DateTime<Utc>),
}

impl From<i64> for TimestampInput {
    fn from(value: i64) -> Self {
        TimestampInput::Number(value as f64)
    }
}

impl From<f64> for TimestampInput {
    fn from(value: f64) -> Self {
        TimestampInput::Number(value)
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        TimestampInput::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(value: DateTime<Utc>) -> Self {
        TimestampInput::DateTime(value)
    }
}

impl<T: Into<TimestampInput>> From<Option<T>> for TimestampInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(TimestampInput::Missing)
    }
}

fn from_number(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    // Anything below 1e12 is taken to be seconds
    let ms = if value < 1e12 { value * 1000.0 } else { value };
    DateTime::from_timestamp_millis(ms as i64)
}

/// Normalize seconds, milliseconds, strings or date-times to UTC
pub fn normalize_timestamp(input: impl Into<TimestampInput>) -> Option<DateTime<Utc>> {
    match input.into() {
        TimestampInput::Missing => None,
        TimestampInput::Number(value) => from_number(value),
        TimestampInput::DateTime(dt) => Some(dt),
        TimestampInput::Text(text) => {
            let text = text.trim();
            if let Ok(value) = text.parse::<f64>() {
                return from_number(value);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
    }
}

fn render<Z: TimeZone>(dt: DateTime<Z>) -> String
where
    Z::Offset: Display,
{
    dt.format("%d %b %Y, %I:%M %p").to_string()
}

fn render_in(dt: DateTime<Utc>, zone: Option<Tz>) -> String {
    match zone {
        Some(tz) => render(dt.with_timezone(&tz)),
        None => render(dt.with_timezone(&Local)),
    }
}

/// `15 Nov 2025, 04:21 PM` in `zone` (local time when `None`)
pub fn format_timestamp(input: impl Into<TimestampInput>, zone: Option<Tz>) -> String {
    match normalize_timestamp(input) {
        Some(dt) => render_in(dt, zone),
        None => MISSING.to_string(),
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

/// `2 min ago` style; older than a week falls back to [`format_timestamp`]
pub fn format_relative_timestamp(
    input: impl Into<TimestampInput>,
    now: DateTime<Utc>,
    zone: Option<Tz>,
) -> String {
    let Some(dt) = normalize_timestamp(input) else {
        return MISSING.to_string();
    };

    let diff_ms = (now - dt).num_milliseconds();
    if diff_ms < 15_000 {
        return "Just now".to_string();
    }

    let minutes = diff_ms / 60_000;
    if minutes < 1 {
        return format!("{}s ago", diff_ms / 1000);
    }
    if minutes < 60 {
        return format!("{} min ago", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hr");
    }

    let days = hours / 24;
    if days < 7 {
        return plural(days, "day");
    }

    render_in(dt, zone)
}

/// `AbCd…WxYz`; short strings are returned as-is
pub fn shorten_address(address: &str) -> String {
    shorten(address, 4)
}

/// First and last eight characters of a signature
pub fn short_signature(signature: &str) -> String {
    shorten(signature, 8)
}

fn shorten(s: &str, keep: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= keep * 2 {
        return s.to_string();
    }
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}…{}", head, tail)
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Exact SOL value of a lamport amount
pub fn lamports_to_sol_decimal(lamports: u64) -> Decimal {
    (Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)).normalize()
}

/// `1.2345 SOL`
pub fn format_sol(lamports: u64) -> String {
    format!("{:.4} SOL", lamports_to_sol(lamports))
}

/// Why a SOL amount string was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("Amount must be greater than zero")]
    NotPositive,
    #[error("SOL has at most 9 decimal places")]
    TooPrecise,
    #[error("Amount is too large")]
    TooLarge,
}

/// Parse a user-entered SOL amount into lamports without float rounding
pub fn parse_sol_amount(input: &str) -> Result<u64, AmountError> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber(trimmed.to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    let lamports = amount
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .ok_or(AmountError::TooLarge)?;
    if lamports.fract() != Decimal::ZERO {
        return Err(AmountError::TooPrecise);
    }

    lamports.to_u64().ok_or(AmountError::TooLarge)
}

/// Group an integer string Indian style: `12,34,567`
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Group an integer string in thousands: `1,234,567`
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Two-decimal currency string, e.g. `₹12,34,567.89` or `$1,234.50`
pub fn format_fiat(value: f64, currency: &str) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }

    let currency = currency.to_lowercase();
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    let (symbol, grouped) = match currency.as_str() {
        "inr" => ("₹".to_string(), group_indian(int_part)),
        "usd" => ("$".to_string(), group_thousands(int_part)),
        "eur" => ("€".to_string(), group_thousands(int_part)),
        "gbp" => ("£".to_string(), group_thousands(int_part)),
        other => (format!("{} ", other.to_uppercase()), group_thousands(int_part)),
    };

    format!("{}{}{}.{}", sign, symbol, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn utc() -> Option<Tz> {
        Some(chrono_tz::UTC)
    }

    #[test]
    fn test_seconds_and_millis_normalize_alike() {
        let from_secs = normalize_timestamp(1_763_223_660i64).unwrap();
        let from_ms = normalize_timestamp(1_763_223_660_000i64).unwrap();
        assert_eq!(from_secs, from_ms);

        let from_text = normalize_timestamp("1763223660").unwrap();
        assert_eq!(from_text, from_secs);
    }

    #[test]
    fn test_unreadable_inputs() {
        assert_eq!(normalize_timestamp(TimestampInput::Missing), None);
        assert_eq!(normalize_timestamp(f64::NAN), None);
        assert_eq!(normalize_timestamp("yesterday-ish"), None);
        assert_eq!(format_timestamp(None::<i64>, utc()), "—");
    }

    #[test]
    fn test_format_timestamp() {
        // 2025-11-15T16:21:00Z
        assert_eq!(format_timestamp(1_763_223_660i64, utc()), "15 Nov 2025, 04:21 PM");
        assert_eq!(format_timestamp("2025-11-15T00:05:00Z", utc()), "15 Nov 2025, 12:05 AM");
        assert_eq!(format_timestamp("2025-11-15", utc()), "15 Nov 2025, 12:00 AM");

        let kolkata: Tz = "Asia/Kolkata".parse().unwrap();
        assert_eq!(format_timestamp(1_763_223_660i64, Some(kolkata)), "15 Nov 2025, 09:51 PM");
    }

    #[test]
    fn test_relative_buckets() {
        let now = DateTime::from_timestamp(1_763_223_660, 0).unwrap();
        let ago = |d: Duration| TimestampInput::DateTime(now - d);

        assert_eq!(format_relative_timestamp(ago(Duration::seconds(-30)), now, utc()), "Just now");
        assert_eq!(format_relative_timestamp(ago(Duration::seconds(5)), now, utc()), "Just now");
        assert_eq!(format_relative_timestamp(ago(Duration::seconds(40)), now, utc()), "40s ago");
        assert_eq!(format_relative_timestamp(ago(Duration::minutes(2)), now, utc()), "2 min ago");
        assert_eq!(format_relative_timestamp(ago(Duration::hours(1)), now, utc()), "1 hr ago");
        assert_eq!(format_relative_timestamp(ago(Duration::hours(5)), now, utc()), "5 hrs ago");
        assert_eq!(format_relative_timestamp(ago(Duration::days(1)), now, utc()), "1 day ago");
        assert_eq!(format_relative_timestamp(ago(Duration::days(3)), now, utc()), "3 days ago");
        assert_eq!(
            format_relative_timestamp(ago(Duration::days(8)), now, utc()),
            "07 Nov 2025, 04:21 PM"
        );
    }

    #[test]
    fn test_shortening() {
        assert_eq!(shorten_address("abc"), "abc");
        assert_eq!(shorten_address("12345678"), "12345678");
        assert_eq!(
            shorten_address("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin"),
            "9xQe…VFin"
        );
        assert_eq!(short_signature("abcdefgh12345678ZZ"), "abcdefgh…345678ZZ");
    }

    #[test]
    fn test_parse_sol_amount() {
        assert_eq!(parse_sol_amount("1"), Ok(1_000_000_000));
        assert_eq!(parse_sol_amount(" 0.1 "), Ok(100_000_000));
        assert_eq!(parse_sol_amount("0.000000001"), Ok(1));
        assert_eq!(parse_sol_amount("0"), Err(AmountError::NotPositive));
        assert_eq!(parse_sol_amount("-2"), Err(AmountError::NotPositive));
        assert_eq!(parse_sol_amount("0.0000000001"), Err(AmountError::TooPrecise));
        assert!(matches!(parse_sol_amount("abc"), Err(AmountError::NotANumber(_))));
    }

    #[test]
    fn test_sol_display() {
        assert_eq!(format_sol(1_500_000_000), "1.5000 SOL");
        assert_eq!(lamports_to_sol_decimal(1_234_500_000), dec!(1.2345));
        assert_eq!(lamports_to_sol_decimal(1_234_500_000).to_string(), "1.2345");
    }

    #[test]
    fn test_format_fiat() {
        assert_eq!(format_fiat(1234567.891, "inr"), "₹12,34,567.89");
        assert_eq!(format_fiat(999.5, "INR"), "₹999.50");
        assert_eq!(format_fiat(1234567.0, "usd"), "$1,234,567.00");
        assert_eq!(format_fiat(-12.3, "usd"), "-$12.30");
        assert_eq!(format_fiat(10.0, "jpy"), "JPY 10.00");
        assert_eq!(format_fiat(f64::NAN, "inr"), "—");
    }
}
