//! Parsing and formatting of expense prices.
//!
//! Prices arrive either as JSON numbers or as text that may carry thousands separators
//! (`"1,200.00"`).  Values are held as exact [`Decimal`]s; only the final display step goes
//! through `format_num`.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Character accepted as a thousands separator in textual prices.
const THOUSANDS_SEPARATOR: char = ',';

/// Parses a textual price, ignoring thousands separators and surrounding whitespace.
///
/// Returns `None` for anything that is not a finite decimal number, including empty text.
///
/// ```
/// # use expense_report::amount::parse_price;
/// # use rust_decimal::Decimal;
/// assert_eq!(parse_price("2,500"), Some(Decimal::from(2500)));
/// assert_eq!(parse_price("abc"), None);
/// ```
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != THOUSANDS_SEPARATOR)
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Formats a value with thousands separators and exactly two decimal places (`1,234.50`).
///
/// Digit grouping goes through `f64`, so only about fifteen significant digits are displayed
/// exactly.  The value itself, and any total built from it, stays an exact [`Decimal`].
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = rounded.abs().to_f64().unwrap_or_default();
    format!("{sign}{}", format_num::format_num!(",.2", magnitude))
}
