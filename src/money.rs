//! Drift-free monetary arithmetic.
//!
//! Budget and transaction amounts are decimal currency values, but summing
//! them as `f64` accumulates binary representation error (`0.1 + 0.2 !=
//! 0.3`). Every aggregate in this crate therefore goes through the integer
//! cent representation: convert each operand to a whole number of cents,
//! do the arithmetic on integers, and convert back to a decimal once at the
//! end.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Convert a decimal currency amount to an integer number of cents.
///
/// Rounds to the nearest cent, halves away from zero.
pub fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Parse a currency amount from text, failing closed to zero.
///
/// Returns `0.0` for anything that does not parse as a finite number. A
/// malformed amount on a single transaction must never poison an aggregate
/// with `NaN`, so the bad value is logged and dropped rather than
/// propagated.
pub fn to_safe_amount(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => amount,
        _ => {
            tracing::warn!("could not parse {value:?} as an amount, treating it as zero");
            0.0
        }
    }
}

/// Normalize an optional amount, failing closed to zero.
///
/// `None`, `NaN` and infinities all become `0.0`; finite values pass
/// through unchanged with their sign preserved.
pub fn safe_amount(value: Option<f64>) -> f64 {
    match value {
        Some(amount) if amount.is_finite() => amount,
        Some(amount) => {
            tracing::warn!("non-finite amount {amount}, treating it as zero");
            0.0
        }
        None => 0.0,
    }
}

/// The absolute difference between a budget limit and the amount spent, in
/// whole cents converted back to a decimal.
///
/// The result is exact for operands with at most two fractional digits, and
/// is always a non-negative magnitude regardless of which operand is
/// larger. Callers decide whether it means "over by" or "left to spend".
pub fn overspend_delta(limit: f64, spent: f64) -> f64 {
    let cents = (to_cents(safe_amount(Some(limit))) - to_cents(safe_amount(Some(spent)))).abs();

    cents as f64 / 100.0
}

/// Sum currency amounts without accumulating floating-point drift.
///
/// Each amount is rounded to integer cents before accumulation and the
/// total is converted back to a decimal once. Summing the raw `f64` values
/// element by element reintroduces drift that a single final rounding does
/// not repair.
pub fn sum_amounts<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let total_cents: i64 = amounts
        .into_iter()
        .map(|amount| to_cents(safe_amount(Some(amount))))
        .sum();

    total_cents as f64 / 100.0
}

/// Format a currency amount for display, e.g. `-$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if amount < 0.0 {
        negative_fmt.fmt_string(amount.abs())
    } else if amount > 0.0 {
        positive_fmt.fmt_string(amount)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}
