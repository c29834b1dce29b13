//! Amount and currency formatting

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::Posting;

/// How an inferred amount is spelled in derived names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountStyle {
    /// Absolute value behind a currency symbol: `€5.50`
    Symbol,
    /// Signed value followed by the currency code: `-5.50 EUR`
    Code,
}

impl Default for AmountStyle {
    fn default() -> Self {
        AmountStyle::Code
    }
}

/// Round to cents, half away from zero; zero is never negative
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

/// Render with exactly two fraction digits
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_amount(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Symbol for the currencies we know one for
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "USD" => Some("$"),
        _ => None,
    }
}

fn display(amount: Decimal, currency: &str, style: AmountStyle) -> String {
    match style {
        AmountStyle::Symbol => format!(
            "{}{}",
            currency_symbol(currency).unwrap_or(""),
            format_amount(amount.abs())
        ),
        AmountStyle::Code if currency.is_empty() => format_amount(amount),
        AmountStyle::Code => format!("{} {}", format_amount(amount), currency),
    }
}

/// Amount shown for a transaction in derived names.
///
/// With three or more postings the amount is ambiguous and left out.
pub fn posting_amount_display(
    postings: &[Posting],
    default_currency: &str,
    style: AmountStyle,
) -> String {
    match postings {
        [] => display(Decimal::ZERO, default_currency, style),
        [first] | [first, _] => display(first.amount, &first.currency, style),
        _ => String::new(),
    }
}
