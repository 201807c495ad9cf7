//! Useful functions for parsing amounts and formatting money.

use crate::{Amount, Decimal};
use rust_decimal::RoundingStrategy;

/// Parses a [`Decimal`] from an unsigned run of digits with optional grouping
/// commas and at most one decimal point.
pub fn parse_decimal(num_str: &str) -> Option<Decimal> {
    if num_str.is_empty()
        || num_str.starts_with([',', '.'])
        || num_str.ends_with([',', '.'])
        || num_str.matches('.').count() > 1
        || !num_str.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
    {
        return None;
    }
    if let Some(frac) = num_str.split_once('.').map(|(_, frac)| frac) {
        if frac.contains(',') {
            return None;
        }
    }
    num_str.replace(',', "").parse::<Decimal>().ok()
}

/// Parses an amount as printed by the ledger tool, such as `$-45.67`,
/// `-$1,000.00` or `12.5 EUR`.
///
/// Returns `None` for text that is not exactly one optionally signed number
/// with an optional commodity on one side.
pub fn parse_ledger_amount(text: &str) -> Option<Amount> {
    let text = text.trim();
    let first = text.find(|c: char| c.is_ascii_digit())?;
    let last = text.rfind(|c: char| c.is_ascii_digit())?;
    let number = parse_decimal(&text[first..=last])?;

    let (prefix, suffix) = (&text[..first], &text[last + 1..]);
    let negative = prefix.trim_end().ends_with('-') || prefix.trim_start().starts_with('-');
    let prefix = prefix.trim().trim_matches('-').trim();
    let suffix = suffix.trim();
    if prefix.contains('-') || suffix.contains('-') {
        return None;
    }
    let commodity = match (prefix.is_empty(), suffix.is_empty()) {
        (true, true) => "",
        (false, true) => prefix,
        (true, false) => suffix,
        (false, false) => return None,
    };
    if commodity.chars().any(|c| c.is_whitespace()) && !commodity.starts_with('"') {
        return None;
    }
    Some(Amount {
        number: if negative { -number } else { number },
        commodity: commodity.to_string(),
    })
}

/// Formats `value` as dollars with two decimals and thousands separators,
/// for example `-$1,234.50`.
pub fn format_dollars(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.2}", rounded.abs());
    let (int, frac) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (index, digit) in int.chars().enumerate() {
        if index > 0 && (int.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, frac)
}
