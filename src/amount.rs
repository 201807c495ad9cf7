//! Normalizer for target balances typed or pasted by the user.
//!
//! Dollar signs, commas and whitespace are noise wherever they appear, so
//! `"$,1,2,3,4,5,6.7,8"` reads as `123456.78`. What remains must be an
//! optionally negative decimal number.

use crate::utils::format_dollars;
use crate::{Decimal, FormatError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed target balance and its canonical rendering, e.g. `-$1,234.50`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetAmount {
    pub value: Decimal,
    pub display: String,
}

impl TargetAmount {
    pub fn new(value: Decimal) -> Self {
        TargetAmount {
            value,
            display: format_dollars(value),
        }
    }
}

impl fmt::Display for TargetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Parses a free-form dollar amount.
pub fn parse_amount(text: &str) -> Result<TargetAmount, FormatError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(FormatError::NoDigits(text.to_string()));
    }
    let invalid = || FormatError::Invalid(text.to_string());

    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let (int, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if !int.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let int = if int.is_empty() { "0" } else { int };
    let number = if frac.is_empty() {
        int.parse::<Decimal>()
    } else {
        format!("{}.{}", int, frac).parse::<Decimal>()
    }
    .map_err(|_| invalid())?;

    Ok(TargetAmount::new(if negative { -number } else { number }))
}

/// The difference `target - balance`, both given in [`parse_amount`] syntax.
///
/// This is what remains to be cleared before the account matches the
/// statement.
pub fn delta(target: &str, balance: &str) -> Result<TargetAmount, FormatError> {
    let target = parse_amount(target)?;
    let balance = parse_amount(balance)?;
    target
        .value
        .checked_sub(balance.value)
        .map(TargetAmount::new)
        .ok_or_else(|| FormatError::OutOfRange(format!("{} - {}", target, balance)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str, value: &str, display: &str) {
        let parsed = parse_amount(input).unwrap();
        assert_eq!(parsed.value, value.parse::<Decimal>().unwrap(), "{}", input);
        assert_eq!(parsed.display, display, "{}", input);
    }

    #[test]
    fn noise_is_stripped() {
        check("$1,234.56,", "1234.56", "$1,234.56");
        check("$,1234.56", "1234.56", "$1,234.56");
        check("$,1,2,3,4,5,6.7,8", "123456.78", "$123,456.78");
        check(" $ 1 234.56 ", "1234.56", "$1,234.56");
    }

    #[test]
    fn whole_dollars_get_zero_cents() {
        check("$100", "100", "$100.00");
        check("42", "42", "$42.00");
        check("5.", "5", "$5.00");
    }

    #[test]
    fn negative_before_or_after_the_sign() {
        check("-$500.00", "-500", "-$500.00");
        check("$-500", "-500", "-$500.00");
        check("- $ 1,000", "-1000", "-$1,000.00");
    }

    #[test]
    fn fractions() {
        check(".5", "0.5", "$0.50");
        check("$0.999", "0.999", "$1.00");
        check("-0", "0", "$0.00");
    }

    #[test]
    fn no_digits() {
        assert_eq!(parse_amount(""), Err(FormatError::NoDigits("".to_string())));
        assert_eq!(parse_amount("$,"), Err(FormatError::NoDigits("$,".to_string())));
        assert!(matches!(parse_amount("abc"), Err(FormatError::NoDigits(_))));
    }

    #[test]
    fn digits_in_the_wrong_shape() {
        assert!(matches!(parse_amount("1.2.3"), Err(FormatError::Invalid(_))));
        assert!(matches!(parse_amount("12abc"), Err(FormatError::Invalid(_))));
        assert!(matches!(parse_amount("--5"), Err(FormatError::Invalid(_))));
        assert!(matches!(parse_amount("5-"), Err(FormatError::Invalid(_))));
        assert!(matches!(parse_amount("+5"), Err(FormatError::Invalid(_))));
    }

    #[test]
    fn delta_against_balance() {
        let d = delta("$1,234.56", "$500.00").unwrap();
        assert_eq!(d.display, "$734.56");
        let d = delta("$100", "$334.56").unwrap();
        assert_eq!(d.display, "-$234.56");
        assert_eq!(d.value, "-234.56".parse::<Decimal>().unwrap());
        assert!(delta("$1", "none").is_err());
    }

    #[test]
    fn delta_overflow_is_an_error() {
        let max = "79228162514264337593543950335";
        let min = "-79228162514264337593543950335";
        assert!(matches!(delta(max, min), Err(FormatError::OutOfRange(_))));
        assert!(matches!(delta(min, max), Err(FormatError::OutOfRange(_))));
        assert_eq!(delta(max, max).unwrap().value, Decimal::ZERO);
    }
}
