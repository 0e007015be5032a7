//! Normalization of raw amount input.
//!
//! Malformed input is never rejected here: anything that does not read as a
//! number becomes `None`, which the derivation treats as zero.

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Parses free-form amount input.
///
/// Surrounding whitespace, inner spaces and `,` thousands separators are
/// ignored. Empty or non-numeric input yields `None`.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fleet_core::pricing::parse_amount;
///
/// assert_eq!(parse_amount(" 1,234.50 "), Some(dec!(1234.50)));
/// assert_eq!(parse_amount("12 000"), Some(dec!(12000)));
/// assert_eq!(parse_amount(""), None);
/// assert_eq!(parse_amount("abc"), None);
/// ```
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if normalized.is_empty() {
        return None;
    }
    match normalized.parse::<Decimal>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::debug!(input, "non-numeric amount normalized to none");
            None
        }
    }
}

/// Rounds to two decimal places, midpoint away from zero.
///
/// Used when presenting amounts; ledgers keep the exact values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fleet_core::pricing::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_amount_reads_plain_decimal() {
        assert_eq!(parse_amount("100"), Some(dec!(100)));
        assert_eq!(parse_amount("99.95"), Some(dec!(99.95)));
    }

    #[test]
    fn parse_amount_strips_separators_and_whitespace() {
        assert_eq!(parse_amount("  1,250,000.10\t"), Some(dec!(1250000.10)));
        assert_eq!(parse_amount("25 000"), Some(dec!(25000)));
    }

    #[test]
    fn parse_amount_blank_is_none() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
    }

    #[test]
    fn parse_amount_non_numeric_is_none() {
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("12abc"), None);
        assert_eq!(parse_amount("--5"), None);
    }

    #[test]
    fn parse_amount_keeps_sign() {
        assert_eq!(parse_amount("-15.5"), Some(dec!(-15.5)));
    }

    #[test]
    fn round_half_up_rounds_to_cents() {
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
        assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
        assert_eq!(round_half_up(dec!(0.001)), dec!(0.00));
    }
}
