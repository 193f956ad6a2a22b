//! Values compared by the ordering facets.

use std::cmp::Ordering;

/// Exact decimal: sign, integer digits without leading zeros and fraction
/// digits without trailing zeros.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalValue {
    negative: bool,
    integer: String,
    fraction: String,
}

impl DecimalValue {
    /// Parse the decimal lexical form (integers included).
    pub fn parse(value: &str) -> Option<Self> {
        let (negative, unsigned) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        let integer = integer.trim_start_matches('0').to_string();
        let fraction = fraction.trim_end_matches('0').to_string();
        let zero = integer.is_empty() && fraction.is_empty();
        Some(Self {
            negative: negative && !zero,
            integer,
            fraction,
        })
    }

    /// Significant digits (`totalDigits`); zero counts as one digit.
    pub fn total_digits(&self) -> usize {
        (self.integer.len() + self.fraction.len()).max(1)
    }

    pub fn fraction_digits(&self) -> usize {
        self.fraction.len()
    }

    fn compare_magnitude(&self, other: &Self) -> Ordering {
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(&other.integer))
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl Ord for DecimalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.compare_magnitude(other),
            (true, true) => other.compare_magnitude(self),
        }
    }
}

impl PartialOrd for DecimalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderedValue {
    Decimal(DecimalValue),
    Float(f64),
    /// Date and time types, compared lexically.
    Text(String),
}

impl OrderedValue {
    /// `None` when the values are of different kinds or incomparable (NaN).
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (OrderedValue::Decimal(a), OrderedValue::Decimal(b)) => Some(a.cmp(b)),
            (OrderedValue::Float(a), OrderedValue::Float(b)) => a.partial_cmp(b),
            (OrderedValue::Text(a), OrderedValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(value: &str) -> DecimalValue {
        DecimalValue::parse(value).unwrap()
    }

    #[test]
    fn decimals_compare_numerically() {
        assert!(decimal("10") > decimal("9.99"));
        assert!(decimal("-10") < decimal("-9.99"));
        assert!(decimal("0.6") > decimal("0.51"));
        assert_eq!(decimal("+007.50"), decimal("7.5"));
        assert_eq!(decimal("-0.0"), decimal("0"));
    }

    #[test]
    fn digit_counts() {
        assert_eq!(decimal("123.4500").total_digits(), 5);
        assert_eq!(decimal("123.4500").fraction_digits(), 2);
        assert_eq!(decimal("0").total_digits(), 1);
        assert!(DecimalValue::parse(".").is_none());
        assert!(DecimalValue::parse("1e3").is_none());
    }
}
