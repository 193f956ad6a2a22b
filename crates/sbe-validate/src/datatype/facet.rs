//! Constraining facets accumulated along a restriction chain.

use std::cmp::Ordering;

use regex::Regex;

use crate::datatype::value::{DecimalValue, OrderedValue};
use crate::datatype::whitespace::WhiteSpace;

/// Patterns declared by one restriction step; any alternative may match.
#[derive(Debug, Clone)]
pub struct PatternStep {
    pub sources: Vec<String>,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub struct Bound {
    pub lexical: String,
    pub value: OrderedValue,
}

/// Facets in force for a simple type.
///
/// Restricting a type clones its facets and adds its own: pattern and
/// enumeration steps accumulate (a value must satisfy every step), scalar
/// facets are replaced by the derived value.
#[derive(Debug, Clone, Default)]
pub struct Facets {
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub patterns: Vec<PatternStep>,
    pub enumerations: Vec<Vec<String>>,
    pub min_inclusive: Option<Bound>,
    pub max_inclusive: Option<Bound>,
    pub min_exclusive: Option<Bound>,
    pub max_exclusive: Option<Bound>,
    pub total_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    pub whitespace: Option<WhiteSpace>,
}

/// What a value looks like to the facets that inspect it.
pub struct FacetInput<'a> {
    /// Whitespace-normalized value.
    pub value: &'a str,
    /// Length in the units of the type (characters, octets, list items).
    pub length: usize,
    pub ordered: Option<OrderedValue>,
    /// Whether enumeration members compare as decimals.
    pub numeric: bool,
    pub type_name: &'a str,
}

impl Facets {
    pub fn check(&self, input: &FacetInput<'_>) -> Result<(), String> {
        let value = input.value;
        let type_name = input.type_name;
        if let Some(length) = self.length
            && input.length != length
        {
            return Err(format!(
                "cvc-length-valid: Value '{value}' with length = '{}' is not facet-valid with respect to length '{length}' for type '{type_name}'.",
                input.length
            ));
        }
        if let Some(min) = self.min_length
            && input.length < min
        {
            return Err(format!(
                "cvc-minLength-valid: Value '{value}' with length = '{}' is not facet-valid with respect to minLength '{min}' for type '{type_name}'.",
                input.length
            ));
        }
        if let Some(max) = self.max_length
            && input.length > max
        {
            return Err(format!(
                "cvc-maxLength-valid: Value '{value}' with length = '{}' is not facet-valid with respect to maxLength '{max}' for type '{type_name}'.",
                input.length
            ));
        }
        for step in &self.patterns {
            if !step.regex.is_match(value) {
                return Err(format!(
                    "cvc-pattern-valid: Value '{value}' is not facet-valid with respect to pattern '{}' for type '{type_name}'.",
                    step.sources.join("|")
                ));
            }
        }
        for members in &self.enumerations {
            if !members
                .iter()
                .any(|member| enumeration_matches(member, value, input.numeric))
            {
                return Err(format!(
                    "cvc-enumeration-valid: Value '{value}' is not facet-valid with respect to enumeration '[{}]'. It must be a value from the enumeration.",
                    members.join(", ")
                ));
            }
        }
        if let Some(ordered) = &input.ordered {
            self.check_bounds(value, ordered, type_name)?;
            if let OrderedValue::Decimal(decimal) = ordered {
                self.check_digits(value, decimal)?;
            }
        }
        Ok(())
    }

    fn check_bounds(&self, value: &str, ordered: &OrderedValue, type_name: &str) -> Result<(), String> {
        let checks: [(&Option<Bound>, &str, fn(Ordering) -> bool); 4] = [
            (&self.min_inclusive, "minInclusive", |o| o != Ordering::Less),
            (&self.max_inclusive, "maxInclusive", |o| o != Ordering::Greater),
            (&self.min_exclusive, "minExclusive", |o| o == Ordering::Greater),
            (&self.max_exclusive, "maxExclusive", |o| o == Ordering::Less),
        ];
        for (bound, facet, accepts) in checks {
            let Some(bound) = bound else {
                continue;
            };
            if let Some(ordering) = ordered.compare(&bound.value)
                && !accepts(ordering)
            {
                return Err(format!(
                    "cvc-{facet}-valid: Value '{value}' is not facet-valid with respect to {facet} '{}' for type '{type_name}'.",
                    bound.lexical
                ));
            }
        }
        Ok(())
    }

    fn check_digits(&self, value: &str, decimal: &DecimalValue) -> Result<(), String> {
        if let Some(limit) = self.total_digits
            && decimal.total_digits() > limit
        {
            return Err(format!(
                "cvc-totalDigits-valid: Value '{value}' has {} total digits, but the number of total digits has been limited to {limit}.",
                decimal.total_digits()
            ));
        }
        if let Some(limit) = self.fraction_digits
            && decimal.fraction_digits() > limit
        {
            return Err(format!(
                "cvc-fractionDigits-valid: Value '{value}' has {} fraction digits, but the number of fraction digits has been limited to {limit}.",
                decimal.fraction_digits()
            ));
        }
        Ok(())
    }
}

fn enumeration_matches(member: &str, value: &str, numeric: bool) -> bool {
    if numeric
        && let (Some(a), Some(b)) = (DecimalValue::parse(member), DecimalValue::parse(value))
    {
        return a == b;
    }
    member == value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(value: &'a str, ordered: Option<OrderedValue>) -> FacetInput<'a> {
        FacetInput {
            value,
            length: value.chars().count(),
            ordered,
            numeric: false,
            type_name: "test_t",
        }
    }

    #[test]
    fn enumeration_message_lists_members() {
        let facets = Facets {
            enumerations: vec![vec!["bigEndian".into(), "littleEndian".into()]],
            ..Facets::default()
        };
        assert!(facets.check(&input("bigEndian", None)).is_ok());
        let error = facets.check(&input("middleEndian", None)).unwrap_err();
        assert_eq!(
            error,
            "cvc-enumeration-valid: Value 'middleEndian' is not facet-valid with respect to enumeration '[bigEndian, littleEndian]'. It must be a value from the enumeration."
        );
    }

    #[test]
    fn numeric_enumerations_compare_by_value() {
        let facets = Facets {
            enumerations: vec![vec!["1.0".into()]],
            ..Facets::default()
        };
        let mut numeric = input("1", None);
        numeric.numeric = true;
        assert!(facets.check(&numeric).is_ok());
    }

    #[test]
    fn bounds_and_digits() {
        let bound = |lexical: &str| Bound {
            lexical: lexical.to_string(),
            value: OrderedValue::Decimal(DecimalValue::parse(lexical).unwrap()),
        };
        let facets = Facets {
            min_exclusive: Some(bound("0")),
            max_inclusive: Some(bound("100")),
            fraction_digits: Some(2),
            ..Facets::default()
        };
        let check = |value: &str| {
            facets.check(&input(
                value,
                Some(OrderedValue::Decimal(DecimalValue::parse(value).unwrap())),
            ))
        };
        assert!(check("100").is_ok());
        assert!(check("0").unwrap_err().starts_with("cvc-minExclusive-valid"));
        assert!(check("100.01").unwrap_err().starts_with("cvc-maxInclusive-valid"));
        assert!(check("1.125").unwrap_err().starts_with("cvc-fractionDigits-valid"));
    }

    #[test]
    fn length_facets() {
        let facets = Facets {
            min_length: Some(1),
            max_length: Some(3),
            ..Facets::default()
        };
        assert!(facets.check(&input("", None)).unwrap_err().starts_with("cvc-minLength-valid"));
        assert!(facets.check(&input("abcd", None)).unwrap_err().starts_with("cvc-maxLength-valid"));
        assert!(facets.check(&input("ab", None)).is_ok());
    }
}
