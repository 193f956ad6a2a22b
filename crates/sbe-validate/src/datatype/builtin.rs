//! XML Schema built-in datatypes.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::datatype::value::{DecimalValue, OrderedValue};
use crate::datatype::whitespace::WhiteSpace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NcName,
    NmToken,
    Id,
    IdRef,
    Entity,
    QName,
    Notation,
    AnyUri,
    Boolean,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    NonNegativeInteger,
    PositiveInteger,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Float,
    Double,
    Duration,
    DateTime,
    Date,
    Time,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
    HexBinary,
    Base64Binary,
}

/// List types predefined by XML Schema, with their item types.
pub const LIST_BUILTINS: [(&str, Builtin); 3] = [
    ("NMTOKENS", Builtin::NmToken),
    ("IDREFS", Builtin::IdRef),
    ("ENTITIES", Builtin::Entity),
];

static LANGUAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").expect("invalid built-in datatype regex"));
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_:][\p{L}\p{N}\p{M}._:\-]*$").expect("invalid built-in datatype regex"));
static NCNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}\p{M}._\-]*$").expect("invalid built-in datatype regex"));
static NMTOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}\p{M}._:\-]+$").expect("invalid built-in datatype regex"));
static QNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\p{L}_][\p{L}\p{N}\p{M}._\-]*:)?[\p{L}_][\p{L}\p{N}\p{M}._\-]*$")
        .expect("invalid built-in datatype regex")
});
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("invalid built-in datatype regex"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)$").expect("invalid built-in datatype regex")
});
static FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?|[+-]?INF|NaN)$")
        .expect("invalid built-in datatype regex")
});
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?P([0-9]+Y)?([0-9]+M)?([0-9]+D)?(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$",
    )
    .expect("invalid built-in datatype regex")
});
static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?[0-9]{4,}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])T(([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\.[0-9]+)?|24:00:00(\.0+)?)(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$",
    )
    .expect("invalid built-in datatype regex")
});
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?[0-9]{4,}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$",
    )
    .expect("invalid built-in datatype regex")
});
static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\.[0-9]+)?|24:00:00(\.0+)?)(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$",
    )
    .expect("invalid built-in datatype regex")
});
static G_YEAR_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]{4,}-(0[1-9]|1[0-2])(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$")
        .expect("invalid built-in datatype regex")
});
static G_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]{4,}(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$").expect("invalid built-in datatype regex")
});
static G_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$")
        .expect("invalid built-in datatype regex")
});
static G_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^---(0[1-9]|[12][0-9]|3[01])(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$")
        .expect("invalid built-in datatype regex")
});
static G_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--(0[1-9]|1[0-2])(Z|[+-](0[0-9]|1[0-4]):[0-5][0-9])?$")
        .expect("invalid built-in datatype regex")
});
static HEX_BINARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").expect("invalid built-in datatype regex"));
static BASE64: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9+/]{4})*([A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
        .expect("invalid built-in datatype regex")
});

impl Builtin {
    pub const ALL: [Builtin; 42] = [
        Builtin::AnySimpleType,
        Builtin::String,
        Builtin::NormalizedString,
        Builtin::Token,
        Builtin::Language,
        Builtin::Name,
        Builtin::NcName,
        Builtin::NmToken,
        Builtin::Id,
        Builtin::IdRef,
        Builtin::Entity,
        Builtin::QName,
        Builtin::Notation,
        Builtin::AnyUri,
        Builtin::Boolean,
        Builtin::Decimal,
        Builtin::Integer,
        Builtin::NonPositiveInteger,
        Builtin::NegativeInteger,
        Builtin::NonNegativeInteger,
        Builtin::PositiveInteger,
        Builtin::Long,
        Builtin::Int,
        Builtin::Short,
        Builtin::Byte,
        Builtin::UnsignedLong,
        Builtin::UnsignedInt,
        Builtin::UnsignedShort,
        Builtin::UnsignedByte,
        Builtin::Float,
        Builtin::Double,
        Builtin::Duration,
        Builtin::DateTime,
        Builtin::Date,
        Builtin::Time,
        Builtin::GYearMonth,
        Builtin::GYear,
        Builtin::GMonthDay,
        Builtin::GDay,
        Builtin::GMonth,
        Builtin::HexBinary,
        Builtin::Base64Binary,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::AnySimpleType => "anySimpleType",
            Builtin::String => "string",
            Builtin::NormalizedString => "normalizedString",
            Builtin::Token => "token",
            Builtin::Language => "language",
            Builtin::Name => "Name",
            Builtin::NcName => "NCName",
            Builtin::NmToken => "NMTOKEN",
            Builtin::Id => "ID",
            Builtin::IdRef => "IDREF",
            Builtin::Entity => "ENTITY",
            Builtin::QName => "QName",
            Builtin::Notation => "NOTATION",
            Builtin::AnyUri => "anyURI",
            Builtin::Boolean => "boolean",
            Builtin::Decimal => "decimal",
            Builtin::Integer => "integer",
            Builtin::NonPositiveInteger => "nonPositiveInteger",
            Builtin::NegativeInteger => "negativeInteger",
            Builtin::NonNegativeInteger => "nonNegativeInteger",
            Builtin::PositiveInteger => "positiveInteger",
            Builtin::Long => "long",
            Builtin::Int => "int",
            Builtin::Short => "short",
            Builtin::Byte => "byte",
            Builtin::UnsignedLong => "unsignedLong",
            Builtin::UnsignedInt => "unsignedInt",
            Builtin::UnsignedShort => "unsignedShort",
            Builtin::UnsignedByte => "unsignedByte",
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Duration => "duration",
            Builtin::DateTime => "dateTime",
            Builtin::Date => "date",
            Builtin::Time => "time",
            Builtin::GYearMonth => "gYearMonth",
            Builtin::GYear => "gYear",
            Builtin::GMonthDay => "gMonthDay",
            Builtin::GDay => "gDay",
            Builtin::GMonth => "gMonth",
            Builtin::HexBinary => "hexBinary",
            Builtin::Base64Binary => "base64Binary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn whitespace(self) -> WhiteSpace {
        match self {
            Builtin::String | Builtin::AnySimpleType => WhiteSpace::Preserve,
            Builtin::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    pub fn is_integer(self) -> bool {
        self.integer_bounds().is_some()
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Builtin::Decimal | Builtin::Float | Builtin::Double) || self.is_integer()
    }

    /// Inclusive value range of integer types; `None` means unbounded on that side.
    pub fn integer_bounds(self) -> Option<(Option<i128>, Option<i128>)> {
        let bounds = match self {
            Builtin::Integer => (None, None),
            Builtin::NonPositiveInteger => (None, Some(0)),
            Builtin::NegativeInteger => (None, Some(-1)),
            Builtin::NonNegativeInteger => (Some(0), None),
            Builtin::PositiveInteger => (Some(1), None),
            Builtin::Long => (Some(i128::from(i64::MIN)), Some(i128::from(i64::MAX))),
            Builtin::Int => (Some(i128::from(i32::MIN)), Some(i128::from(i32::MAX))),
            Builtin::Short => (Some(i128::from(i16::MIN)), Some(i128::from(i16::MAX))),
            Builtin::Byte => (Some(i128::from(i8::MIN)), Some(i128::from(i8::MAX))),
            Builtin::UnsignedLong => (Some(0), Some(i128::from(u64::MAX))),
            Builtin::UnsignedInt => (Some(0), Some(i128::from(u32::MAX))),
            Builtin::UnsignedShort => (Some(0), Some(i128::from(u16::MAX))),
            Builtin::UnsignedByte => (Some(0), Some(i128::from(u8::MAX))),
            _ => return None,
        };
        Some(bounds)
    }

    /// Check a whitespace-normalized value against the lexical space and
    /// inherent range of the type.
    pub fn check(self, value: &str) -> Result<(), String> {
        let lexical_ok = match self {
            Builtin::AnySimpleType
            | Builtin::String
            | Builtin::NormalizedString
            | Builtin::Token
            | Builtin::AnyUri => true,
            Builtin::Language => LANGUAGE.is_match(value),
            Builtin::Name => NAME.is_match(value),
            Builtin::NcName | Builtin::Id | Builtin::IdRef | Builtin::Entity => {
                NCNAME.is_match(value)
            }
            Builtin::NmToken => NMTOKEN.is_match(value),
            Builtin::QName | Builtin::Notation => QNAME.is_match(value),
            Builtin::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Builtin::Decimal => DECIMAL.is_match(value),
            Builtin::Float | Builtin::Double => FLOAT.is_match(value),
            Builtin::Duration => {
                DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T')
            }
            Builtin::DateTime => DATE_TIME.is_match(value) && calendar_day(value),
            Builtin::Date => DATE.is_match(value) && calendar_day(value),
            Builtin::Time => TIME.is_match(value),
            Builtin::GYearMonth => G_YEAR_MONTH.is_match(value),
            Builtin::GYear => G_YEAR.is_match(value),
            Builtin::GMonthDay => {
                G_MONTH_DAY.is_match(value) && month_day_exists(2000, &value[2..4], &value[5..7])
            }
            Builtin::GDay => G_DAY.is_match(value),
            Builtin::GMonth => G_MONTH.is_match(value),
            Builtin::HexBinary => HEX_BINARY.is_match(value),
            Builtin::Base64Binary => {
                let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
                BASE64.is_match(&compact)
            }
            _ => INTEGER.is_match(value),
        };
        if !lexical_ok {
            return Err(format!(
                "cvc-datatype-valid.1.2.1: '{value}' is not a valid value for '{}'.",
                self.name()
            ));
        }
        if let Some((min, max)) = self.integer_bounds() {
            self.check_integer_range(value, min, max)?;
        }
        Ok(())
    }

    fn check_integer_range(
        self,
        value: &str,
        min: Option<i128>,
        max: Option<i128>,
    ) -> Result<(), String> {
        let negative = value.starts_with('-');
        let parsed = value.parse::<i128>().ok();
        let below = match (parsed, min) {
            (Some(number), Some(min)) => number < min,
            (None, Some(_)) => negative,
            _ => false,
        };
        if below {
            let min = min.unwrap_or_default();
            return Err(format!(
                "cvc-minInclusive-valid: Value '{value}' is not facet-valid with respect to minInclusive '{min}' for type '{}'.",
                self.name()
            ));
        }
        let above = match (parsed, max) {
            (Some(number), Some(max)) => number > max,
            (None, Some(_)) => !negative,
            _ => false,
        };
        if above {
            let max = max.unwrap_or_default();
            return Err(format!(
                "cvc-maxInclusive-valid: Value '{value}' is not facet-valid with respect to maxInclusive '{max}' for type '{}'.",
                self.name()
            ));
        }
        Ok(())
    }

    /// Number of length units in a value: characters, octets for binary
    /// types.
    pub fn length_of(self, value: &str) -> usize {
        match self {
            Builtin::HexBinary => value.len() / 2,
            Builtin::Base64Binary => {
                let compact: Vec<char> = value.chars().filter(|c| !c.is_whitespace()).collect();
                let padding = compact.iter().rev().take_while(|c| **c == '=').count();
                (compact.len() / 4 * 3).saturating_sub(padding)
            }
            _ => value.chars().count(),
        }
    }

    /// Value used by the ordering facets, when the type is ordered.
    pub fn ordered_value(self, value: &str) -> Option<OrderedValue> {
        match self {
            Builtin::Float | Builtin::Double => parse_float(value).map(OrderedValue::Float),
            _ if self.is_numeric() => DecimalValue::parse(value).map(OrderedValue::Decimal),
            Builtin::Duration
            | Builtin::DateTime
            | Builtin::Date
            | Builtin::Time
            | Builtin::GYearMonth
            | Builtin::GYear
            | Builtin::GMonthDay
            | Builtin::GDay
            | Builtin::GMonth => Some(OrderedValue::Text(value.to_string())),
            _ => None,
        }
    }
}

/// Whether the `[-]YYYY-MM-DD` prefix of a lexically valid date names a
/// day of the proleptic Gregorian calendar.
fn calendar_day(value: &str) -> bool {
    let (negative, unsigned) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let mut parts = unsigned.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    // Leap years repeat every 400 years, so the last four digits decide.
    let Ok(cycle) = year[year.len().saturating_sub(4)..].parse::<i32>() else {
        return false;
    };
    let cycle = if negative { -cycle } else { cycle };
    month_day_exists(2000 + cycle.rem_euclid(400), month, day.get(..2).unwrap_or(day))
}

fn month_day_exists(year: i32, month: &str, day: &str) -> bool {
    match (month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day).is_some(),
        _ => false,
    }
}

fn parse_float(value: &str) -> Option<f64> {
    match value {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_expression_compiles() {
        for builtin in Builtin::ALL {
            let _ = builtin.check("x");
        }
    }

    #[test]
    fn names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("NMTOKENS"), None);
    }

    #[test]
    fn integer_ranges() {
        assert!(Builtin::UnsignedShort.check("65535").is_ok());
        let error = Builtin::UnsignedShort.check("65536").unwrap_err();
        assert!(error.starts_with("cvc-maxInclusive-valid"));
        assert!(Builtin::NonNegativeInteger.check("-1").is_err());
        assert!(Builtin::NonNegativeInteger
            .check("123456789012345678901234567890123456789012345")
            .is_ok());
        assert!(Builtin::Int.check("12a").unwrap_err().starts_with("cvc-datatype-valid.1.2.1"));
    }

    #[test]
    fn lexical_spaces() {
        assert!(Builtin::Boolean.check("true").is_ok());
        assert!(Builtin::Boolean.check("yes").is_err());
        assert!(Builtin::Decimal.check("-1.50").is_ok());
        assert!(Builtin::Decimal.check("1e3").is_err());
        assert!(Builtin::Double.check("1e3").is_ok());
        assert!(Builtin::Double.check("-INF").is_ok());
        assert!(Builtin::Date.check("2024-02-29").is_ok());
        assert!(Builtin::Date.check("2024-13-01").is_err());
        assert!(Builtin::DateTime.check("2024-02-29T00:00:00-05:00").is_ok());
        assert!(Builtin::DateTime.check("2024-01-01T12:30:00.5Z").is_ok());
        assert!(Builtin::Duration.check("P1Y2M").is_ok());
        assert!(Builtin::Duration.check("P").is_err());
        assert!(Builtin::Duration.check("PT").is_err());
        assert!(Builtin::NcName.check("a:b").is_err());
        assert!(Builtin::QName.check("a:b").is_ok());
        assert!(Builtin::HexBinary.check("0fA1").is_ok());
        assert!(Builtin::HexBinary.check("0fA").is_err());
        assert!(Builtin::Base64Binary.check("aGVsbG8=").is_ok());
    }

    #[test]
    fn dates_must_exist_in_the_calendar() {
        assert!(Builtin::Date.check("2020-02-29").is_ok());
        assert!(Builtin::Date.check("2000-02-29Z").is_ok());
        assert!(Builtin::Date.check("2020-04-30+01:00").is_ok());
        let error = Builtin::Date.check("2020-02-30").unwrap_err();
        assert!(error.starts_with("cvc-datatype-valid.1.2.1: '2020-02-30'"));
        assert!(Builtin::Date.check("2021-02-29").is_err());
        assert!(Builtin::Date.check("1900-02-29").is_err());
        assert!(Builtin::Date.check("2020-04-31").is_err());
        assert!(Builtin::Date.check("12021-02-29").is_err());
        assert!(Builtin::DateTime.check("2020-02-30T10:00:00Z").is_err());
        assert!(Builtin::GMonthDay.check("--02-29").is_ok());
        assert!(Builtin::GMonthDay.check("--02-30").is_err());
    }

    #[test]
    fn binary_lengths_count_octets() {
        assert_eq!(Builtin::HexBinary.length_of("0fA1"), 2);
        assert_eq!(Builtin::Base64Binary.length_of("aGVsbG8="), 5);
        assert_eq!(Builtin::String.length_of("héllo"), 5);
    }
}
