//! Strongly-typed value objects used by domain entities.
//!
//! Domain structs should carry these wrappers instead of raw primitives so that
//! identifiers, text values, enumerations and numeric constraints are enforced
//! at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// An identifier was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveId(&'static str),
    /// A numeric value required to be non-negative was negative or not finite.
    #[error("{0} must be zero or greater")]
    NegativeNumber(&'static str),
    /// A string was empty or whitespace-only after trimming.
    #[error("{0} cannot be empty")]
    EmptyString(&'static str),
    /// An ordinal did not map onto a known enumeration member.
    #[error("unknown {field} value: {value}")]
    UnknownVariant { field: &'static str, value: String },
    /// Catch-all for custom validation failures.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn trim_and_require_non_empty<S: Into<String>>(
    value: S,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        Err(TypeConstraintError::EmptyString(field))
    } else {
        Ok(trimmed)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(try_from = "i32", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId($field))
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<i32>().map_err(|_| {
                    TypeConstraintError::InvalidValue(format!("{}: {s}", $field))
                })?;
                Self::new(value)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<i32> for $name {
            fn eq(&self, other: &i32) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<$name> for i32 {
            fn eq(&self, other: &$name) -> bool {
                *self == other.0
            }
        }
    };
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                trim_and_require_non_empty(value, $field).map(Self)
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

macro_rules! non_negative_f64_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, PartialOrd)]
        #[serde(try_from = "f64", into = "f64")]
        pub struct $name(f64);

        impl $name {
            /// Constructs a finite numeric value that is zero or greater.
            pub fn new(value: f64) -> Result<Self, TypeConstraintError> {
                if value.is_finite() && value >= 0.0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NegativeNumber($field))
                }
            }

            /// Returns the raw `f64` value.
            pub const fn get(self) -> f64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<f64> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: f64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for f64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<f64> for $name {
            fn eq(&self, other: &f64) -> bool {
                self.0 == *other
            }
        }
    };
}

id_newtype!(AdId, "Unique identifier for an advertisement.", "ad_id");
id_newtype!(
    CategoryId,
    "Unique identifier for a category.",
    "category_id"
);

non_empty_string_newtype!(
    AttributeName,
    "Name of a dynamic ad attribute enforcing non-empty values.",
    "attribute name"
);
non_empty_string_newtype!(
    TranslationText,
    "Text of a single language entry enforcing non-empty values.",
    "text"
);

non_negative_f64_newtype!(
    PriceAmount,
    "Non-negative price amount in standard currency units.",
    "price amount"
);

/// Lifecycle status of an ad, persisted as its ordinal.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "i32", into = "i32")]
pub enum AdStatus {
    #[default]
    Draft,
    /// Awaiting review.
    Pending,
    FromParser,
    Active,
    Completed,
    Rejected,
    Approved,
    /// The parser could not classify the ad.
    Unknown,
    Duplicate,
}

impl AdStatus {
    pub const ALL: [AdStatus; 9] = [
        Self::Draft,
        Self::Pending,
        Self::FromParser,
        Self::Active,
        Self::Completed,
        Self::Rejected,
        Self::Approved,
        Self::Unknown,
        Self::Duplicate,
    ];

    /// Ordinal used in persistence and on the wire.
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Draft => 0,
            Self::Pending => 1,
            Self::FromParser => 2,
            Self::Active => 3,
            Self::Completed => 4,
            Self::Rejected => 5,
            Self::Approved => 6,
            Self::Unknown => 7,
            Self::Duplicate => 8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::FromParser => "from_parser",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Approved => "approved",
            Self::Unknown => "unknown",
            Self::Duplicate => "duplicate",
        }
    }
}

impl Display for AdStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i32> for AdStatus {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.ordinal() == value)
            .ok_or(TypeConstraintError::UnknownVariant {
                field: "status",
                value: value.to_string(),
            })
    }
}

impl From<AdStatus> for i32 {
    fn from(value: AdStatus) -> Self {
        value.ordinal()
    }
}

/// Display language of multilingual text, identified by a small integer code.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "i32", into = "i32")]
pub enum Language {
    Russian,
    English,
    Turkish,
}

impl Language {
    pub const fn code(self) -> i32 {
        match self {
            Self::Russian => 1,
            Self::English => 2,
            Self::Turkish => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Russian => "ru",
            Self::English => "en",
            Self::Turkish => "tr",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i32> for Language {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Russian),
            2 => Ok(Self::English),
            3 => Ok(Self::Turkish),
            other => Err(TypeConstraintError::UnknownVariant {
                field: "language",
                value: other.to_string(),
            }),
        }
    }
}

impl From<Language> for i32 {
    fn from(value: Language) -> Self {
        value.code()
    }
}

impl FromStr for Language {
    type Err = TypeConstraintError;

    /// Accepts the numeric code or a two/three letter alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        match value.as_str() {
            "ru" | "rus" => Ok(Self::Russian),
            "en" | "eng" => Ok(Self::English),
            "tr" | "tur" => Ok(Self::Turkish),
            "" => Err(TypeConstraintError::EmptyString("language")),
            other => match other.parse::<i32>() {
                Ok(code) => Self::try_from(code),
                Err(_) => Err(TypeConstraintError::UnknownVariant {
                    field: "language",
                    value: other.to_string(),
                }),
            },
        }
    }
}

/// ISO 4217 numeric currency code.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "CurrencyRepr", into = "i32")]
pub struct CurrencyCode(i32);

/// Wire forms accepted for a currency: a bare number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum CurrencyRepr {
    Code(i64),
    Text(String),
}

impl CurrencyCode {
    pub const USD: CurrencyCode = CurrencyCode(840);
    pub const EUR: CurrencyCode = CurrencyCode(978);
    pub const TRY: CurrencyCode = CurrencyCode(949);
    pub const RUB: CurrencyCode = CurrencyCode(643);
    pub const GBP: CurrencyCode = CurrencyCode(826);

    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if (1..=999).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidValue(format!(
                "currency code must be between 1 and 999, got {value}"
            )))
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        match value.to_ascii_uppercase().as_str() {
            "" => Err(TypeConstraintError::EmptyString("currency")),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "TRY" => Ok(Self::TRY),
            "RUB" => Ok(Self::RUB),
            "GBP" => Ok(Self::GBP),
            _ => value
                .parse::<i32>()
                .map_err(|_| TypeConstraintError::InvalidValue(format!("currency code: {value}")))
                .and_then(Self::new),
        }
    }
}

impl TryFrom<CurrencyRepr> for CurrencyCode {
    type Error = TypeConstraintError;

    fn try_from(value: CurrencyRepr) -> Result<Self, Self::Error> {
        match value {
            CurrencyRepr::Code(code) => i32::try_from(code)
                .map_err(|_| TypeConstraintError::InvalidValue(format!("currency code: {code}")))
                .and_then(Self::new),
            CurrencyRepr::Text(text) => text.parse(),
        }
    }
}

impl TryFrom<i32> for CurrencyCode {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CurrencyCode> for i32 {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ids() {
        let err = AdId::new(0).unwrap_err();
        assert_eq!(err, TypeConstraintError::NonPositiveId("ad_id"));
    }

    #[test]
    fn parses_ids_from_decimal_strings() {
        assert_eq!("42".parse::<AdId>().unwrap().get(), 42);
        assert!("abc".parse::<AdId>().is_err());
        assert!("-3".parse::<CategoryId>().is_err());
    }

    #[test]
    fn status_round_trips_through_ordinal() {
        for status in AdStatus::ALL {
            assert_eq!(AdStatus::try_from(status.ordinal()).unwrap(), status);
        }
        assert_eq!(AdStatus::FromParser.as_str(), "from_parser");
    }

    #[test]
    fn unknown_status_ordinal_is_rejected() {
        let err = AdStatus::try_from(9).unwrap_err();
        assert_eq!(
            err,
            TypeConstraintError::UnknownVariant {
                field: "status",
                value: "9".into()
            }
        );
        assert!(serde_json::from_str::<AdStatus>("-1").is_err());
    }

    #[test]
    fn language_accepts_aliases_and_codes() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!("RU".parse::<Language>().unwrap(), Language::Russian);
        assert_eq!("3".parse::<Language>().unwrap(), Language::Turkish);
        assert!("de".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn currency_accepts_numbers_strings_and_known_codes() {
        assert_eq!("840".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert_eq!("eur".parse::<CurrencyCode>().unwrap(), CurrencyCode::EUR);
        assert_eq!(
            serde_json::from_str::<CurrencyCode>("643").unwrap(),
            CurrencyCode::RUB
        );
        assert_eq!(
            serde_json::from_str::<CurrencyCode>("\"949\"").unwrap(),
            CurrencyCode::TRY
        );
        assert!(serde_json::from_str::<CurrencyCode>("\"dollars\"").is_err());
        assert!(CurrencyCode::new(1000).is_err());
    }

    #[test]
    fn price_amount_rejects_negative_numbers() {
        assert_eq!(PriceAmount::new(0.0).unwrap().get(), 0.0);
        assert_eq!(
            PriceAmount::new(-0.01).unwrap_err(),
            TypeConstraintError::NegativeNumber("price amount")
        );
        assert!(PriceAmount::new(f64::NAN).is_err());
    }

    #[test]
    fn attribute_names_are_trimmed() {
        assert_eq!(AttributeName::new("  color ").unwrap(), "color");
        assert!(AttributeName::new("   ").is_err());
    }
}
