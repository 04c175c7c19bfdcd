//! Basic Types
//!
//! Naming conventions:
//! - `_id` suffix: Primary key identifiers
//! - `_ref` suffix: References or foreign keys

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================
// ID Types (newtype pattern, non-interchangeable)
// ============================================================

/// Platform user ID. `0` is the anonymous visitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl UserId {
    pub const ANONYMOUS: UserId = UserId(0);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NFT token ID (`vortex_{ts}_{suffix}` for minted tokens)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Analytics session ID (cookie-backed UUID)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Cookie carrying the session id
    pub const COOKIE_NAME: &'static str = "vortex_thorius_session";
    /// Cookie lifetime
    pub const COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random session id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================
// Currency
// ============================================================

/// The only accepted ledger currency
pub const TOLA: &str = "TOLA";

/// Ledger currency. Only TOLA exists; anything else is rejected at parse time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "TOLA")]
    Tola,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Tola => TOLA,
        }
    }

    /// Strict parse: exact "TOLA" only
    pub fn parse(s: &str) -> Option<Self> {
        (s == TOLA).then_some(Currency::Tola)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Reporting period
// ============================================================

/// Aggregation window for analytics queries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Period {
    /// Unknown values fall back to `Month`
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::All => "all",
        }
    }

    /// `created_at >=` cutoff relative to `now`; `None` for `All`
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Day => Some(now - Duration::days(1)),
            Period::Week => Some(now - Duration::weeks(1)),
            Period::Month => now.checked_sub_months(Months::new(1)),
            Period::Year => now.checked_sub_months(Months::new(12)),
            Period::All => None,
        }
    }
}

impl FromStr for Period {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Lenient deserializers (browser form posts send numbers as strings)
// ============================================================

pub mod lenient {
    use super::*;
    use rust_decimal::Decimal;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(serde_json::Number),
        Str(String),
    }

    fn parse_num<T: FromStr>(raw: NumOrStr) -> Option<T> {
        match raw {
            NumOrStr::Num(n) => n.to_string().parse().ok(),
            NumOrStr::Str(s) if s.trim().is_empty() => None,
            NumOrStr::Str(s) => s.trim().parse().ok(),
        }
    }

    /// `u64` from number or numeric string
    pub fn u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let raw = NumOrStr::deserialize(d)?;
        parse_num(raw).ok_or_else(|| serde::de::Error::custom("expected unsigned integer"))
    }

    /// Optional `u64`; empty strings become `None`
    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(Option::<NumOrStr>::deserialize(d)?.and_then(parse_num))
    }

    /// Optional `i64`; empty strings become `None`
    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<NumOrStr>::deserialize(d)?.and_then(parse_num))
    }

    /// `Decimal` from number or numeric string
    pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
        let raw = NumOrStr::deserialize(d)?;
        parse_num(raw).ok_or_else(|| serde::de::Error::custom("expected decimal"))
    }

    /// Optional `Decimal`; empty strings become `None`
    pub fn opt_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        Ok(Option::<NumOrStr>::deserialize(d)?.and_then(parse_num))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_currency_parse_is_strict() {
        assert_eq!(Currency::parse("TOLA"), Some(Currency::Tola));
        assert_eq!(Currency::parse("tola"), None);
        assert_eq!(Currency::parse("USD"), None);
        assert_eq!(Currency::Tola.to_string(), "TOLA");
    }

    #[test]
    fn test_period_fallback_to_month() {
        assert_eq!(Period::parse_lenient("week"), Period::Week);
        assert_eq!(Period::parse_lenient("decade"), Period::Month);
        assert_eq!(Period::parse_lenient(""), Period::Month);
    }

    #[test]
    fn test_period_cutoffs() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            Period::Day.cutoff(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 30, 12, 0, 0).unwrap())
        );
        assert_eq!(
            Period::Week.cutoff(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap())
        );
        // chrono clamps to the last valid day of February
        assert_eq!(
            Period::Month.cutoff(now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(
            Period::Year.cutoff(now),
            Some(Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap())
        );
        assert_eq!(Period::All.cutoff(now), None);
    }

    #[test]
    fn test_session_id_generation() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_lenient_numbers() {
        #[derive(Deserialize)]
        struct Form {
            #[serde(deserialize_with = "lenient::u64")]
            id: u64,
            #[serde(default, deserialize_with = "lenient::opt_decimal")]
            price: Option<rust_decimal::Decimal>,
        }

        let f: Form = serde_json::from_str(r#"{"id":"42","price":"12.5"}"#).unwrap();
        assert_eq!(f.id, 42);
        assert_eq!(f.price, Some(rust_decimal::Decimal::new(125, 1)));

        let f: Form = serde_json::from_str(r#"{"id":7,"price":""}"#).unwrap();
        assert_eq!(f.id, 7);
        assert_eq!(f.price, None);

        assert!(serde_json::from_str::<Form>(r#"{"id":"abc"}"#).is_err());
    }
}
