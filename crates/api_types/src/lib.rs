//! Row types of the remote relational schema.
//!
//! Every adapter talking to the remote store speaks these types, whether the
//! rows travel as JSON over HTTP or through an ORM. Monetary fields hold
//! integer minor units; serialized, they are decimal major units (see
//! [`major_units`]), matching the hosted schema's numeric columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Serde format for money fields: `i64` cents in memory, decimal major units
/// (`1250.5`) on the wire.
pub mod major_units {
    use std::fmt;

    use serde::{Deserializer, Serializer, de};

    /// Beyond this many cents an `f64` no longer carries every digit, so the
    /// amount is sent as a decimal string instead.
    const MAX_EXACT_CENTS: u64 = 1_000_000_000_000_000;

    struct Decimal(i64);

    impl fmt::Display for Decimal {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let sign = if self.0 < 0 { "-" } else { "" };
            let abs = self.0.unsigned_abs();
            write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
        }
    }

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        if cents.unsigned_abs() < MAX_EXACT_CENTS {
            serializer.serialize_f64(*cents as f64 / 100.0)
        } else {
            serializer.collect_str(&Decimal(*cents))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(MajorUnits)
    }

    struct MajorUnits;

    impl de::Visitor<'_> for MajorUnits {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount with at most two fractional digits")
        }

        fn visit_i64<E: de::Error>(self, units: i64) -> Result<i64, E> {
            units
                .checked_mul(100)
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_u64<E: de::Error>(self, units: u64) -> Result<i64, E> {
            i64::try_from(units)
                .ok()
                .and_then(|units| units.checked_mul(100))
                .ok_or_else(|| E::custom("amount out of range"))
        }

        fn visit_f64<E: de::Error>(self, units: f64) -> Result<i64, E> {
            let cents = (units * 100.0).round();
            if cents.is_finite() && cents.abs() < i64::MAX as f64 {
                Ok(cents as i64)
            } else {
                Err(E::custom("amount out of range"))
            }
        }

        fn visit_str<E: de::Error>(self, text: &str) -> Result<i64, E> {
            parse(text).ok_or_else(|| E::invalid_value(de::Unexpected::Str(text), &self))
        }
    }

    /// Parses `-12.5`, `1000`, `3.10` into cents. Extra fractional digits
    /// are accepted only when they are zeros.
    fn parse(text: &str) -> Option<i64> {
        let text = text.trim();
        let (negative, text) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (units, fraction) = text.split_once('.').unwrap_or((text, ""));
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !digits(units) || !digits(fraction) {
            return None;
        }
        let (cents, rest) = fraction.split_at(fraction.len().min(2));
        if !rest.bytes().all(|b| b == b'0') {
            return None;
        }
        let cents: i64 = format!("{cents:0<2}").parse().ok()?;
        let total = units.parse::<i64>().ok()?.checked_mul(100)?.checked_add(cents)?;
        Some(if negative { -total } else { total })
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: String,
        pub email: String,
        #[serde(default)]
        pub name: String,
    }

    /// Body for a password sign-in.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordGrant {
        pub email: String,
        pub password: String,
    }

    /// Auth user as returned by the sign-in endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthUser {
        pub id: String,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenResponse {
        pub access_token: String,
        pub user: AuthUser,
    }
}

pub mod batch {
    use super::*;

    /// A full row of the `batches` table.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BatchRow {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        #[serde(with = "crate::major_units")]
        pub opening_balance: i64,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        #[serde(with = "crate::major_units")]
        pub total_expense: i64,
        #[serde(with = "crate::major_units")]
        pub closing_balance: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Columns replaced by a batch update.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BatchPatch {
        pub name: String,
        #[serde(with = "crate::major_units")]
        pub opening_balance: i64,
        pub start_date: NaiveDate,
        pub end_date: NaiveDate,
        #[serde(with = "crate::major_units")]
        pub total_expense: i64,
        #[serde(with = "crate::major_units")]
        pub closing_balance: i64,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;

    /// A full row of the `transactions` table.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransactionRow {
        pub id: Uuid,
        pub batch_id: Uuid,
        pub date: NaiveDate,
        pub particulars: String,
        #[serde(with = "crate::major_units")]
        pub amount: i64,
        pub place: String,
        /// Nullable in the schema; empty remarks are stored as `NULL`.
        pub remarks: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransactionPatch {
        pub date: NaiveDate,
        pub particulars: String,
        #[serde(with = "crate::major_units")]
        pub amount: i64,
        pub place: String,
        pub remarks: Option<String>,
        pub updated_at: DateTime<Utc>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_row_serializes_snake_case_columns() {
        let row = transaction::TransactionRow {
            id: Uuid::nil(),
            batch_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            particulars: "Fuel".to_string(),
            amount: 25_000,
            place: "Pune".to_string(),
            remarks: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["batch_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(value["date"], "2024-01-05");
        assert_eq!(value["amount"], 250.0);
        assert!(value["remarks"].is_null());
    }

    #[test]
    fn user_name_defaults_to_empty() {
        let user: user::User =
            serde_json::from_str(r#"{"id":"u1","email":"asha@example.com"}"#).unwrap();
        assert_eq!(user.name, "");
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Amount {
        #[serde(with = "major_units")]
        cents: i64,
    }

    fn cents_of(json: &str) -> Option<i64> {
        serde_json::from_str::<Amount>(json).ok().map(|amount| amount.cents)
    }

    #[test]
    fn money_travels_in_major_units() {
        assert_eq!(
            serde_json::to_string(&Amount { cents: 100_000 }).unwrap(),
            r#"{"cents":1000.0}"#
        );
        assert_eq!(
            serde_json::to_string(&Amount { cents: -125_050 }).unwrap(),
            r#"{"cents":-1250.5}"#
        );
        assert_eq!(
            serde_json::to_string(&Amount { cents: i64::MAX }).unwrap(),
            r#"{"cents":"92233720368547758.07"}"#
        );

        assert_eq!(cents_of(r#"{"cents":1000}"#), Some(100_000));
        assert_eq!(cents_of(r#"{"cents":1250.5}"#), Some(125_050));
        assert_eq!(cents_of(r#"{"cents":0.07}"#), Some(7));
        assert_eq!(cents_of(r#"{"cents":"3.10"}"#), Some(310));
        assert_eq!(cents_of(r#"{"cents":"-12.500"}"#), Some(-1_250));
        assert_eq!(cents_of(r#"{"cents":"12.345"}"#), None);
        assert_eq!(cents_of(r#"{"cents":"abc"}"#), None);
    }

    #[test]
    fn batch_row_round_trips_through_the_wire() {
        let row = batch::BatchRow {
            id: Uuid::nil(),
            user_id: "u1".to_string(),
            name: "Goa".to_string(),
            opening_balance: 1_000_000,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            total_expense: 12_345,
            closing_balance: 987_655,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["opening_balance"], 10_000.0);
        assert_eq!(value["total_expense"], 123.45);

        let back: batch::BatchRow = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
    }
}
