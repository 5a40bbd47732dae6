//! Internal helpers for row conversion.
//!
//! These utilities are **not** part of the public API.

use uuid::Uuid;

use crate::RemoteError;

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> Result<Uuid, RemoteError> {
    Uuid::parse_str(value)
        .map_err(|_| RemoteError::Server(format!("invalid {label} id: {value}")))
}

/// Lowercase copy used for case-insensitive name matching.
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}
