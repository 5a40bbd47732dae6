//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when user input breaks a field rule.
//! - [`NotFound`] thrown when a batch or transaction id is unknown.
//! - [`Remote`] thrown when a remote read (reload, sign-in) fails.
//!
//! Remote failures of mutations are never errors: they are reported as
//! [`SyncWarning`]s next to the applied value.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
//!  [`Remote`]: EngineError::Remote
//!  [`SyncWarning`]: crate::SyncWarning
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(FieldErrors),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Validation error for a single field.
    pub(crate) fn invalid(field: &'static str, message: &'static str) -> Self {
        let mut errors = FieldErrors::default();
        errors.push(field, message);
        Self::Validation(errors)
    }

    /// Returns `true` for [`EngineError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Remote(a), Self::Remote(b)) => a.to_string() == b.to_string(),
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Json(a), Self::Json(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

/// Failure of a call to the remote store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("not signed in")]
    Unauthorized,
    #[error("remote row not found: {0}")]
    NotFound(String),
    #[error("remote rejected the request: {0}")]
    Rejected(String),
    #[error("remote server error: {0}")]
    Server(String),
    #[error("remote unreachable: {0}")]
    Unreachable(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("snapshot write failed: {0}")]
    Snapshot(String),
}

/// A single broken field rule, as shown next to the form input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Every broken rule of one submitted form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Message for `field`, if that field failed.
    pub fn message(&self, field: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    /// `Ok(())` when no rule failed, the collected errors otherwise.
    pub fn into_result(self) -> Result<(), EngineError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_display_joins_messages() {
        let mut errors = FieldErrors::default();
        errors.push("name", "Batch name is required");
        errors.push("end_date", "End date must be after start date");

        assert_eq!(
            errors.to_string(),
            "name: Batch name is required; end_date: End date must be after start date"
        );
        assert_eq!(errors.message("name"), Some("Batch name is required"));
        assert_eq!(errors.message("place"), None);
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::default().into_result().is_ok());
    }
}
