//! Session user.
//!
//! Authentication lives outside the engine; the store only needs to know who
//! is signed in so remote rows can be scoped by `user_id`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    /// Builds a user, deriving the display name from the email local part
    /// when `name` is empty.
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        let email = email.into();
        let mut name = name.into();
        if name.trim().is_empty() {
            name = email.split('@').next().unwrap_or_default().to_string();
        }
        Self {
            id: id.into(),
            email,
            name,
        }
    }
}

impl From<api_types::user::User> for User {
    fn from(value: api_types::user::User) -> Self {
        Self::new(value.id, value.email, value.name)
    }
}

impl From<&User> for api_types::user::User {
    fn from(value: &User) -> Self {
        Self {
            id: value.id.clone(),
            email: value.email.clone(),
            name: value.name.clone(),
        }
    }
}

/// Session change reported by the auth side of the remote store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_falls_back_to_email_local_part() {
        let user = User::new("u1", "asha.k@example.com", "");
        assert_eq!(user.name, "asha.k");

        let user = User::new("u1", "asha.k@example.com", "Asha");
        assert_eq!(user.name, "Asha");
    }
}
