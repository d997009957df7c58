//! Customer account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use madeinworld_core::{Email, UserId};

/// Name stored for accounts created without profile details.
pub const PLACEHOLDER_NAME: &str = "N/A";

/// A customer account.
///
/// The password hash is deliberately not part of this type; it is only read
/// by the legacy login path through a dedicated query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique identifier, used as the session token subject.
    pub id: UserId,
    /// Display handle.
    pub username: String,
    /// Login identity (unique).
    pub email: Email,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Given name, `N/A` for auto-provisioned accounts.
    pub first_name: String,
    /// Family name, `N/A` for auto-provisioned accounts.
    pub last_name: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last modified.
    pub updated_at: DateTime<Utc>,
    /// When the account last completed a login.
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Fields for a new account row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Account auto-provisioned on first successful code verification.
    #[must_use]
    pub fn from_verified_email(email: &Email) -> Self {
        Self {
            username: email.placeholder_username().to_owned(),
            email: email.clone(),
            phone: None,
            first_name: PLACEHOLDER_NAME.to_owned(),
            last_name: PLACEHOLDER_NAME.to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioned_user_uses_local_part() {
        let email = Email::parse("first.last@example.com").unwrap();
        let new_user = NewUser::from_verified_email(&email);

        assert_eq!(new_user.username, "first.last");
        assert_eq!(new_user.first_name, "N/A");
        assert_eq!(new_user.last_name, "N/A");
        assert!(new_user.phone.is_none());
    }
}
