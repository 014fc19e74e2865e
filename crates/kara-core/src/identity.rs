//! The identity provider: login accounts, separate from member documents.

use std::{fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::member::UserRole;

/// A login account. Passwords never leave the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub uid:        String,
  pub email:      String,
  /// Role claim carried by the account's tokens.
  pub role:       Option<UserRole>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`IdentityProvider::create_account`].
#[derive(Clone)]
pub struct NewAccount {
  pub uid:      String,
  pub email:    String,
  pub password: String,
  pub role:     Option<UserRole>,
}

impl fmt::Debug for NewAccount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("NewAccount")
      .field("uid", &self.uid)
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .field("role", &self.role)
      .finish()
  }
}

/// Account create/get/delete by uid, plus credential checks for callers.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_account<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Create an account. Errors if the uid or email is already taken.
  fn create_account(
    &self,
    account: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Delete an account. Errors if it does not exist.
  fn delete_account<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Check `password` for the account registered under `email`.
  /// Returns `None` on unknown email or wrong password.
  fn authenticate<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;
}
