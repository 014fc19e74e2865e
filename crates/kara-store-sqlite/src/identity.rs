//! [`SqliteIdentity`] — login accounts kept in the `accounts` table.
//!
//! Passwords are stored only as argon2 PHC strings. Hashing and verification
//! are CPU-bound and run on the blocking pool.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;

use kara_core::identity::{Account, IdentityProvider, NewAccount};

use crate::{
  Error, Result,
  encode::{RawAccount, encode_dt},
};

const ACCOUNT_COLUMNS: &str = "uid, email, password_hash, role, created_at";

/// Identity provider sharing the store's SQLite connection.
#[derive(Clone)]
pub struct SqliteIdentity {
  conn: tokio_rusqlite::Connection,
}

impl SqliteIdentity {
  pub(crate) fn new(conn: tokio_rusqlite::Connection) -> Self { Self { conn } }

  async fn find_by_email(&self, email: String) -> Result<Option<RawAccount>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
              rusqlite::params![email],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }
}

async fn hash_password(password: String) -> Result<String> {
  tokio::task::spawn_blocking(move || {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map(|hash| hash.to_string())
      .map_err(|e| Error::PasswordHash(e.to_string()))
  })
  .await?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
  tokio::task::spawn_blocking(move || {
    let parsed = PasswordHash::new(&hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
  })
  .await?
}

impl IdentityProvider for SqliteIdentity {
  type Error = Error;

  async fn get_account(&self, uid: &str) -> Result<Option<Account>> {
    let uid = uid.to_owned();

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE uid = ?1"),
              rusqlite::params![uid],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn create_account(&self, account: NewAccount) -> Result<Account> {
    let email = account.email.trim().to_lowercase();
    let password_hash = hash_password(account.password).await?;

    let created = Account {
      uid:        account.uid,
      email,
      role:       account.role,
      created_at: Utc::now(),
    };

    let uid        = created.uid.clone();
    let email      = created.email.clone();
    let role       = created.role.map(|r| <&'static str>::from(r).to_owned());
    let created_at = encode_dt(created.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: bool = tx.query_row(
          "SELECT EXISTS(SELECT 1 FROM accounts WHERE uid = ?1 OR email = ?2)",
          rusqlite::params![uid, email],
          |row| row.get(0),
        )?;
        if taken {
          return Ok(false);
        }
        tx.execute(
          &format!("INSERT INTO accounts ({ACCOUNT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![uid, email, password_hash, role, created_at],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::AccountExists(created.email));
    }
    tracing::debug!(uid = %created.uid, "account created");
    Ok(created)
  }

  async fn delete_account(&self, uid: &str) -> Result<()> {
    let uid_owned = uid.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM accounts WHERE uid = ?1", rusqlite::params![uid_owned])?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::AccountNotFound(uid.to_owned()));
    }
    Ok(())
  }

  async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>> {
    let Some(raw) = self.find_by_email(email.trim().to_lowercase()).await? else {
      return Ok(None);
    };

    if !verify_password(password.to_owned(), raw.password_hash.clone()).await? {
      return Ok(None);
    }
    raw.into_account().map(Some)
  }
}
