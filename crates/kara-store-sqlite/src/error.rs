//! Error type for `kara-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kara_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {kind} value: {value:?}")]
  Decode { kind: &'static str, value: String },

  #[error("membership request not found: {0}")]
  RequestNotFound(String),

  #[error("duplicate group not found: {0}")]
  GroupNotFound(String),

  #[error("member not found: {0}")]
  MemberNotFound(String),

  #[error("account already exists: {0}")]
  AccountExists(String),

  #[error("account not found: {0}")]
  AccountNotFound(String),

  #[error("password hashing error: {0}")]
  PasswordHash(String),

  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
