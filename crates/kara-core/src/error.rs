//! Error types for `kara-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown membership type: {0:?}")]
  UnknownMembershipType(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown request status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
