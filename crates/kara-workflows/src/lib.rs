//! Business workflows over the KARA stores.
//!
//! - [`duplicates`]: normalise, detect, consolidate into groups, mark and
//!   clean up. Driven by [`duplicates::on_request_write`] after every write to
//!   a membership request, and by [`duplicates::migrate_duplicates`] as a
//!   batch backfill.
//! - [`approval`]: the compensating saga that promotes a paid request into a
//!   member with an identity account, subscription, archived adhesion form
//!   and notification.
//!
//! Everything is generic over the `kara-core` store and identity traits.

pub mod approval;
pub mod duplicates;
pub mod error;

pub use error::{ApprovalError, ApprovalStep, BoxError, DuplicateError};

#[cfg(test)]
mod testing;
