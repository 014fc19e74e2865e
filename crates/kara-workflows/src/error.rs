//! Error types for `kara-workflows`.

use kara_core::request::RequestStatus;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// A store or identity-provider error, type-erased at the crate boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure inside the duplicate-detection subsystem.
#[derive(Debug, Error)]
pub enum DuplicateError {
  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl DuplicateError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

/// The approval step that was running when a dependency failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStep {
  LoadRequest,
  LoadMember,
  CreateAccount,
  CreateMember,
  CreateSubscription,
  LinkSubscription,
  MarkApproved,
  ArchiveDocument,
  Notify,
}

/// Every way an approval can fail, one variant per user-facing cause.
///
/// All variants except [`ApprovalError::Failed`] are raised before any side
/// effect.
#[derive(Debug, Error)]
pub enum ApprovalError {
  #[error("caller is not authenticated")]
  Unauthenticated,

  #[error("caller is not allowed to approve membership requests")]
  PermissionDenied,

  #[error("admin id does not match the authenticated caller")]
  AdminMismatch,

  #[error("membership request not found: {0}")]
  RequestNotFound(String),

  #[error("membership request has not been paid")]
  NotPaid,

  #[error("membership request cannot be approved from status {0}")]
  NotApprovable(RequestStatus),

  #[error("adhesion PDF URL is required")]
  MissingPdfUrl,

  #[error("invalid membership type: {0:?}")]
  InvalidMembershipType(String),

  #[error("a member with matricule {0} already exists")]
  MemberExists(String),

  /// A dependency failed mid-saga; completed steps have been compensated.
  #[error("approval failed at step {step}: {source}")]
  Failed {
    step:   ApprovalStep,
    #[source]
    source: BoxError,
  },
}

impl ApprovalError {
  pub(crate) fn failed(
    step: ApprovalStep,
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Failed {
      step,
      source: Box::new(e),
    }
  }
}
