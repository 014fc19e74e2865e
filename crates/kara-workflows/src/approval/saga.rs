//! Compensating actions for the approval saga.

use kara_core::{identity::IdentityProvider, store::MemberStore};

/// Undo for one completed approval step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
  DeleteAccount(String),
  DeleteMember(String),
  DeleteSubscription(String),
  DeleteDocument(String),
}

impl Compensation {
  async fn run<S: MemberStore, I: IdentityProvider>(
    &self,
    store: &S,
    identity: &I,
  ) -> Result<(), crate::BoxError> {
    match self {
      Self::DeleteAccount(uid) => identity.delete_account(uid).await?,
      Self::DeleteMember(matricule) => store.delete_member(matricule).await?,
      Self::DeleteSubscription(id) => store.delete_subscription(id).await?,
      Self::DeleteDocument(id) => store.delete_document(id).await?,
    }
    Ok(())
  }
}

/// Compensations for the steps completed so far, undone last-in first-out.
#[derive(Debug, Default)]
pub struct RollbackStack {
  steps: Vec<Compensation>,
}

impl RollbackStack {
  pub fn push(&mut self, compensation: Compensation) { self.steps.push(compensation); }

  pub fn len(&self) -> usize { self.steps.len() }

  pub fn is_empty(&self) -> bool { self.steps.is_empty() }

  /// Run every compensation, newest first.
  ///
  /// A failing compensation is logged and the rest still run. Returns how
  /// many failed.
  pub async fn unwind<S: MemberStore, I: IdentityProvider>(
    self,
    store: &S,
    identity: &I,
  ) -> usize {
    let mut failures = 0;
    for compensation in self.steps.into_iter().rev() {
      match compensation.run(store, identity).await {
        Ok(()) => tracing::info!(?compensation, "rolled back"),
        Err(e) => {
          failures += 1;
          tracing::error!(?compensation, error = %e, "rollback step failed; manual cleanup needed");
        }
      }
    }
    failures
  }
}
