//! JSON REST API for the KARA back office.
//!
//! Exposes an axum [`Router`] backed by any [`MemberStore`] and
//! [`IdentityProvider`]. Callers authenticate with HTTP Basic
//! `email:password`; TLS and transport concerns are the caller's
//! responsibility.
//!
//! Every handler that writes a membership request runs the duplicate trigger
//! before responding, bounded by [`ApiConfig::trigger_timeout`].

pub mod approvals;
pub mod auth;
pub mod error;
pub mod groups;
pub mod members;
pub mod requests;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, patch, post},
};
use kara_core::{identity::IdentityProvider, store::MemberStore};
use kara_workflows::{
  approval::ApprovalConfig,
  duplicates::{RequestWrite, on_request_write},
};

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub approval:         ApprovalConfig,
  pub trigger_timeout:  Duration,
  pub approval_timeout: Duration,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      approval:         ApprovalConfig::default(),
      trigger_timeout:  Duration::from_secs(120),
      approval_timeout: Duration::from_secs(60),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, I> {
  pub store:    Arc<S>,
  pub identity: Arc<I>,
  pub config:   Arc<ApiConfig>,
}

impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      identity: Arc::clone(&self.identity),
      config:   Arc::clone(&self.config),
    }
  }
}

impl<S, I> AppState<S, I> {
  pub fn new(store: S, identity: I, config: ApiConfig) -> Self {
    Self {
      store:    Arc::new(store),
      identity: Arc::new(identity),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, I>(state: AppState<S, I>) -> Router<()>
where
  S: MemberStore + 'static,
  I: IdentityProvider + 'static,
{
  Router::new()
    // Membership requests
    .route(
      "/membership-requests",
      get(requests::list::<S, I>).post(requests::create::<S, I>),
    )
    .route(
      "/membership-requests/{id}",
      get(requests::get_one::<S, I>)
        .put(requests::update::<S, I>)
        .delete(requests::delete_one::<S, I>),
    )
    .route("/membership-requests/{id}/review", patch(requests::review::<S, I>))
    // Duplicate groups
    .route("/duplicate-groups", get(groups::list::<S, I>))
    .route("/duplicate-groups/{id}", get(groups::get_one::<S, I>))
    .route("/duplicate-groups/{id}/resolve", post(groups::resolve::<S, I>))
    .route("/admin/duplicates/migrate", post(groups::migrate::<S, I>))
    // Approval
    .route("/approvals", post(approvals::approve::<S, I>))
    // Members
    .route("/members/{matricule}", get(members::get_one::<S, I>))
    .route("/members/{matricule}/subscriptions", get(members::subscriptions::<S, I>))
    .route("/notifications", get(members::notifications::<S, I>))
    .with_state(state)
}

/// Run the duplicate trigger for `write`, giving up after `timeout`.
///
/// Never fails; the outcome only reaches the logs.
pub(crate) async fn dispatch_trigger<S: MemberStore>(store: &S, write: RequestWrite, timeout: Duration) {
  if tokio::time::timeout(timeout, on_request_write(store, &write))
    .await
    .is_err()
  {
    tracing::warn!(request_id = %write.request_id, ?timeout, "duplicate check timed out");
  }
}

#[cfg(test)]
mod tests;
