//! `POST /approvals` — the membership approval callable.
//!
//! Body: `{"requestId", "adminId", "membershipType", "companyId"?,
//! "professionId"?, "adhesionPdfURL"}`. The response carries the new
//! member's generated password; it is never shown again.

use axum::{Json, extract::State};
use kara_core::{identity::IdentityProvider, store::MemberStore};
use kara_workflows::approval::{ApprovalRequest, ApprovalResponse, approve_membership};

use crate::{AppState, auth::Caller, error::ApiError};

/// `POST /approvals`
///
/// Bounded by [`crate::ApiConfig::approval_timeout`]. A timeout abandons the
/// saga where it stands, compensations included.
pub async fn approve<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(caller): Caller,
  Json(body): Json<ApprovalRequest>,
) -> Result<Json<ApprovalResponse>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let approval = approve_membership(
    state.store.as_ref(),
    state.identity.as_ref(),
    caller.as_ref(),
    body,
    &state.config.approval,
  );

  let response = tokio::time::timeout(state.config.approval_timeout, approval)
    .await
    .map_err(|_| ApiError::Timeout("approval"))??;
  Ok(Json(response))
}
