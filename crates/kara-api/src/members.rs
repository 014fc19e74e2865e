//! Read-only handlers for members, their subscriptions and notifications.

use axum::{
  Json,
  extract::{Path, State},
};
use kara_core::{
  identity::IdentityProvider,
  member::{Member, Notification, Subscription},
  store::MemberStore,
};

use crate::{AppState, auth::Caller, error::ApiError};

/// `GET /members/{matricule}`, for admins or the member themself.
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(matricule): Path<String>,
) -> Result<Json<Member>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin_or(&matricule)?;
  let member = state
    .store
    .get_member(&matricule)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {matricule} not found")))?;
  Ok(Json(member))
}

/// `GET /members/{matricule}/subscriptions`
pub async fn subscriptions<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(matricule): Path<String>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin_or(&matricule)?;
  let subscriptions = state
    .store
    .list_member_subscriptions(&matricule)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subscriptions))
}

/// `GET /notifications` — newest first.
pub async fn notifications<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  let notifications = state
    .store
    .list_notifications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notifications))
}
