//! Handlers for `/membership-requests` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/membership-requests` | Admin |
//! | `POST`   | `/membership-requests` | Body: request application; anyone may submit |
//! | `GET`    | `/membership-requests/{id}` | Admin; 404 if not found |
//! | `PUT`    | `/membership-requests/{id}` | Replaces applicant fields; matricule changes need admin |
//! | `PATCH`  | `/membership-requests/{id}/review` | Admin; body: `{"status"?, "isPaid"?}` |
//! | `DELETE` | `/membership-requests/{id}` | Admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use kara_core::{
  identity::IdentityProvider,
  request::{MembershipRequest, RequestApplication, RequestReview, RequestStatus},
  store::{MemberStore, RequestStore},
};
use kara_workflows::duplicates::RequestWrite;
use uuid::Uuid;

use crate::{AppState, auth::Caller, dispatch_trigger, error::ApiError};

async fn load<S: RequestStore>(store: &S, id: &str) -> Result<MembershipRequest, ApiError> {
  store
    .get_request(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("membership request {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /membership-requests`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
) -> Result<Json<Vec<MembershipRequest>>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  let requests = state.store.list_requests().await.map_err(ApiError::store)?;
  Ok(Json(requests))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /membership-requests`
pub async fn create<S, I>(
  State(state): State<AppState<S, I>>,
  Json(application): Json<RequestApplication>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let request = MembershipRequest::submitted(Uuid::new_v4().to_string(), application, Utc::now());
  let id = request.id.clone();

  state
    .store
    .put_request(request.clone())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(request_id = %id, "membership request submitted");

  dispatch_trigger(
    state.store.as_ref(),
    RequestWrite::created(request),
    state.config.trigger_timeout,
  )
  .await;

  let stored = load(state.store.as_ref(), &id).await?;
  Ok((StatusCode::CREATED, Json(stored)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /membership-requests/{id}`
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<MembershipRequest>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  Ok(Json(load(state.store.as_ref(), &id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /membership-requests/{id}`
///
/// Only admins may change the matricule, which becomes the member id on
/// approval.
pub async fn update<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
  Json(application): Json<RequestApplication>,
) -> Result<Json<MembershipRequest>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let before = load(state.store.as_ref(), &id).await?;
  if !before.status.is_approvable() {
    return Err(ApiError::BadRequest(format!(
      "membership request {id} is {} and can no longer be edited",
      before.status
    )));
  }
  if application.matricule != before.matricule {
    caller.require_admin()?;
  }

  let mut after = before.clone();
  after.apply(application, Utc::now());
  state
    .store
    .put_request(after.clone())
    .await
    .map_err(ApiError::store)?;

  dispatch_trigger(
    state.store.as_ref(),
    RequestWrite::updated(before, after),
    state.config.trigger_timeout,
  )
  .await;

  Ok(Json(load(state.store.as_ref(), &id).await?))
}

// ─── Review ───────────────────────────────────────────────────────────────────

/// `PATCH /membership-requests/{id}/review`
pub async fn review<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
  Json(review): Json<RequestReview>,
) -> Result<Json<MembershipRequest>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let admin = caller.require_admin()?;
  if review.status == Some(RequestStatus::Approved) {
    return Err(ApiError::BadRequest(
      "requests are approved through /approvals".to_string(),
    ));
  }

  let before = load(state.store.as_ref(), &id).await?;
  let after = state
    .store
    .set_review(&id, review)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("membership request {id} not found")))?;
  tracing::info!(request_id = %id, admin = %admin.uid, status = %after.status, is_paid = after.is_paid, "request reviewed");

  dispatch_trigger(
    state.store.as_ref(),
    RequestWrite::updated(before, after.clone()),
    state.config.trigger_timeout,
  )
  .await;

  Ok(Json(after))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /membership-requests/{id}`
pub async fn delete_one<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  let before = load(state.store.as_ref(), &id).await?;
  if !state.store.delete_request(&id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("membership request {id} not found")));
  }
  tracing::info!(request_id = %id, "membership request deleted");

  dispatch_trigger(
    state.store.as_ref(),
    RequestWrite::deleted(before),
    state.config.trigger_timeout,
  )
  .await;

  Ok(StatusCode::NO_CONTENT)
}
