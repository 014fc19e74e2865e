//! Handlers for duplicate groups and the duplicate backfill.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/duplicate-groups` | Admin; optional `?unresolved=true` |
//! | `GET`  | `/duplicate-groups/{id}` | Admin; 404 if not found |
//! | `POST` | `/duplicate-groups/{id}/resolve` | Admin; records who resolved it |
//! | `POST` | `/admin/duplicates/migrate` | Admin; re-runs detection over every request |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use kara_core::{group::DuplicateGroup, identity::IdentityProvider, store::MemberStore};
use kara_workflows::duplicates::{MigrationReport, migrate_duplicates};
use serde::Deserialize;

use crate::{AppState, auth::Caller, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub unresolved: bool,
}

/// `GET /duplicate-groups[?unresolved=true]`
pub async fn list<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DuplicateGroup>>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  let groups = state
    .store
    .list_groups(params.unresolved)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(groups))
}

/// `GET /duplicate-groups/{id}`
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<DuplicateGroup>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  caller.require_admin()?;
  let group = state
    .store
    .get_group(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duplicate group {id} not found")))?;
  Ok(Json(group))
}

/// `POST /duplicate-groups/{id}/resolve`
pub async fn resolve<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
  Path(id): Path<String>,
) -> Result<Json<DuplicateGroup>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let admin = caller.require_admin()?;
  let group = state
    .store
    .resolve_group(&id, &admin.uid, Utc::now())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duplicate group {id} not found")))?;
  tracing::info!(group_id = %id, admin = %admin.uid, "duplicate group resolved");
  Ok(Json(group))
}

/// `POST /admin/duplicates/migrate`
pub async fn migrate<S, I>(
  State(state): State<AppState<S, I>>,
  caller: Caller,
) -> Result<Json<MigrationReport>, ApiError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let admin = caller.require_admin()?;
  tracing::info!(admin = %admin.uid, "duplicate migration requested");
  let report = migrate_duplicates(state.store.as_ref()).await?;
  Ok(Json(report))
}
