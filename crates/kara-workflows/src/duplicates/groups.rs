//! Group consolidation: upsert, mark and shrink duplicate groups.

use std::collections::BTreeSet;

use chrono::Utc;
use kara_core::{
  group::{DuplicateGroup, DuplicateMatchType},
  normalize::DetectionKeys,
  store::RequestStore,
};
use uuid::Uuid;

use super::DuplicateMatches;
use crate::DuplicateError;

/// Upsert one group per key that has matches, each with member set
/// `{request_id} ∪ others`. Returns the ids of the groups touched.
pub async fn update_duplicate_groups<S: RequestStore>(
  store: &S,
  request_id: &str,
  matches: &DuplicateMatches,
  keys: &DetectionKeys,
) -> Result<Vec<String>, DuplicateError> {
  let mut touched = Vec::new();

  for (phone, others) in &matches.by_phone {
    let id = upsert_group(store, DuplicateMatchType::Phone, phone, request_id, others).await?;
    touched.push(id);
  }

  if let Some(email) = keys.email.as_ref().filter(|_| !matches.by_email.is_empty()) {
    let id =
      upsert_group(store, DuplicateMatchType::Email, email, request_id, &matches.by_email).await?;
    touched.push(id);
  }

  if let Some(doc_number) = keys
    .doc_number
    .as_ref()
    .filter(|_| !matches.by_identity_doc.is_empty())
  {
    let id = upsert_group(
      store,
      DuplicateMatchType::IdentityDocument,
      doc_number,
      request_id,
      &matches.by_identity_doc,
    )
    .await?;
    touched.push(id);
  }

  Ok(touched)
}

async fn upsert_group<S: RequestStore>(
  store: &S,
  kind: DuplicateMatchType,
  value: &str,
  request_id: &str,
  others: &[String],
) -> Result<String, DuplicateError> {
  let now = Utc::now();
  let ids = std::iter::once(request_id.to_owned()).chain(others.iter().cloned());

  let existing = store
    .find_group(kind, value)
    .await
    .map_err(DuplicateError::store)?;

  match existing {
    Some(mut group) => {
      group.merge(ids, now);
      store
        .set_group_members(&group.id, &group.request_ids, now)
        .await
        .map_err(DuplicateError::store)?;
      tracing::debug!(group_id = %group.id, %kind, request_count = group.request_count, "merged duplicate group");
      Ok(group.id)
    }
    None => {
      let group = DuplicateGroup::new(
        Uuid::new_v4().to_string(),
        kind,
        value.to_owned(),
        ids.collect(),
        now,
      );
      let id = group.id.clone();
      tracing::info!(group_id = %id, %kind, request_count = group.request_count, "created duplicate group");
      store
        .insert_group(group)
        .await
        .map_err(DuplicateError::store)?;
      Ok(id)
    }
  }
}

/// Flag every listed request as a duplicate and add `group_id` to its
/// `duplicateGroupIds`, in one batch.
pub async fn mark_requests_as_duplicates<S: RequestStore>(
  store: &S,
  request_ids: &[String],
  group_id: &str,
) -> Result<(), DuplicateError> {
  store
    .mark_duplicates(request_ids, group_id)
    .await
    .map_err(DuplicateError::store)
}

/// Remove `request_id` from each of `old_group_ids`.
///
/// A group left with one member or none is deleted, and a lone survivor is
/// released from it.
pub async fn cleanup_old_groups<S: RequestStore>(
  store: &S,
  request_id: &str,
  old_group_ids: &BTreeSet<String>,
) -> Result<(), DuplicateError> {
  for group_id in old_group_ids {
    let Some(mut group) = store
      .get_group(group_id)
      .await
      .map_err(DuplicateError::store)?
    else {
      tracing::debug!(%request_id, %group_id, "stale group reference");
      continue;
    };

    let now = Utc::now();
    let remaining = group.remove(request_id, now);

    if remaining > 1 {
      store
        .set_group_members(group_id, &group.request_ids, now)
        .await
        .map_err(DuplicateError::store)?;
      tracing::debug!(%request_id, %group_id, remaining, "shrunk duplicate group");
      continue;
    }

    store
      .delete_group(group_id)
      .await
      .map_err(DuplicateError::store)?;
    for survivor in &group.request_ids {
      store
        .release_from_group(survivor, group_id)
        .await
        .map_err(DuplicateError::store)?;
    }
    tracing::info!(%request_id, %group_id, "deleted duplicate group");
  }

  Ok(())
}
