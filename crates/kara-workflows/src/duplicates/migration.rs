//! Batch backfill of detection state over every existing request.

use kara_core::{
  normalize::{DetectionKeys, normalize_contacts},
  request::DetectionFields,
  store::RequestStore,
};
use serde::Serialize;

use super::{cleanup_old_groups, find_matches, mark_requests_as_duplicates, update_duplicate_groups};
use crate::DuplicateError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
  pub processed:        usize,
  /// Requests sharing at least one key with another request.
  pub duplicates_found: usize,
}

/// Re-run normalisation, detection and grouping over every request.
///
/// The first pass drops each request from its old groups and persists fresh
/// normalised keys for all of them. The second pass detects against that
/// fully normalised collection, so the order requests are visited in does not
/// affect which groups are found.
#[tracing::instrument(skip_all)]
pub async fn migrate_duplicates<S: RequestStore>(store: &S) -> Result<MigrationReport, DuplicateError> {
  let requests = store.list_requests().await.map_err(DuplicateError::store)?;

  for request in &requests {
    cleanup_old_groups(store, &request.id, &request.duplicate_group_ids).await?;
    let keys = DetectionKeys::of(request);
    store
      .write_detection_fields(&request.id, DetectionFields {
        normalized_email:               keys.email,
        normalized_identity_doc_number: keys.doc_number,
        contacts:                       normalize_contacts(&request.identity.contacts),
      })
      .await
      .map_err(DuplicateError::store)?;
  }
  tracing::info!(requests = requests.len(), "normalised all requests");

  let mut report = MigrationReport::default();
  for request in &requests {
    report.processed += 1;

    let keys = DetectionKeys::of(request);
    let matches = find_matches(store, &request.id, &keys).await?;
    if matches.is_empty() {
      continue;
    }
    report.duplicates_found += 1;

    let group_ids = update_duplicate_groups(store, &request.id, &matches, &keys).await?;
    for group_id in &group_ids {
      let Some(group) = store
        .get_group(group_id)
        .await
        .map_err(DuplicateError::store)?
      else {
        continue;
      };
      let members: Vec<String> = group.request_ids.into_iter().collect();
      mark_requests_as_duplicates(store, &members, group_id).await?;
    }
  }

  tracing::info!(
    processed = report.processed,
    duplicates_found = report.duplicates_found,
    "duplicate migration finished"
  );
  Ok(report)
}
