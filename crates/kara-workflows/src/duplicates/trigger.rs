//! The reaction to every create, update or delete of a membership request.

use kara_core::{
  normalize::{DetectionKeys, normalize_contacts},
  request::{DetectionFields, MembershipRequest},
  store::RequestStore,
};

use super::{cleanup_old_groups, find_matches, mark_requests_as_duplicates, update_duplicate_groups};
use crate::DuplicateError;

/// A write to `membership-requests/{request_id}`, as before/after snapshots.
///
/// `before` is `None` on create and `after` is `None` on delete.
#[derive(Debug, Clone)]
pub struct RequestWrite {
  pub request_id: String,
  pub before:     Option<MembershipRequest>,
  pub after:      Option<MembershipRequest>,
}

impl RequestWrite {
  pub fn created(after: MembershipRequest) -> Self {
    Self {
      request_id: after.id.clone(),
      before:     None,
      after:      Some(after),
    }
  }

  pub fn updated(before: MembershipRequest, after: MembershipRequest) -> Self {
    Self {
      request_id: after.id.clone(),
      before:     Some(before),
      after:      Some(after),
    }
  }

  pub fn deleted(before: MembershipRequest) -> Self {
    Self {
      request_id: before.id.clone(),
      before:     Some(before),
      after:      None,
    }
  }
}

/// What [`handle_write`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
  /// Neither snapshot was present.
  Ignored,
  /// The request was deleted and released from its groups.
  Removed,
  /// Detection keys did not change; nothing was written.
  Unchanged,
  /// Keys were recomputed and no other request shares any of them.
  Clean,
  /// The request now belongs to these groups.
  Flagged(Vec<String>),
}

/// Recompute a request's detection state after a write.
pub async fn handle_write<S: RequestStore>(
  store: &S,
  write: &RequestWrite,
) -> Result<TriggerOutcome, DuplicateError> {
  let request_id = write.request_id.as_str();

  let after = match (&write.before, &write.after) {
    (None, None) => return Ok(TriggerOutcome::Ignored),
    (Some(before), None) => {
      cleanup_old_groups(store, request_id, &before.duplicate_group_ids).await?;
      return Ok(TriggerOutcome::Removed);
    }
    (_, Some(after)) => after,
  };

  let keys = DetectionKeys::of(after);
  let contacts = normalize_contacts(&after.identity.contacts);

  if let Some(before) = &write.before {
    if DetectionKeys::of(before) == keys {
      // Reformatted numbers still have to be stored normalised, or phone
      // lookups stop finding this request.
      if after.identity.contacts != contacts {
        store
          .write_contacts(request_id, contacts)
          .await
          .map_err(DuplicateError::store)?;
      }
      return Ok(TriggerOutcome::Unchanged);
    }
    cleanup_old_groups(store, request_id, &before.duplicate_group_ids).await?;
  }

  store
    .write_detection_fields(request_id, DetectionFields {
      normalized_email:               keys.email.clone(),
      normalized_identity_doc_number: keys.doc_number.clone(),
      contacts,
    })
    .await
    .map_err(DuplicateError::store)?;

  let matches = find_matches(store, request_id, &keys).await?;
  if matches.is_empty() {
    return Ok(TriggerOutcome::Clean);
  }

  let group_ids = update_duplicate_groups(store, request_id, &matches, &keys).await?;

  // Mark the full current membership so that older members regain the
  // group id even if this write did not touch them.
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

  Ok(TriggerOutcome::Flagged(group_ids))
}

/// Run [`handle_write`], logging the outcome. Errors are logged and dropped;
/// the trigger has no caller to report to.
#[tracing::instrument(skip_all, fields(request_id = %write.request_id))]
pub async fn on_request_write<S: RequestStore>(store: &S, write: &RequestWrite) {
  match handle_write(store, write).await {
    Ok(TriggerOutcome::Flagged(group_ids)) => {
      tracing::info!(groups = group_ids.len(), "request flagged as duplicate");
    }
    Ok(outcome) => tracing::debug!(?outcome, "duplicate check finished"),
    Err(e) => tracing::error!(error = %e, "duplicate check failed"),
  }
}
