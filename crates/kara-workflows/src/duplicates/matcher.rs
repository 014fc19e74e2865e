//! Per-key lookups of requests sharing a normalised key.

use std::collections::BTreeMap;

use kara_core::{normalize::DetectionKeys, store::RequestStore};

use crate::DuplicateError;

/// Other requests sharing each of a request's keys.
///
/// Only keys with at least one match appear in `by_phone`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateMatches {
  pub by_phone:        BTreeMap<String, Vec<String>>,
  pub by_email:        Vec<String>,
  pub by_identity_doc: Vec<String>,
}

impl DuplicateMatches {
  pub fn is_empty(&self) -> bool {
    self.by_phone.is_empty() && self.by_email.is_empty() && self.by_identity_doc.is_empty()
  }
}

/// Look up every other request sharing one of `keys`.
///
/// Each key is queried independently. No cross-key correlation happens here.
pub async fn find_matches<S: RequestStore>(
  store: &S,
  request_id: &str,
  keys: &DetectionKeys,
) -> Result<DuplicateMatches, DuplicateError> {
  let mut matches = DuplicateMatches::default();

  for phone in &keys.phones {
    let others = store
      .find_by_phone(phone, request_id)
      .await
      .map_err(DuplicateError::store)?;
    if !others.is_empty() {
      matches.by_phone.insert(phone.clone(), others);
    }
  }

  if let Some(email) = &keys.email {
    matches.by_email = store
      .find_by_email(email, request_id)
      .await
      .map_err(DuplicateError::store)?;
  }

  if let Some(doc_number) = &keys.doc_number {
    matches.by_identity_doc = store
      .find_by_doc_number(doc_number, request_id)
      .await
      .map_err(DuplicateError::store)?;
  }

  Ok(matches)
}
