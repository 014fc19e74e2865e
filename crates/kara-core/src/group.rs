//! Duplicate groups, one per shared normalised key.
//!
//! A group exists only while at least two requests share its
//! `(type, value)` pair. `request_count` always equals the size of
//! `request_ids`; both are maintained together by the methods below.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Which normalised key a group was formed on.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum DuplicateMatchType {
  Phone,
  Email,
  IdentityDocument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
  pub id:            String,
  #[serde(rename = "type")]
  pub kind:          DuplicateMatchType,
  /// The shared normalised key.
  pub value:         String,
  pub request_ids:   BTreeSet<String>,
  pub request_count: usize,
  pub detected_at:   DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  /// Set by an administrator only; automation never touches it.
  #[serde(default)]
  pub resolved_at:   Option<DateTime<Utc>>,
  #[serde(default)]
  pub resolved_by:   Option<String>,
}

impl DuplicateGroup {
  pub fn new(
    id: String,
    kind: DuplicateMatchType,
    value: String,
    request_ids: BTreeSet<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      kind,
      value,
      request_count: request_ids.len(),
      request_ids,
      detected_at: now,
      updated_at: now,
      resolved_at: None,
      resolved_by: None,
    }
  }

  /// Union `ids` into the member set.
  pub fn merge(&mut self, ids: impl IntoIterator<Item = String>, now: DateTime<Utc>) {
    self.request_ids.extend(ids);
    self.request_count = self.request_ids.len();
    self.updated_at = now;
  }

  /// Drop `request_id` from the member set and return how many remain.
  pub fn remove(&mut self, request_id: &str, now: DateTime<Utc>) -> usize {
    self.request_ids.remove(request_id);
    self.request_count = self.request_ids.len();
    self.updated_at = now;
    self.request_count
  }

  pub fn is_resolved(&self) -> bool { self.resolved_at.is_some() }
}
