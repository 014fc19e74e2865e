//! Field normalisation: canonical comparison keys for duplicate detection.
//!
//! Every function here is total: blank or whitespace-only input yields
//! `None`, and applying a normaliser to its own output is a no-op.

use std::collections::BTreeSet;

use crate::request::MembershipRequest;

/// Trim and lower-case an email address.
pub fn normalize_email(raw: &str) -> Option<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  Some(trimmed.to_lowercase())
}

/// Upper-case an identity document number and strip all whitespace.
pub fn normalize_doc_number(raw: &str) -> Option<String> {
  let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
  if compact.is_empty() {
    return None;
  }
  Some(compact.to_uppercase())
}

/// Strip spaces, hyphens and parentheses from a phone number.
///
/// Digits and a leading `+` are preserved as-is: `+24165345678` and
/// `24165345678` are different keys.
pub fn normalize_phone(raw: &str) -> Option<String> {
  let compact: String = raw
    .chars()
    .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
    .collect();
  if compact.is_empty() {
    return None;
  }
  Some(compact)
}

/// Normalise a contact list, keeping order and dropping blanks and repeats.
pub fn normalize_contacts(contacts: &[String]) -> Vec<String> {
  let mut seen = BTreeSet::new();
  contacts
    .iter()
    .filter_map(|c| normalize_phone(c))
    .filter(|c| seen.insert(c.clone()))
    .collect()
}

// ─── Detection keys ──────────────────────────────────────────────────────────

/// The normalised keys a membership request is compared on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionKeys {
  pub email:      Option<String>,
  pub doc_number: Option<String>,
  /// Compared as a set; order in the request is irrelevant.
  pub phones:     BTreeSet<String>,
}

impl DetectionKeys {
  /// Compute the keys from the raw applicant fields of `request`.
  ///
  /// Cached `normalized*` fields are ignored so that a stale cache can never
  /// hide a key change.
  pub fn of(request: &MembershipRequest) -> Self {
    Self {
      email:      request.identity.email.as_deref().and_then(normalize_email),
      doc_number: request
        .documents
        .identity_document_number
        .as_deref()
        .and_then(normalize_doc_number),
      phones:     request
        .identity
        .contacts
        .iter()
        .filter_map(|c| normalize_phone(c))
        .collect(),
    }
  }
}
