//! Membership requests, one per applicant.
//!
//! The applicant-editable part of a request is [`RequestApplication`]. The
//! `normalized*`, `isDuplicate` and `duplicateGroupIds` fields are owned by the
//! write trigger and are never set by any other writer.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
  #[default]
  Pending,
  UnderReview,
  Approved,
  Rejected,
}

impl RequestStatus {
  /// Whether a request in this status may be turned into a member.
  pub fn is_approvable(self) -> bool {
    matches!(self, Self::Pending | Self::UnderReview)
  }
}

// ─── Applicant fields ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestIdentity {
  pub civility:    Option<String>,
  pub first_name:  String,
  pub last_name:   String,
  pub birth_date:  Option<NaiveDate>,
  pub nationality: Option<String>,
  pub gender:      Option<String>,
  pub email:       Option<String>,
  /// Phone numbers. Normalised in place by the write trigger.
  pub contacts:    Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
  pub province:       Option<String>,
  pub city:           Option<String>,
  pub district:       Option<String>,
  pub arrondissement: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyInfo {
  pub company_id:    Option<String>,
  pub profession_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentityDocuments {
  /// Kind of document, e.g. "CNI" or "Passeport".
  pub identity_document:        Option<String>,
  pub identity_document_number: Option<String>,
  pub expiration_date:          Option<NaiveDate>,
}

/// Everything an applicant submits; the input of create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestApplication {
  pub matricule: Option<String>,
  pub identity:  RequestIdentity,
  pub address:   Option<Address>,
  pub company:   Option<CompanyInfo>,
  pub documents: IdentityDocuments,
}

// ─── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
  pub id:         String,
  #[serde(default)]
  pub matricule:  Option<String>,
  pub identity:   RequestIdentity,
  #[serde(default)]
  pub address:    Option<Address>,
  #[serde(default)]
  pub company:    Option<CompanyInfo>,
  #[serde(default)]
  pub documents:  IdentityDocuments,
  #[serde(default)]
  pub status:     RequestStatus,
  #[serde(default)]
  pub is_paid:    bool,

  // ── Trigger-owned cache ────────────────────────────────────────────────
  #[serde(default)]
  pub normalized_email:               Option<String>,
  #[serde(default)]
  pub normalized_identity_doc_number: Option<String>,
  #[serde(default)]
  pub is_duplicate:                   bool,
  /// Exactly the ids of the duplicate groups listing this request.
  #[serde(default)]
  pub duplicate_group_ids:            BTreeSet<String>,

  // ── Approval ───────────────────────────────────────────────────────────
  #[serde(default)]
  pub approved_by: Option<String>,
  #[serde(default)]
  pub approved_at: Option<DateTime<Utc>>,

  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl MembershipRequest {
  /// A freshly submitted request: pending, unpaid, no duplicate state.
  pub fn submitted(id: String, application: RequestApplication, now: DateTime<Utc>) -> Self {
    Self {
      id,
      matricule: application.matricule,
      identity: application.identity,
      address: application.address,
      company: application.company,
      documents: application.documents,
      status: RequestStatus::Pending,
      is_paid: false,
      normalized_email: None,
      normalized_identity_doc_number: None,
      is_duplicate: false,
      duplicate_group_ids: BTreeSet::new(),
      approved_by: None,
      approved_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// Replace the applicant-editable fields, leaving status, payment and the
  /// trigger-owned cache untouched.
  pub fn apply(&mut self, application: RequestApplication, now: DateTime<Utc>) {
    self.matricule = application.matricule;
    self.identity = application.identity;
    self.address = application.address;
    self.company = application.company;
    self.documents = application.documents;
    self.updated_at = now;
  }

  /// The member identifier this request will be promoted under.
  pub fn effective_matricule(&self) -> &str {
    match self.matricule.as_deref().map(str::trim) {
      Some(m) if !m.is_empty() => m,
      _ => &self.id,
    }
  }
}

// ─── Partial updates ─────────────────────────────────────────────────────────

/// Trigger-computed fields persisted in step "normalise and reset".
///
/// Writing these always resets `isDuplicate` to `false` and
/// `duplicateGroupIds` to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionFields {
  pub normalized_email:               Option<String>,
  pub normalized_identity_doc_number: Option<String>,
  /// Normalised replacement for `identity.contacts`.
  pub contacts:                       Vec<String>,
}

/// Admin edits to status and payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestReview {
  pub status:  Option<RequestStatus>,
  pub is_paid: Option<bool>,
}
