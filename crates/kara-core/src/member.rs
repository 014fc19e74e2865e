//! Members and the records created when a request is approved.

use std::collections::BTreeSet;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  request::{Address, MembershipRequest},
};

// ─── Membership types and roles ──────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MembershipType {
  Adherant,
  Bienfaiteur,
  Sympathisant,
}

impl MembershipType {
  /// Parse the wire name, e.g. `"adherant"`.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::UnknownMembershipType(s.to_string()))
  }

  /// The member role granted by this membership type.
  pub fn role(self) -> UserRole {
    match self {
      Self::Adherant => UserRole::Adherant,
      Self::Bienfaiteur => UserRole::Bienfaiteur,
      Self::Sympathisant => UserRole::Sympathisant,
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum UserRole {
  Adherant,
  Bienfaiteur,
  Sympathisant,
  Admin,
  SuperAdmin,
  Secretary,
}

impl UserRole {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownRole(s.to_string()))
  }

  /// Roles allowed to run back-office operations.
  pub fn is_admin_like(self) -> bool {
    matches!(self, Self::Admin | Self::SuperAdmin | Self::Secretary)
  }
}

// ─── Member ──────────────────────────────────────────────────────────────────

/// A live member, stored at `users/{matricule}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
  pub matricule:                String,
  pub first_name:               String,
  pub last_name:                String,
  #[serde(default)]
  pub civility:                 Option<String>,
  #[serde(default)]
  pub birth_date:               Option<NaiveDate>,
  #[serde(default)]
  pub gender:                   Option<String>,
  #[serde(default)]
  pub nationality:              Option<String>,
  /// Generated login email.
  pub email:                    String,
  /// Email the applicant gave on the request, if any.
  #[serde(default)]
  pub contact_email:            Option<String>,
  #[serde(default)]
  pub contacts:                 Vec<String>,
  #[serde(default)]
  pub address:                  Option<Address>,
  #[serde(default)]
  pub company_id:               Option<String>,
  #[serde(default)]
  pub profession_id:            Option<String>,
  #[serde(default)]
  pub identity_document:        Option<String>,
  #[serde(default)]
  pub identity_document_number: Option<String>,
  pub membership_type:          MembershipType,
  pub roles:                    Vec<UserRole>,
  #[serde(default)]
  pub subscriptions:            BTreeSet<String>,
  pub is_active:                bool,
  pub request_id:               String,
  pub created_by:               String,
  pub created_at:               DateTime<Utc>,
  pub updated_at:               DateTime<Utc>,
}

/// Inputs for [`Member::from_request`] beyond the request itself.
#[derive(Debug, Clone)]
pub struct Enrollment {
  pub matricule:       String,
  pub email:           String,
  pub membership_type: MembershipType,
  pub company_id:      Option<String>,
  pub profession_id:   Option<String>,
  pub admin_id:        String,
}

impl Member {
  /// Denormalise `request` into a new member with no subscriptions yet.
  pub fn from_request(
    request: &MembershipRequest,
    enrollment: Enrollment,
    now: DateTime<Utc>,
  ) -> Self {
    let identity = &request.identity;
    Self {
      matricule: enrollment.matricule,
      first_name: identity.first_name.clone(),
      last_name: identity.last_name.clone(),
      civility: identity.civility.clone(),
      birth_date: identity.birth_date,
      gender: identity.gender.clone(),
      nationality: identity.nationality.clone(),
      email: enrollment.email,
      contact_email: identity.email.clone(),
      contacts: identity.contacts.clone(),
      address: request.address.clone(),
      company_id: enrollment.company_id,
      profession_id: enrollment.profession_id,
      identity_document: request.documents.identity_document.clone(),
      identity_document_number: request
        .documents
        .identity_document_number
        .clone(),
      membership_type: enrollment.membership_type,
      roles: vec![enrollment.membership_type.role()],
      subscriptions: BTreeSet::new(),
      is_active: true,
      request_id: request.id.clone(),
      created_by: enrollment.admin_id,
      created_at: now,
      updated_at: now,
    }
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
  Active,
  Expired,
  Suspended,
}

/// One membership period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
  pub id:              String,
  pub member_id:       String,
  pub membership_type: MembershipType,
  pub start_date:      DateTime<Utc>,
  pub end_date:        DateTime<Utc>,
  pub status:          SubscriptionStatus,
  #[serde(rename = "adhesionPdfURL")]
  pub adhesion_pdf_url: String,
  pub created_by:      String,
  pub created_at:      DateTime<Utc>,
}

impl Subscription {
  /// An active subscription running one calendar year from `now`.
  pub fn yearly(
    id: String,
    member_id: String,
    membership_type: MembershipType,
    adhesion_pdf_url: String,
    created_by: String,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      member_id,
      membership_type,
      start_date: now,
      end_date: one_year_after(now),
      status: SubscriptionStatus::Active,
      adhesion_pdf_url,
      created_by,
      created_at: now,
    }
  }
}

/// Calendar-year arithmetic; 29 February rolls back to 28 February.
pub fn one_year_after(start: DateTime<Utc>) -> DateTime<Utc> {
  start
    .checked_add_months(Months::new(12))
    .unwrap_or(start + chrono::Duration::days(365))
}

// ─── Archived document ───────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
  Adhesion,
}

/// Archival record pointing at an uploaded file; the file itself lives in
/// external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedDocument {
  pub id:            String,
  pub member_id:     String,
  pub request_id:    String,
  #[serde(rename = "type")]
  pub document_type: DocumentType,
  pub format:        String,
  pub url:           String,
  pub created_by:    String,
  pub created_at:    DateTime<Utc>,
}

// ─── Notification ────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
  MembershipApproved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id:         String,
  #[serde(rename = "type")]
  pub kind:       NotificationKind,
  pub title:      String,
  pub message:    String,
  #[serde(default)]
  pub member_id:  Option<String>,
  #[serde(default)]
  pub request_id: Option<String>,
  pub is_read:    bool,
  pub created_at: DateTime<Utc>,
}
