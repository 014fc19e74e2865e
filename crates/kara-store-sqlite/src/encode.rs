//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Nested records and id sets
//! are stored as compact JSON. Closed enums are stored under their wire names.

use std::{collections::BTreeSet, str::FromStr};

use chrono::{DateTime, Utc};
use kara_core::{
  group::{DuplicateGroup, DuplicateMatchType},
  identity::Account,
  member::{
    ArchivedDocument, DocumentType, MembershipType, Notification, NotificationKind,
    Subscription, SubscriptionStatus, UserRole,
  },
  request::{MembershipRequest, RequestStatus},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON ────────────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Parse a closed enum from its stored wire name.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode {
    kind,
    value: s.to_string(),
  })
}

pub fn encode_bool(b: bool) -> i64 { i64::from(b) }

pub fn decode_bool(i: i64) -> bool { i != 0 }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRequest::from_row`].
pub const REQUEST_COLUMNS: &str = "request_id, matricule, identity, address, company, documents,
   status, is_paid, normalized_email, normalized_doc_number, is_duplicate,
   duplicate_group_ids, approved_by, approved_at, created_at, updated_at";

/// Raw strings read directly from a `membership_requests` row.
pub struct RawRequest {
  pub request_id:            String,
  pub matricule:             Option<String>,
  pub identity:              String,
  pub address:               Option<String>,
  pub company:               Option<String>,
  pub documents:             String,
  pub status:                String,
  pub is_paid:               i64,
  pub normalized_email:      Option<String>,
  pub normalized_doc_number: Option<String>,
  pub is_duplicate:          i64,
  pub duplicate_group_ids:   String,
  pub approved_by:           Option<String>,
  pub approved_at:           Option<String>,
  pub created_at:            String,
  pub updated_at:            String,
}

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:            row.get(0)?,
      matricule:             row.get(1)?,
      identity:              row.get(2)?,
      address:               row.get(3)?,
      company:               row.get(4)?,
      documents:             row.get(5)?,
      status:                row.get(6)?,
      is_paid:               row.get(7)?,
      normalized_email:      row.get(8)?,
      normalized_doc_number: row.get(9)?,
      is_duplicate:          row.get(10)?,
      duplicate_group_ids:   row.get(11)?,
      approved_by:           row.get(12)?,
      approved_at:           row.get(13)?,
      created_at:            row.get(14)?,
      updated_at:            row.get(15)?,
    })
  }

  /// Encode a request into row form for `INSERT`.
  pub fn encode(request: &MembershipRequest) -> Result<Self> {
    let status: &'static str = request.status.into();
    Ok(Self {
      request_id:            request.id.clone(),
      matricule:             request.matricule.clone(),
      identity:              encode_json(&request.identity)?,
      address:               request.address.as_ref().map(encode_json).transpose()?,
      company:               request.company.as_ref().map(encode_json).transpose()?,
      documents:             encode_json(&request.documents)?,
      status:                status.to_owned(),
      is_paid:               encode_bool(request.is_paid),
      normalized_email:      request.normalized_email.clone(),
      normalized_doc_number: request.normalized_identity_doc_number.clone(),
      is_duplicate:          encode_bool(request.is_duplicate),
      duplicate_group_ids:   encode_json(&request.duplicate_group_ids)?,
      approved_by:           request.approved_by.clone(),
      approved_at:           request.approved_at.map(encode_dt),
      created_at:            encode_dt(request.created_at),
      updated_at:            encode_dt(request.updated_at),
    })
  }

  pub fn into_request(self) -> Result<MembershipRequest> {
    Ok(MembershipRequest {
      id:                             self.request_id,
      matricule:                      self.matricule,
      identity:                       decode_json(&self.identity)?,
      address:                        self.address.as_deref().map(decode_json).transpose()?,
      company:                        self.company.as_deref().map(decode_json).transpose()?,
      documents:                      decode_json(&self.documents)?,
      status:                         self
        .status
        .parse::<RequestStatus>()
        .map_err(|_| kara_core::Error::UnknownStatus(self.status.clone()))?,
      is_paid:                        decode_bool(self.is_paid),
      normalized_email:               self.normalized_email,
      normalized_identity_doc_number: self.normalized_doc_number,
      is_duplicate:                   decode_bool(self.is_duplicate),
      duplicate_group_ids:            decode_json(&self.duplicate_group_ids)?,
      approved_by:                    self.approved_by,
      approved_at:                    self.approved_at.as_deref().map(decode_dt).transpose()?,
      created_at:                     decode_dt(&self.created_at)?,
      updated_at:                     decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawGroup::from_row`].
pub const GROUP_COLUMNS: &str = "group_id, match_type, match_value, request_ids,
   detected_at, updated_at, resolved_at, resolved_by";

/// Raw strings read directly from a `duplicate_groups` row.
pub struct RawGroup {
  pub group_id:      String,
  pub match_type:    String,
  pub match_value:   String,
  pub request_ids:   String,
  pub detected_at:   String,
  pub updated_at:    String,
  pub resolved_at:   Option<String>,
  pub resolved_by:   Option<String>,
}

impl RawGroup {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      group_id:      row.get(0)?,
      match_type:    row.get(1)?,
      match_value:   row.get(2)?,
      request_ids:   row.get(3)?,
      detected_at:   row.get(4)?,
      updated_at:    row.get(5)?,
      resolved_at:   row.get(6)?,
      resolved_by:   row.get(7)?,
    })
  }

  pub fn into_group(self) -> Result<DuplicateGroup> {
    // `request_count` is written alongside for readers of the raw table;
    // the set is authoritative.
    let request_ids: BTreeSet<String> = decode_json(&self.request_ids)?;
    Ok(DuplicateGroup {
      id:            self.group_id,
      kind:          decode_enum::<DuplicateMatchType>("match type", &self.match_type)?,
      value:         self.match_value,
      request_count: request_ids.len(),
      request_ids,
      detected_at:   decode_dt(&self.detected_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
      resolved_at:   self.resolved_at.as_deref().map(decode_dt).transpose()?,
      resolved_by:   self.resolved_by,
    })
  }
}

/// Column list matching [`RawSubscription::from_row`].
pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, member_id, membership_type, start_date,
   end_date, status, adhesion_pdf_url, created_by, created_at";

pub struct RawSubscription {
  pub subscription_id:  String,
  pub member_id:        String,
  pub membership_type:  String,
  pub start_date:       String,
  pub end_date:         String,
  pub status:           String,
  pub adhesion_pdf_url: String,
  pub created_by:       String,
  pub created_at:       String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:  row.get(0)?,
      member_id:        row.get(1)?,
      membership_type:  row.get(2)?,
      start_date:       row.get(3)?,
      end_date:         row.get(4)?,
      status:           row.get(5)?,
      adhesion_pdf_url: row.get(6)?,
      created_by:       row.get(7)?,
      created_at:       row.get(8)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      id:               self.subscription_id,
      member_id:        self.member_id,
      membership_type:  decode_enum::<MembershipType>("membership type", &self.membership_type)?,
      start_date:       decode_dt(&self.start_date)?,
      end_date:         decode_dt(&self.end_date)?,
      status:           decode_enum::<SubscriptionStatus>("subscription status", &self.status)?,
      adhesion_pdf_url: self.adhesion_pdf_url,
      created_by:       self.created_by,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawDocument::from_row`].
pub const DOCUMENT_COLUMNS: &str =
  "document_id, member_id, request_id, document_type, format, url, created_by, created_at";

pub struct RawDocument {
  pub document_id:   String,
  pub member_id:     String,
  pub request_id:    String,
  pub document_type: String,
  pub format:        String,
  pub url:           String,
  pub created_by:    String,
  pub created_at:    String,
}

impl RawDocument {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:   row.get(0)?,
      member_id:     row.get(1)?,
      request_id:    row.get(2)?,
      document_type: row.get(3)?,
      format:        row.get(4)?,
      url:           row.get(5)?,
      created_by:    row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_document(self) -> Result<ArchivedDocument> {
    Ok(ArchivedDocument {
      id:            self.document_id,
      member_id:     self.member_id,
      request_id:    self.request_id,
      document_type: decode_enum::<DocumentType>("document type", &self.document_type)?,
      format:        self.format,
      url:           self.url,
      created_by:    self.created_by,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawNotification::from_row`].
pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, kind, title, message, member_id, request_id, is_read, created_at";

pub struct RawNotification {
  pub notification_id: String,
  pub kind:            String,
  pub title:           String,
  pub message:         String,
  pub member_id:       Option<String>,
  pub request_id:      Option<String>,
  pub is_read:         i64,
  pub created_at:      String,
}

impl RawNotification {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      kind:            row.get(1)?,
      title:           row.get(2)?,
      message:         row.get(3)?,
      member_id:       row.get(4)?,
      request_id:      row.get(5)?,
      is_read:         row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      id:         self.notification_id,
      kind:       decode_enum::<NotificationKind>("notification kind", &self.kind)?,
      title:      self.title,
      message:    self.message,
      member_id:  self.member_id,
      request_id: self.request_id,
      is_read:    decode_bool(self.is_read),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from an `accounts` row, password hash included.
pub struct RawAccount {
  pub uid:           String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Option<String>,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:           row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      uid:        self.uid,
      email:      self.email,
      role:       self.role.as_deref().map(UserRole::parse).transpose()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
