//! Storage traits for membership requests, duplicate groups and members.
//!
//! The traits are implemented by storage backends (e.g. `kara-store-sqlite`).
//! Higher layers (`kara-workflows`, `kara-api`) depend on these abstractions,
//! not on any concrete backend.
//!
//! Each method is a single-document operation unless documented otherwise.
//! No method spans several unrelated documents in one transaction; the
//! workflows built on top are read-then-write and tolerate interleaving.

use std::{collections::BTreeSet, future::Future};

use chrono::{DateTime, Utc};

use crate::{
  group::{DuplicateGroup, DuplicateMatchType},
  member::{ArchivedDocument, Member, Notification, Subscription},
  request::{DetectionFields, MembershipRequest, RequestReview},
};

// ─── Requests and duplicate groups ───────────────────────────────────────────

/// The `membership-requests` and `duplicate-groups` collections.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RequestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Create or fully replace a request.
  fn put_request(
    &self,
    request: MembershipRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a request by id. Returns `None` if not found.
  fn get_request<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<MembershipRequest>, Self::Error>> + Send + 'a;

  /// All requests, oldest first.
  fn list_requests(
    &self,
  ) -> impl Future<Output = Result<Vec<MembershipRequest>, Self::Error>> + Send + '_;

  /// Delete a request. Returns `false` if it did not exist.
  fn delete_request<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Persist normalised keys and contacts, resetting `isDuplicate` to
  /// `false` and `duplicateGroupIds` to empty.
  fn write_detection_fields<'a>(
    &'a self,
    id: &'a str,
    fields: DetectionFields,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace `identity.contacts` only, leaving every other field and the
  /// duplicate state as stored.
  fn write_contacts<'a>(
    &'a self,
    id: &'a str,
    contacts: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Ids of requests other than `exclude` whose contact list holds `phone`.
  fn find_by_phone<'a>(
    &'a self,
    phone: &'a str,
    exclude: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Ids of requests other than `exclude` with this normalised email.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
    exclude: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// Ids of requests other than `exclude` with this normalised document
  /// number.
  fn find_by_doc_number<'a>(
    &'a self,
    doc_number: &'a str,
    exclude: &'a str,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'a;

  /// In one atomic batch, set `isDuplicate = true` and union `group_id` into
  /// `duplicateGroupIds` for every listed request. Missing requests are
  /// skipped.
  fn mark_duplicates<'a>(
    &'a self,
    request_ids: &'a [String],
    group_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove `group_id` from the request's `duplicateGroupIds` and recompute
  /// `isDuplicate` from what remains. Missing requests are ignored.
  fn release_from_group<'a>(
    &'a self,
    request_id: &'a str,
    group_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Apply an admin review. Returns the updated request, or `None` if it
  /// does not exist.
  fn set_review<'a>(
    &'a self,
    id: &'a str,
    review: RequestReview,
  ) -> impl Future<Output = Result<Option<MembershipRequest>, Self::Error>> + Send + 'a;

  /// Mark a request `approved` by `approved_by` at `approved_at`.
  fn set_approved<'a>(
    &'a self,
    id: &'a str,
    approved_by: &'a str,
    approved_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Duplicate groups ──────────────────────────────────────────────────

  /// Look up the group for an exact `(type, value)` pair.
  fn find_group<'a>(
    &'a self,
    kind: DuplicateMatchType,
    value: &'a str,
  ) -> impl Future<Output = Result<Option<DuplicateGroup>, Self::Error>> + Send + 'a;

  fn get_group<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<DuplicateGroup>, Self::Error>> + Send + 'a;

  /// All groups, optionally only those no administrator has resolved.
  fn list_groups(
    &self,
    unresolved_only: bool,
  ) -> impl Future<Output = Result<Vec<DuplicateGroup>, Self::Error>> + Send + '_;

  fn insert_group(
    &self,
    group: DuplicateGroup,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace a group's member set; `requestCount` follows the set size.
  fn set_group_members<'a>(
    &'a self,
    id: &'a str,
    request_ids: &'a BTreeSet<String>,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn delete_group<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Record an administrator's resolution. Returns `None` if the group does
  /// not exist.
  fn resolve_group<'a>(
    &'a self,
    id: &'a str,
    resolved_by: &'a str,
    resolved_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<DuplicateGroup>, Self::Error>> + Send + 'a;
}

// ─── Members ─────────────────────────────────────────────────────────────────

/// The `users`, `subscriptions`, `documents` and `notifications` collections.
pub trait MemberStore: RequestStore {
  /// Create or replace the member document at `users/{matricule}`.
  fn put_member(
    &self,
    member: Member,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_member<'a>(
    &'a self,
    matricule: &'a str,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + 'a;

  fn delete_member<'a>(
    &'a self,
    matricule: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Union `subscription_id` into the member's `subscriptions`. Errors if the
  /// member does not exist.
  fn add_member_subscription<'a>(
    &'a self,
    matricule: &'a str,
    subscription_id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn create_subscription(
    &self,
    subscription: Subscription,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_subscription<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + 'a;

  fn delete_subscription<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn list_member_subscriptions<'a>(
    &'a self,
    matricule: &'a str,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;

  fn create_document(
    &self,
    document: ArchivedDocument,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_document<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn list_member_documents<'a>(
    &'a self,
    matricule: &'a str,
  ) -> impl Future<Output = Result<Vec<ArchivedDocument>, Self::Error>> + Send + 'a;

  fn create_notification(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All notifications, newest first.
  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;
}
