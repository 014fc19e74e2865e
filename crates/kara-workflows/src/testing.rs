//! Test fixtures: in-memory stores, sample requests and fault injection.

use std::{
  collections::{BTreeSet, HashSet},
  sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use kara_core::{
  group::{DuplicateGroup, DuplicateMatchType},
  member::{ArchivedDocument, Member, Notification, Subscription},
  request::{
    DetectionFields, IdentityDocuments, MembershipRequest, RequestApplication, RequestIdentity,
    RequestReview,
  },
  store::{MemberStore, RequestStore},
};
use kara_store_sqlite::SqliteStore;

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A submitted request for "Jean Mba" with the given raw contacts.
pub fn request(id: &str, contacts: &[&str]) -> MembershipRequest {
  let application = RequestApplication {
    matricule: None,
    identity:  RequestIdentity {
      first_name: "Jean".to_string(),
      last_name: "Mba".to_string(),
      contacts: contacts.iter().map(|c| c.to_string()).collect(),
      ..Default::default()
    },
    address:   None,
    company:   None,
    documents: IdentityDocuments::default(),
  };
  MembershipRequest::submitted(id.to_string(), application, Utc::now())
}

// ─── Fault injection ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FaultError {
  #[error("injected failure in {0}")]
  Injected(&'static str),

  #[error(transparent)]
  Store(#[from] kara_store_sqlite::Error),
}

/// Wraps a [`SqliteStore`] and fails the operations named in `failing`.
#[derive(Clone)]
pub struct FaultyStore {
  pub inner: SqliteStore,
  failing:   Arc<Mutex<HashSet<&'static str>>>,
}

impl FaultyStore {
  pub fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      failing: Arc::default(),
    }
  }

  pub fn fail(&self, op: &'static str) {
    self.failing.lock().expect("fault set").insert(op);
  }

  fn check(&self, op: &'static str) -> Result<(), FaultError> {
    if self.failing.lock().expect("fault set").contains(op) {
      return Err(FaultError::Injected(op));
    }
    Ok(())
  }
}

impl RequestStore for FaultyStore {
  type Error = FaultError;

  async fn put_request(&self, request: MembershipRequest) -> Result<(), FaultError> {
    self.check("put_request")?;
    Ok(self.inner.put_request(request).await?)
  }

  async fn get_request(&self, id: &str) -> Result<Option<MembershipRequest>, FaultError> {
    self.check("get_request")?;
    Ok(self.inner.get_request(id).await?)
  }

  async fn list_requests(&self) -> Result<Vec<MembershipRequest>, FaultError> {
    self.check("list_requests")?;
    Ok(self.inner.list_requests().await?)
  }

  async fn delete_request(&self, id: &str) -> Result<bool, FaultError> {
    self.check("delete_request")?;
    Ok(self.inner.delete_request(id).await?)
  }

  async fn write_detection_fields(&self, id: &str, fields: DetectionFields) -> Result<(), FaultError> {
    self.check("write_detection_fields")?;
    Ok(self.inner.write_detection_fields(id, fields).await?)
  }

  async fn write_contacts(&self, id: &str, contacts: Vec<String>) -> Result<(), FaultError> {
    self.check("write_contacts")?;
    Ok(self.inner.write_contacts(id, contacts).await?)
  }

  async fn find_by_phone(&self, phone: &str, exclude: &str) -> Result<Vec<String>, FaultError> {
    self.check("find_by_phone")?;
    Ok(self.inner.find_by_phone(phone, exclude).await?)
  }

  async fn find_by_email(&self, email: &str, exclude: &str) -> Result<Vec<String>, FaultError> {
    self.check("find_by_email")?;
    Ok(self.inner.find_by_email(email, exclude).await?)
  }

  async fn find_by_doc_number(&self, doc: &str, exclude: &str) -> Result<Vec<String>, FaultError> {
    self.check("find_by_doc_number")?;
    Ok(self.inner.find_by_doc_number(doc, exclude).await?)
  }

  async fn mark_duplicates(&self, ids: &[String], group_id: &str) -> Result<(), FaultError> {
    self.check("mark_duplicates")?;
    Ok(self.inner.mark_duplicates(ids, group_id).await?)
  }

  async fn release_from_group(&self, request_id: &str, group_id: &str) -> Result<(), FaultError> {
    self.check("release_from_group")?;
    Ok(self.inner.release_from_group(request_id, group_id).await?)
  }

  async fn set_review(
    &self,
    id: &str,
    review: RequestReview,
  ) -> Result<Option<MembershipRequest>, FaultError> {
    self.check("set_review")?;
    Ok(self.inner.set_review(id, review).await?)
  }

  async fn set_approved(&self, id: &str, by: &str, at: DateTime<Utc>) -> Result<(), FaultError> {
    self.check("set_approved")?;
    Ok(self.inner.set_approved(id, by, at).await?)
  }

  async fn find_group(
    &self,
    kind: DuplicateMatchType,
    value: &str,
  ) -> Result<Option<DuplicateGroup>, FaultError> {
    self.check("find_group")?;
    Ok(self.inner.find_group(kind, value).await?)
  }

  async fn get_group(&self, id: &str) -> Result<Option<DuplicateGroup>, FaultError> {
    self.check("get_group")?;
    Ok(self.inner.get_group(id).await?)
  }

  async fn list_groups(&self, unresolved_only: bool) -> Result<Vec<DuplicateGroup>, FaultError> {
    self.check("list_groups")?;
    Ok(self.inner.list_groups(unresolved_only).await?)
  }

  async fn insert_group(&self, group: DuplicateGroup) -> Result<(), FaultError> {
    self.check("insert_group")?;
    Ok(self.inner.insert_group(group).await?)
  }

  async fn set_group_members(
    &self,
    id: &str,
    ids: &BTreeSet<String>,
    at: DateTime<Utc>,
  ) -> Result<(), FaultError> {
    self.check("set_group_members")?;
    Ok(self.inner.set_group_members(id, ids, at).await?)
  }

  async fn delete_group(&self, id: &str) -> Result<(), FaultError> {
    self.check("delete_group")?;
    Ok(self.inner.delete_group(id).await?)
  }

  async fn resolve_group(
    &self,
    id: &str,
    by: &str,
    at: DateTime<Utc>,
  ) -> Result<Option<DuplicateGroup>, FaultError> {
    self.check("resolve_group")?;
    Ok(self.inner.resolve_group(id, by, at).await?)
  }
}

impl MemberStore for FaultyStore {
  async fn put_member(&self, member: Member) -> Result<(), FaultError> {
    self.check("put_member")?;
    Ok(self.inner.put_member(member).await?)
  }

  async fn get_member(&self, matricule: &str) -> Result<Option<Member>, FaultError> {
    self.check("get_member")?;
    Ok(self.inner.get_member(matricule).await?)
  }

  async fn delete_member(&self, matricule: &str) -> Result<(), FaultError> {
    self.check("delete_member")?;
    Ok(self.inner.delete_member(matricule).await?)
  }

  async fn add_member_subscription(&self, matricule: &str, sub: &str) -> Result<(), FaultError> {
    self.check("add_member_subscription")?;
    Ok(self.inner.add_member_subscription(matricule, sub).await?)
  }

  async fn create_subscription(&self, subscription: Subscription) -> Result<(), FaultError> {
    self.check("create_subscription")?;
    Ok(self.inner.create_subscription(subscription).await?)
  }

  async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, FaultError> {
    self.check("get_subscription")?;
    Ok(self.inner.get_subscription(id).await?)
  }

  async fn delete_subscription(&self, id: &str) -> Result<(), FaultError> {
    self.check("delete_subscription")?;
    Ok(self.inner.delete_subscription(id).await?)
  }

  async fn list_member_subscriptions(&self, matricule: &str) -> Result<Vec<Subscription>, FaultError> {
    self.check("list_member_subscriptions")?;
    Ok(self.inner.list_member_subscriptions(matricule).await?)
  }

  async fn create_document(&self, document: ArchivedDocument) -> Result<(), FaultError> {
    self.check("create_document")?;
    Ok(self.inner.create_document(document).await?)
  }

  async fn delete_document(&self, id: &str) -> Result<(), FaultError> {
    self.check("delete_document")?;
    Ok(self.inner.delete_document(id).await?)
  }

  async fn list_member_documents(&self, matricule: &str) -> Result<Vec<ArchivedDocument>, FaultError> {
    self.check("list_member_documents")?;
    Ok(self.inner.list_member_documents(matricule).await?)
  }

  async fn create_notification(&self, notification: Notification) -> Result<(), FaultError> {
    self.check("create_notification")?;
    Ok(self.inner.create_notification(notification).await?)
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>, FaultError> {
    self.check("list_notifications")?;
    Ok(self.inner.list_notifications().await?)
  }
}
