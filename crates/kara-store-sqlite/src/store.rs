//! [`SqliteStore`] — the SQLite implementation of [`RequestStore`] and
//! [`MemberStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use kara_core::{
  group::{DuplicateGroup, DuplicateMatchType},
  member::{ArchivedDocument, Member, Notification, Subscription},
  request::{DetectionFields, MembershipRequest, RequestIdentity, RequestReview},
  store::{MemberStore, RequestStore},
};

use crate::{
  Error, Result,
  encode::{
    DOCUMENT_COLUMNS, GROUP_COLUMNS, NOTIFICATION_COLUMNS, REQUEST_COLUMNS,
    RawDocument, RawGroup, RawNotification, RawRequest, RawSubscription,
    SUBSCRIPTION_COLUMNS, decode_json, encode_bool, encode_dt, encode_json,
  },
  identity::SqliteIdentity,
  schema::SCHEMA,
};

/// Wrap a non-SQLite error raised inside a connection closure.
fn call_error(e: impl std::error::Error + Send + Sync + 'static) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The KARA document collections backed by a single SQLite file.
///
/// Clones share the inner connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// The identity provider sharing this store's connection.
  pub fn identity(&self) -> SqliteIdentity { SqliteIdentity::new(self.conn.clone()) }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT request_id ... WHERE <cond>` query with two text params.
  async fn request_ids_where(
    &self,
    sql: &'static str,
    key: &str,
    exclude: &str,
  ) -> Result<Vec<String>> {
    let key = key.to_owned();
    let exclude = exclude.to_owned();

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![key, exclude], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = Error;

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn put_request(&self, request: MembershipRequest) -> Result<()> {
    let raw = RawRequest::encode(&request)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO membership_requests ({REQUEST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            raw.request_id,
            raw.matricule,
            raw.identity,
            raw.address,
            raw.company,
            raw.documents,
            raw.status,
            raw.is_paid,
            raw.normalized_email,
            raw.normalized_doc_number,
            raw.is_duplicate,
            raw.duplicate_group_ids,
            raw.approved_by,
            raw.approved_at,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_request(&self, id: &str) -> Result<Option<MembershipRequest>> {
    let id = id.to_owned();

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REQUEST_COLUMNS} FROM membership_requests WHERE request_id = ?1"),
              rusqlite::params![id],
              RawRequest::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_request).transpose()
  }

  async fn list_requests(&self) -> Result<Vec<MembershipRequest>> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLUMNS} FROM membership_requests ORDER BY created_at, request_id"
        ))?;
        let rows = stmt
          .query_map([], RawRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_request).collect()
  }

  async fn delete_request(&self, id: &str) -> Result<bool> {
    let id = id.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM membership_requests WHERE request_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn write_detection_fields(&self, id: &str, fields: DetectionFields) -> Result<()> {
    let id_owned = id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let identity_json: Option<String> = tx
          .query_row(
            "SELECT identity FROM membership_requests WHERE request_id = ?1",
            rusqlite::params![id_owned],
            |row| row.get(0),
          )
          .optional()?;
        let Some(identity_json) = identity_json else {
          return Ok(false);
        };

        let mut identity: RequestIdentity =
          serde_json::from_str(&identity_json).map_err(call_error)?;
        identity.contacts = fields.contacts;
        let identity_json = serde_json::to_string(&identity).map_err(call_error)?;

        tx.execute(
          "UPDATE membership_requests
           SET identity = ?2, normalized_email = ?3, normalized_doc_number = ?4,
               is_duplicate = 0, duplicate_group_ids = '[]'
           WHERE request_id = ?1",
          rusqlite::params![
            id_owned,
            identity_json,
            fields.normalized_email,
            fields.normalized_identity_doc_number,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::RequestNotFound(id.to_owned()));
    }
    Ok(())
  }

  async fn write_contacts(&self, id: &str, contacts: Vec<String>) -> Result<()> {
    let id_owned = id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let identity_json: Option<String> = tx
          .query_row(
            "SELECT identity FROM membership_requests WHERE request_id = ?1",
            rusqlite::params![id_owned],
            |row| row.get(0),
          )
          .optional()?;
        let Some(identity_json) = identity_json else {
          return Ok(false);
        };

        let mut identity: RequestIdentity =
          serde_json::from_str(&identity_json).map_err(call_error)?;
        identity.contacts = contacts;
        let identity_json = serde_json::to_string(&identity).map_err(call_error)?;

        tx.execute(
          "UPDATE membership_requests SET identity = ?2 WHERE request_id = ?1",
          rusqlite::params![id_owned, identity_json],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::RequestNotFound(id.to_owned()));
    }
    Ok(())
  }

  async fn find_by_phone(&self, phone: &str, exclude: &str) -> Result<Vec<String>> {
    self
      .request_ids_where(
        "SELECT DISTINCT r.request_id
         FROM membership_requests r, json_each(r.identity, '$.contacts') c
         WHERE c.value = ?1 AND r.request_id != ?2
         ORDER BY r.request_id",
        phone,
        exclude,
      )
      .await
  }

  async fn find_by_email(&self, email: &str, exclude: &str) -> Result<Vec<String>> {
    self
      .request_ids_where(
        "SELECT request_id FROM membership_requests
         WHERE normalized_email = ?1 AND request_id != ?2
         ORDER BY request_id",
        email,
        exclude,
      )
      .await
  }

  async fn find_by_doc_number(&self, doc_number: &str, exclude: &str) -> Result<Vec<String>> {
    self
      .request_ids_where(
        "SELECT request_id FROM membership_requests
         WHERE normalized_doc_number = ?1 AND request_id != ?2
         ORDER BY request_id",
        doc_number,
        exclude,
      )
      .await
  }

  async fn mark_duplicates(&self, request_ids: &[String], group_id: &str) -> Result<()> {
    if request_ids.is_empty() {
      return Ok(());
    }
    let request_ids = request_ids.to_vec();
    let group_id = group_id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for request_id in &request_ids {
          let current: Option<String> = tx
            .query_row(
              "SELECT duplicate_group_ids FROM membership_requests WHERE request_id = ?1",
              rusqlite::params![request_id],
              |row| row.get(0),
            )
            .optional()?;
          let Some(current) = current else { continue };

          let mut ids: BTreeSet<String> = serde_json::from_str(&current).map_err(call_error)?;
          ids.insert(group_id.clone());
          let ids_json = serde_json::to_string(&ids).map_err(call_error)?;

          tx.execute(
            "UPDATE membership_requests SET is_duplicate = 1, duplicate_group_ids = ?2
             WHERE request_id = ?1",
            rusqlite::params![request_id, ids_json],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn release_from_group(&self, request_id: &str, group_id: &str) -> Result<()> {
    let request_id = request_id.to_owned();
    let group_id = group_id.to_owned();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let current: Option<String> = tx
          .query_row(
            "SELECT duplicate_group_ids FROM membership_requests WHERE request_id = ?1",
            rusqlite::params![request_id],
            |row| row.get(0),
          )
          .optional()?;
        let Some(current) = current else { return Ok(()) };

        let mut ids: BTreeSet<String> = serde_json::from_str(&current).map_err(call_error)?;
        ids.remove(&group_id);
        let ids_json = serde_json::to_string(&ids).map_err(call_error)?;

        tx.execute(
          "UPDATE membership_requests SET is_duplicate = ?2, duplicate_group_ids = ?3
           WHERE request_id = ?1",
          rusqlite::params![request_id, encode_bool(!ids.is_empty()), ids_json],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_review(
    &self,
    id: &str,
    review: RequestReview,
  ) -> Result<Option<MembershipRequest>> {
    let id_owned = id.to_owned();
    let status = review.status.map(|s| <&'static str>::from(s).to_owned());
    let is_paid = review.is_paid.map(encode_bool);
    let now = encode_dt(Utc::now());

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE membership_requests
           SET status = COALESCE(?2, status), is_paid = COALESCE(?3, is_paid), updated_at = ?4
           WHERE request_id = ?1",
          rusqlite::params![id_owned, status, is_paid, now],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_request(id).await
  }

  async fn set_approved(
    &self,
    id: &str,
    approved_by: &str,
    approved_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_owned = id.to_owned();
    let approved_by = approved_by.to_owned();
    let at = encode_dt(approved_at);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE membership_requests
           SET status = 'approved', approved_by = ?2, approved_at = ?3, updated_at = ?3
           WHERE request_id = ?1",
          rusqlite::params![id_owned, approved_by, at],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::RequestNotFound(id.to_owned()));
    }
    Ok(())
  }

  // ── Duplicate groups ──────────────────────────────────────────────────────

  async fn find_group(
    &self,
    kind: DuplicateMatchType,
    value: &str,
  ) -> Result<Option<DuplicateGroup>> {
    let kind_str = <&'static str>::from(kind).to_owned();
    let value = value.to_owned();

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {GROUP_COLUMNS} FROM duplicate_groups
                 WHERE match_type = ?1 AND match_value = ?2
                 ORDER BY detected_at, group_id
                 LIMIT 1"
              ),
              rusqlite::params![kind_str, value],
              RawGroup::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn get_group(&self, id: &str) -> Result<Option<DuplicateGroup>> {
    let id = id.to_owned();

    let raw: Option<RawGroup> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GROUP_COLUMNS} FROM duplicate_groups WHERE group_id = ?1"),
              rusqlite::params![id],
              RawGroup::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGroup::into_group).transpose()
  }

  async fn list_groups(&self, unresolved_only: bool) -> Result<Vec<DuplicateGroup>> {
    let raws: Vec<RawGroup> = self
      .conn
      .call(move |conn| {
        let filter = if unresolved_only { "WHERE resolved_at IS NULL" } else { "" };
        let mut stmt = conn.prepare(&format!(
          "SELECT {GROUP_COLUMNS} FROM duplicate_groups {filter}
           ORDER BY detected_at DESC, group_id"
        ))?;
        let rows = stmt
          .query_map([], RawGroup::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn insert_group(&self, group: DuplicateGroup) -> Result<()> {
    let kind_str    = <&'static str>::from(group.kind).to_owned();
    let ids_json    = encode_json(&group.request_ids)?;
    let count       = group.request_ids.len() as i64;
    let detected_at = encode_dt(group.detected_at);
    let updated_at  = encode_dt(group.updated_at);
    let resolved_at = group.resolved_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO duplicate_groups (
             group_id, match_type, match_value, request_ids, request_count,
             detected_at, updated_at, resolved_at, resolved_by
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            group.id,
            kind_str,
            group.value,
            ids_json,
            count,
            detected_at,
            updated_at,
            resolved_at,
            group.resolved_by,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_group_members(
    &self,
    id: &str,
    request_ids: &BTreeSet<String>,
    updated_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_owned   = id.to_owned();
    let ids_json   = encode_json(request_ids)?;
    let count      = request_ids.len() as i64;
    let updated_at = encode_dt(updated_at);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE duplicate_groups SET request_ids = ?2, request_count = ?3, updated_at = ?4
           WHERE group_id = ?1",
          rusqlite::params![id_owned, ids_json, count, updated_at],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(Error::GroupNotFound(id.to_owned()));
    }
    Ok(())
  }

  async fn delete_group(&self, id: &str) -> Result<()> {
    let id = id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM duplicate_groups WHERE group_id = ?1",
          rusqlite::params![id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn resolve_group(
    &self,
    id: &str,
    resolved_by: &str,
    resolved_at: DateTime<Utc>,
  ) -> Result<Option<DuplicateGroup>> {
    let id_owned    = id.to_owned();
    let resolved_by = resolved_by.to_owned();
    let at          = encode_dt(resolved_at);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE duplicate_groups SET resolved_at = ?2, resolved_by = ?3 WHERE group_id = ?1",
          rusqlite::params![id_owned, at, resolved_by],
        )?)
      })
      .await?;

    if updated == 0 {
      return Ok(None);
    }
    self.get_group(id).await
  }
}

// ─── MemberStore impl ────────────────────────────────────────────────────────

impl MemberStore for SqliteStore {
  async fn put_member(&self, member: Member) -> Result<()> {
    let matricule  = member.matricule.clone();
    let request_id = member.request_id.clone();
    let created_at = encode_dt(member.created_at);
    let body       = encode_json(&member)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO users (matricule, request_id, body, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![matricule, request_id, body, created_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_member(&self, matricule: &str) -> Result<Option<Member>> {
    let matricule = matricule.to_owned();

    let body: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT body FROM users WHERE matricule = ?1",
              rusqlite::params![matricule],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    body.as_deref().map(decode_json).transpose()
  }

  async fn delete_member(&self, matricule: &str) -> Result<()> {
    let matricule = matricule.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM users WHERE matricule = ?1", rusqlite::params![matricule])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_member_subscription(&self, matricule: &str, subscription_id: &str) -> Result<()> {
    let matricule_owned = matricule.to_owned();
    let subscription_id = subscription_id.to_owned();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let body: Option<String> = tx
          .query_row(
            "SELECT body FROM users WHERE matricule = ?1",
            rusqlite::params![matricule_owned],
            |row| row.get(0),
          )
          .optional()?;
        let Some(body) = body else { return Ok(false) };

        let mut member: Member = serde_json::from_str(&body).map_err(call_error)?;
        member.subscriptions.insert(subscription_id);
        member.updated_at = Utc::now();
        let body = serde_json::to_string(&member).map_err(call_error)?;

        tx.execute(
          "UPDATE users SET body = ?2 WHERE matricule = ?1",
          rusqlite::params![matricule_owned, body],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(Error::MemberNotFound(matricule.to_owned()));
    }
    Ok(())
  }

  async fn create_subscription(&self, subscription: Subscription) -> Result<()> {
    let membership_type = <&'static str>::from(subscription.membership_type).to_owned();
    let status          = <&'static str>::from(subscription.status).to_owned();
    let start_date      = encode_dt(subscription.start_date);
    let end_date        = encode_dt(subscription.end_date);
    let created_at      = encode_dt(subscription.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO subscriptions ({SUBSCRIPTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
          ),
          rusqlite::params![
            subscription.id,
            subscription.member_id,
            membership_type,
            start_date,
            end_date,
            status,
            subscription.adhesion_pdf_url,
            subscription.created_by,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>> {
    let id = id.to_owned();

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1"
              ),
              rusqlite::params![id],
              RawSubscription::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn delete_subscription(&self, id: &str) -> Result<()> {
    let id = id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM subscriptions WHERE subscription_id = ?1",
          rusqlite::params![id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_member_subscriptions(&self, matricule: &str) -> Result<Vec<Subscription>> {
    let matricule = matricule.to_owned();

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
           WHERE member_id = ?1 ORDER BY start_date"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![matricule], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn create_document(&self, document: ArchivedDocument) -> Result<()> {
    let document_type = <&'static str>::from(document.document_type).to_owned();
    let created_at    = encode_dt(document.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            document.id,
            document.member_id,
            document.request_id,
            document_type,
            document.format,
            document.url,
            document.created_by,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_document(&self, id: &str) -> Result<()> {
    let id = id.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM documents WHERE document_id = ?1", rusqlite::params![id])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_member_documents(&self, matricule: &str) -> Result<Vec<ArchivedDocument>> {
    let matricule = matricule.to_owned();

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE member_id = ?1 ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![matricule], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  async fn create_notification(&self, notification: Notification) -> Result<()> {
    let kind       = <&'static str>::from(notification.kind).to_owned();
    let is_read    = encode_bool(notification.is_read);
    let created_at = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
          ),
          rusqlite::params![
            notification.id,
            kind,
            notification.title,
            notification.message,
            notification.member_id,
            notification.request_id,
            is_read,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>> {
    let raws: Vec<RawNotification> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}
