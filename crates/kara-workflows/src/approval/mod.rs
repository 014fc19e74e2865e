//! Membership approval: promote a paid request into a live member.
//!
//! The workflow runs as a saga. Every step that creates something pushes its
//! undo onto a [`RollbackStack`]; if any later step fails, the stack is
//! unwound newest-first and a single [`ApprovalError::Failed`] is returned.
//!
//! The request's move to `approved` has no compensation; a failure after it
//! leaves the request approved. Linking the subscription to the member and
//! the approval notification are best effort: their failures are logged and
//! the approval still succeeds.

mod credentials;
mod saga;

use chrono::Utc;
use kara_core::{
  identity::{IdentityProvider, NewAccount},
  member::{
    ArchivedDocument, DocumentType, Enrollment, Member, MembershipType, Notification,
    NotificationKind, Subscription, UserRole,
  },
  request::MembershipRequest,
  store::MemberStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use credentials::{generate_password, member_email};
pub use saga::{Compensation, RollbackStack};

use crate::{ApprovalError, ApprovalStep};

/// Input of the approval callable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
  pub request_id:       String,
  pub admin_id:         String,
  pub membership_type:  String,
  #[serde(default)]
  pub company_id:       Option<String>,
  #[serde(default)]
  pub profession_id:    Option<String>,
  #[serde(default, rename = "adhesionPdfURL")]
  pub adhesion_pdf_url: Option<String>,
}

/// The authenticated caller and its role claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
  pub uid:  String,
  pub role: Option<UserRole>,
}

/// Returned once, to the approving admin. The password is not stored
/// anywhere in plain text.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
  pub success:         bool,
  pub matricule:       String,
  pub email:           String,
  pub password:        String,
  pub subscription_id: String,
  pub company_id:      Option<String>,
  pub profession_id:   Option<String>,
}

impl std::fmt::Debug for ApprovalResponse {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApprovalResponse")
      .field("success", &self.success)
      .field("matricule", &self.matricule)
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .field("subscription_id", &self.subscription_id)
      .field("company_id", &self.company_id)
      .field("profession_id", &self.profession_id)
      .finish()
  }
}

#[derive(Debug, Clone)]
pub struct ApprovalConfig {
  /// Domain of generated member login emails.
  pub email_domain: String,
}

impl Default for ApprovalConfig {
  fn default() -> Self {
    Self {
      email_domain: "kara.ga".to_string(),
    }
  }
}

/// Everything the saga steps need, resolved up front.
struct Plan<'a> {
  request:          &'a MembershipRequest,
  admin_id:         String,
  matricule:        String,
  email:            String,
  password:         String,
  membership_type:  MembershipType,
  adhesion_pdf_url: String,
  company_id:       Option<String>,
  profession_id:    Option<String>,
}

fn at<E>(step: ApprovalStep) -> impl FnOnce(E) -> ApprovalError
where
  E: std::error::Error + Send + Sync + 'static,
{
  move |e| ApprovalError::failed(step, e)
}

/// Approve `input.request_id` on behalf of `caller`.
///
/// All preconditions are checked before any write. `caller` is `None` for an
/// anonymous call.
#[tracing::instrument(
  skip_all,
  fields(request_id = %input.request_id, matricule = tracing::field::Empty),
)]
pub async fn approve_membership<S, I>(
  store: &S,
  identity: &I,
  caller: Option<&CallerContext>,
  input: ApprovalRequest,
  config: &ApprovalConfig,
) -> Result<ApprovalResponse, ApprovalError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let caller = caller.ok_or(ApprovalError::Unauthenticated)?;
  if !caller.role.is_some_and(UserRole::is_admin_like) {
    return Err(ApprovalError::PermissionDenied);
  }
  if caller.uid != input.admin_id {
    return Err(ApprovalError::AdminMismatch);
  }

  let request = store
    .get_request(&input.request_id)
    .await
    .map_err(at(ApprovalStep::LoadRequest))?
    .ok_or_else(|| ApprovalError::RequestNotFound(input.request_id.clone()))?;
  if !request.is_paid {
    return Err(ApprovalError::NotPaid);
  }
  if !request.status.is_approvable() {
    return Err(ApprovalError::NotApprovable(request.status));
  }

  let adhesion_pdf_url = input
    .adhesion_pdf_url
    .as_deref()
    .map(str::trim)
    .filter(|url| !url.is_empty())
    .ok_or(ApprovalError::MissingPdfUrl)?
    .to_owned();
  let membership_type = MembershipType::parse(input.membership_type.trim())
    .map_err(|_| ApprovalError::InvalidMembershipType(input.membership_type.clone()))?;

  let matricule = request.effective_matricule().to_owned();
  tracing::Span::current().record("matricule", matricule.as_str());

  // Only a member document created by this saga may be rolled back.
  if store
    .get_member(&matricule)
    .await
    .map_err(at(ApprovalStep::LoadMember))?
    .is_some()
  {
    return Err(ApprovalError::MemberExists(matricule));
  }

  let company = request.company.as_ref();
  let plan = Plan {
    request: &request,
    email: member_email(
      &request.identity.first_name,
      &request.identity.last_name,
      &matricule,
      &config.email_domain,
    ),
    password: generate_password(),
    admin_id: input.admin_id,
    matricule,
    membership_type,
    adhesion_pdf_url,
    company_id: input
      .company_id
      .or_else(|| company.and_then(|c| c.company_id.clone())),
    profession_id: input
      .profession_id
      .or_else(|| company.and_then(|c| c.profession_id.clone())),
  };

  let mut rollback = RollbackStack::default();
  match run_steps(store, identity, &plan, &mut rollback).await {
    Ok(subscription_id) => {
      tracing::info!(%subscription_id, "membership approved");
      Ok(ApprovalResponse {
        success: true,
        matricule: plan.matricule,
        email: plan.email,
        password: plan.password,
        subscription_id,
        company_id: plan.company_id,
        profession_id: plan.profession_id,
      })
    }
    Err(e) => {
      tracing::error!(error = %e, compensations = rollback.len(), "approval failed; rolling back");
      let failures = rollback.unwind(store, identity).await;
      if failures > 0 {
        tracing::error!(failures, "rollback incomplete");
      }
      Err(e)
    }
  }
}

/// Steps 1 to 6. Returns the new subscription id.
async fn run_steps<S, I>(
  store: &S,
  identity: &I,
  plan: &Plan<'_>,
  rollback: &mut RollbackStack,
) -> Result<String, ApprovalError>
where
  S: MemberStore,
  I: IdentityProvider,
{
  let now = Utc::now();
  let request = plan.request;

  // An account already registered under this matricule is reused as-is.
  let existing = identity
    .get_account(&plan.matricule)
    .await
    .map_err(at(ApprovalStep::CreateAccount))?;
  if existing.is_some() {
    tracing::warn!(step = %ApprovalStep::CreateAccount, "identity account already exists; keeping it");
  } else {
    identity
      .create_account(NewAccount {
        uid:      plan.matricule.clone(),
        email:    plan.email.clone(),
        password: plan.password.clone(),
        role:     Some(plan.membership_type.role()),
      })
      .await
      .map_err(at(ApprovalStep::CreateAccount))?;
    rollback.push(Compensation::DeleteAccount(plan.matricule.clone()));
  }

  let member = Member::from_request(
    request,
    Enrollment {
      matricule:       plan.matricule.clone(),
      email:           plan.email.clone(),
      membership_type: plan.membership_type,
      company_id:      plan.company_id.clone(),
      profession_id:   plan.profession_id.clone(),
      admin_id:        plan.admin_id.clone(),
    },
    now,
  );
  store
    .put_member(member)
    .await
    .map_err(at(ApprovalStep::CreateMember))?;
  rollback.push(Compensation::DeleteMember(plan.matricule.clone()));

  let subscription = Subscription::yearly(
    Uuid::new_v4().to_string(),
    plan.matricule.clone(),
    plan.membership_type,
    plan.adhesion_pdf_url.clone(),
    plan.admin_id.clone(),
    now,
  );
  let subscription_id = subscription.id.clone();
  store
    .create_subscription(subscription)
    .await
    .map_err(at(ApprovalStep::CreateSubscription))?;
  rollback.push(Compensation::DeleteSubscription(subscription_id.clone()));

  // Linking and notifying are best effort: a failure leaves a data gap, not
  // a failed approval.
  if let Err(e) = store
    .add_member_subscription(&plan.matricule, &subscription_id)
    .await
  {
    tracing::warn!(step = %ApprovalStep::LinkSubscription, %subscription_id, error = %e, "subscription left unlinked");
  }

  store
    .set_approved(&request.id, &plan.admin_id, now)
    .await
    .map_err(at(ApprovalStep::MarkApproved))?;
  tracing::debug!(step = %ApprovalStep::MarkApproved, "request marked approved");

  let document = ArchivedDocument {
    id:            Uuid::new_v4().to_string(),
    member_id:     plan.matricule.clone(),
    request_id:    request.id.clone(),
    document_type: DocumentType::Adhesion,
    format:        "pdf".to_string(),
    url:           plan.adhesion_pdf_url.clone(),
    created_by:    plan.admin_id.clone(),
    created_at:    now,
  };
  let document_id = document.id.clone();
  store
    .create_document(document)
    .await
    .map_err(at(ApprovalStep::ArchiveDocument))?;
  rollback.push(Compensation::DeleteDocument(document_id));

  let name = format!("{} {}", request.identity.first_name, request.identity.last_name);
  if let Err(e) = store
    .create_notification(Notification {
      id:         Uuid::new_v4().to_string(),
      kind:       NotificationKind::MembershipApproved,
      title:      "Membership approved".to_string(),
      message:    format!("{} is now a member ({})", name.trim(), plan.matricule),
      member_id:  Some(plan.matricule.clone()),
      request_id: Some(request.id.clone()),
      is_read:    false,
      created_at: now,
    })
    .await
  {
    tracing::warn!(step = %ApprovalStep::Notify, error = %e, "approval notification not created");
  }

  Ok(subscription_id)
}

#[cfg(test)]
mod tests {
  use kara_core::{
    member::SubscriptionStatus,
    request::{RequestReview, RequestStatus},
    store::RequestStore,
  };
  use kara_store_sqlite::SqliteIdentity;

  use super::*;
  use crate::testing::{FaultyStore, request, store};

  const MATRICULE: &str = "0001-MK-2024";

  async fn setup() -> (FaultyStore, SqliteIdentity) {
    let s = FaultyStore::new(store().await);
    let identity = s.inner.identity();
    let mut r = request("r1", &["+24101"]);
    r.matricule = Some(MATRICULE.to_string());
    r.is_paid = true;
    s.inner.put_request(r).await.unwrap();
    (s, identity)
  }

  fn admin() -> CallerContext {
    CallerContext {
      uid:  "admin-1".to_string(),
      role: Some(UserRole::Admin),
    }
  }

  fn input() -> ApprovalRequest {
    ApprovalRequest {
      request_id:       "r1".to_string(),
      admin_id:         "admin-1".to_string(),
      membership_type:  "adherant".to_string(),
      company_id:       Some("c-1".to_string()),
      profession_id:    None,
      adhesion_pdf_url: Some("https://files.kara.ga/adhesion/r1.pdf".to_string()),
    }
  }

  async fn approve(
    s: &FaultyStore,
    identity: &SqliteIdentity,
    caller: Option<&CallerContext>,
    input: ApprovalRequest,
  ) -> Result<ApprovalResponse, ApprovalError> {
    approve_membership(s, identity, caller, input, &ApprovalConfig::default()).await
  }

  /// Nothing the saga creates exists.
  async fn assert_no_artifacts(s: &FaultyStore, identity: &SqliteIdentity) {
    assert!(identity.get_account(MATRICULE).await.unwrap().is_none());
    assert!(s.inner.get_member(MATRICULE).await.unwrap().is_none());
    assert!(s.inner.list_member_subscriptions(MATRICULE).await.unwrap().is_empty());
    assert!(s.inner.list_member_documents(MATRICULE).await.unwrap().is_empty());
    assert!(s.inner.list_notifications().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn happy_path_creates_every_artifact() {
    let (s, identity) = setup().await;
    let response = approve(&s, &identity, Some(&admin()), input()).await.unwrap();

    assert!(response.success);
    assert_eq!(response.matricule, MATRICULE);
    assert_eq!(response.email, "jeanmba0001@kara.ga");
    assert_eq!(response.password.len(), 12);
    assert_eq!(response.company_id.as_deref(), Some("c-1"));

    let account = identity
      .authenticate(&response.email, &response.password)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(account.uid, MATRICULE);

    let member = s.inner.get_member(MATRICULE).await.unwrap().unwrap();
    assert_eq!(member.roles, vec![UserRole::Adherant]);
    assert!(member.subscriptions.contains(&response.subscription_id));
    assert_eq!(member.contacts, vec!["+24101".to_string()]);

    let subs = s.inner.list_member_subscriptions(MATRICULE).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].status, SubscriptionStatus::Active);
    let days = (subs[0].end_date - subs[0].start_date).num_days();
    assert!((365..=366).contains(&days));

    let docs = s.inner.list_member_documents(MATRICULE).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].document_type, DocumentType::Adhesion);
    assert_eq!(s.inner.list_notifications().await.unwrap().len(), 1);

    let r = s.inner.get_request("r1").await.unwrap().unwrap();
    assert_eq!(r.status, RequestStatus::Approved);
    assert_eq!(r.approved_by.as_deref(), Some("admin-1"));
  }

  #[tokio::test]
  async fn validation_errors_have_no_side_effects() {
    let (s, identity) = setup().await;

    let err = approve(&s, &identity, None, input()).await.unwrap_err();
    assert!(matches!(err, ApprovalError::Unauthenticated));

    let member_caller = CallerContext {
      role: Some(UserRole::Adherant),
      ..admin()
    };
    let err = approve(&s, &identity, Some(&member_caller), input()).await.unwrap_err();
    assert!(matches!(err, ApprovalError::PermissionDenied));

    let no_role = CallerContext { role: None, ..admin() };
    let err = approve(&s, &identity, Some(&no_role), input()).await.unwrap_err();
    assert!(matches!(err, ApprovalError::PermissionDenied));

    let other = ApprovalRequest {
      admin_id: "admin-2".to_string(),
      ..input()
    };
    let err = approve(&s, &identity, Some(&admin()), other).await.unwrap_err();
    assert!(matches!(err, ApprovalError::AdminMismatch));

    let missing = ApprovalRequest {
      request_id: "nope".to_string(),
      ..input()
    };
    let err = approve(&s, &identity, Some(&admin()), missing).await.unwrap_err();
    assert!(matches!(err, ApprovalError::RequestNotFound(id) if id == "nope"));

    let no_pdf = ApprovalRequest {
      adhesion_pdf_url: Some("  ".to_string()),
      ..input()
    };
    let err = approve(&s, &identity, Some(&admin()), no_pdf).await.unwrap_err();
    assert!(matches!(err, ApprovalError::MissingPdfUrl));

    let bad_type = ApprovalRequest {
      membership_type: "gold".to_string(),
      ..input()
    };
    let err = approve(&s, &identity, Some(&admin()), bad_type).await.unwrap_err();
    assert!(matches!(err, ApprovalError::InvalidMembershipType(t) if t == "gold"));

    assert_no_artifacts(&s, &identity).await;
  }

  #[tokio::test]
  async fn unpaid_and_closed_requests_are_rejected() {
    let (s, identity) = setup().await;

    s.inner
      .set_review("r1", RequestReview { status: None, is_paid: Some(false) })
      .await
      .unwrap();
    let err = approve(&s, &identity, Some(&admin()), input()).await.unwrap_err();
    assert!(matches!(err, ApprovalError::NotPaid));

    for status in [RequestStatus::Approved, RequestStatus::Rejected] {
      s.inner
        .set_review("r1", RequestReview { status: Some(status), is_paid: Some(true) })
        .await
        .unwrap();
      let err = approve(&s, &identity, Some(&admin()), input()).await.unwrap_err();
      assert!(matches!(err, ApprovalError::NotApprovable(st) if st == status));
    }

    assert_no_artifacts(&s, &identity).await;
  }

  #[tokio::test]
  async fn existing_member_is_never_touched() {
    let (s, identity) = setup().await;
    let first = approve(&s, &identity, Some(&admin()), input()).await.unwrap();

    let mut second = request("r2", &["+24102"]);
    second.matricule = Some(MATRICULE.to_string());
    second.is_paid = true;
    s.inner.put_request(second).await.unwrap();
    s.fail("create_document");

    let err = approve(&s, &identity, Some(&admin()), ApprovalRequest {
      request_id: "r2".to_string(),
      ..input()
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ApprovalError::MemberExists(m) if m == MATRICULE));

    let member = s.inner.get_member(MATRICULE).await.unwrap().unwrap();
    assert_eq!(member.request_id, "r1");
    assert_eq!(member.subscriptions.len(), 1);
    assert!(member.subscriptions.contains(&first.subscription_id));
    assert_eq!(s.inner.list_member_subscriptions(MATRICULE).await.unwrap().len(), 1);

    let r2 = s.inner.get_request("r2").await.unwrap().unwrap();
    assert_eq!(r2.status, RequestStatus::Pending);
  }

  #[tokio::test]
  async fn secretary_may_approve_under_review() {
    let (s, identity) = setup().await;
    s.inner
      .set_review("r1", RequestReview { status: Some(RequestStatus::UnderReview), is_paid: None })
      .await
      .unwrap();
    let secretary = CallerContext {
      role: Some(UserRole::Secretary),
      ..admin()
    };
    let bienfaiteur = ApprovalRequest {
      membership_type: "bienfaiteur".to_string(),
      ..input()
    };
    approve(&s, &identity, Some(&secretary), bienfaiteur).await.unwrap();

    let member = s.inner.get_member(MATRICULE).await.unwrap().unwrap();
    assert_eq!(member.roles, vec![UserRole::Bienfaiteur]);
  }

  #[tokio::test]
  async fn subscription_failure_rolls_back_account_and_member() {
    let (s, identity) = setup().await;
    s.fail("create_subscription");

    let err = approve(&s, &identity, Some(&admin()), input()).await.unwrap_err();
    assert!(matches!(
      err,
      ApprovalError::Failed { step: ApprovalStep::CreateSubscription, .. }
    ));

    assert_no_artifacts(&s, &identity).await;
    let r = s.inner.get_request("r1").await.unwrap().unwrap();
    assert_eq!(r.status, RequestStatus::Pending);
  }

  #[tokio::test]
  async fn failed_compensation_does_not_mask_original_error() {
    let (s, identity) = setup().await;
    s.fail("create_document");
    s.fail("delete_member");

    let err = approve(&s, &identity, Some(&admin()), input()).await.unwrap_err();
    assert!(matches!(
      err,
      ApprovalError::Failed { step: ApprovalStep::ArchiveDocument, .. }
    ));

    // The other compensations still ran.
    assert!(identity.get_account(MATRICULE).await.unwrap().is_none());
    assert!(s.inner.list_member_subscriptions(MATRICULE).await.unwrap().is_empty());
    // The member delete was the injected failure.
    assert!(s.inner.get_member(MATRICULE).await.unwrap().is_some());
    // The status change has no compensation.
    let r = s.inner.get_request("r1").await.unwrap().unwrap();
    assert_eq!(r.status, RequestStatus::Approved);
  }

  #[tokio::test]
  async fn existing_account_is_reused_and_never_rolled_back() {
    let (s, identity) = setup().await;
    identity
      .create_account(NewAccount {
        uid:      MATRICULE.to_string(),
        email:    "jean@legacy.ga".to_string(),
        password: "legacy".to_string(),
        role:     Some(UserRole::Adherant),
      })
      .await
      .unwrap();

    s.fail("create_document");
    let err = approve(&s, &identity, Some(&admin()), input()).await.unwrap_err();
    assert!(matches!(err, ApprovalError::Failed { step: ApprovalStep::ArchiveDocument, .. }));
    assert!(identity.get_account(MATRICULE).await.unwrap().is_some());
    assert!(s.inner.get_member(MATRICULE).await.unwrap().is_none());
    assert!(s.inner.list_member_subscriptions(MATRICULE).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn notification_failure_does_not_fail_approval() {
    let (s, identity) = setup().await;
    s.fail("create_notification");

    let response = approve(&s, &identity, Some(&admin()), input()).await.unwrap();
    assert!(response.success);
    assert!(s.inner.get_member(MATRICULE).await.unwrap().is_some());
    assert_eq!(s.inner.list_member_documents(MATRICULE).await.unwrap().len(), 1);
    assert!(s.inner.list_notifications().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn link_failure_leaves_subscription_unlinked() {
    let (s, identity) = setup().await;
    s.fail("add_member_subscription");

    let response = approve(&s, &identity, Some(&admin()), input()).await.unwrap();
    let member = s.inner.get_member(MATRICULE).await.unwrap().unwrap();
    assert!(member.subscriptions.is_empty());
    let subscriptions = s.inner.list_member_subscriptions(MATRICULE).await.unwrap();
    assert_eq!(subscriptions[0].id, response.subscription_id);
  }

  #[tokio::test]
  async fn existing_account_approval_succeeds() {
    let (s, identity) = setup().await;
    identity
      .create_account(NewAccount {
        uid:      MATRICULE.to_string(),
        email:    "jean@legacy.ga".to_string(),
        password: "legacy".to_string(),
        role:     None,
      })
      .await
      .unwrap();

    let response = approve(&s, &identity, Some(&admin()), input()).await.unwrap();
    assert!(response.success);
    assert!(s.inner.get_member(MATRICULE).await.unwrap().is_some());
  }
}
