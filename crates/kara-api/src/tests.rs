//! Router tests against an in-memory SQLite store.

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use kara_core::{
  identity::{IdentityProvider, NewAccount},
  member::UserRole,
};
use kara_store_sqlite::{SqliteIdentity, SqliteStore};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiConfig, AppState, api_router};

const ADMIN: (&str, &str) = ("admin@kara.ga", "secret");

async fn make_app() -> Router {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let identity = store.identity();
  identity
    .create_account(NewAccount {
      uid:      "admin-1".to_string(),
      email:    ADMIN.0.to_string(),
      password: ADMIN.1.to_string(),
      role:     Some(UserRole::Admin),
    })
    .await
    .unwrap();
  api_router(AppState::<SqliteStore, SqliteIdentity>::new(store, identity, ApiConfig::default()))
}

fn basic((user, pass): (&str, &str)) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn call(
  app: &Router,
  method: &str,
  uri: &str,
  auth: Option<(&str, &str)>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(creds) = auth {
    builder = builder.header(header::AUTHORIZATION, basic(creds));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };

  let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn application(first: &str, phone: &str) -> Value {
  json!({
    "matricule": "0042-MK",
    "identity": {
      "firstName": first,
      "lastName": "Nzé",
      "contacts": [phone]
    },
    "documents": { "identityDocument": "CNI" }
  })
}

async fn submit(app: &Router, first: &str, phone: &str) -> Value {
  let (status, body) =
    call(app, "POST", "/membership-requests", None, Some(application(first, phone))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ─── Requests and duplicates ─────────────────────────────────────────────────

#[tokio::test]
async fn submissions_sharing_a_phone_are_flagged() {
  let app = make_app().await;

  let first = submit(&app, "Ada", "+241 66 00 00 01").await;
  assert_eq!(first["status"], "pending");
  assert_eq!(first["isDuplicate"], false);
  assert_eq!(first["identity"]["contacts"], json!(["+24166000001"]));

  let second = submit(&app, "Awa", "+241-66-00-00-01").await;
  assert_eq!(second["isDuplicate"], true);
  assert_eq!(second["duplicateGroupIds"].as_array().unwrap().len(), 1);

  let (status, groups) = call(&app, "GET", "/duplicate-groups", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(groups.as_array().unwrap().len(), 1);
  assert_eq!(groups[0]["type"], "phone");
  assert_eq!(groups[0]["requestCount"], 2);

  let id = first["id"].as_str().unwrap();
  let (_, first) = call(&app, "GET", &format!("/membership-requests/{id}"), Some(ADMIN), None).await;
  assert_eq!(first["isDuplicate"], true);
}

#[tokio::test]
async fn delete_releases_the_survivor() {
  let app = make_app().await;
  let first = submit(&app, "Ada", "+24166000001").await;
  let second = submit(&app, "Awa", "+24166000001").await;

  let id = second["id"].as_str().unwrap();
  let (status, _) =
    call(&app, "DELETE", &format!("/membership-requests/{id}"), None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  let (status, _) =
    call(&app, "DELETE", &format!("/membership-requests/{id}"), Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let id = first["id"].as_str().unwrap();
  let (_, first) = call(&app, "GET", &format!("/membership-requests/{id}"), Some(ADMIN), None).await;
  assert_eq!(first["isDuplicate"], false);
  assert_eq!(first["duplicateGroupIds"], json!([]));

  let (_, groups) = call(&app, "GET", "/duplicate-groups", Some(ADMIN), None).await;
  assert_eq!(groups, json!([]));
}

#[tokio::test]
async fn update_changes_keys() {
  let app = make_app().await;
  submit(&app, "Ada", "+24166000001").await;
  let second = submit(&app, "Awa", "+24166000001").await;
  let id = second["id"].as_str().unwrap();

  let (status, updated) = call(
    &app,
    "PUT",
    &format!("/membership-requests/{id}"),
    None,
    Some(application("Awa", "+24177000002")),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["isDuplicate"], false);
  assert_eq!(updated["identity"]["contacts"], json!(["+24177000002"]));
}

#[tokio::test]
async fn reformatted_phone_still_matches_later_applicants() {
  let app = make_app().await;
  let first = submit(&app, "Ada", "+241 66 00 00 01").await;
  let id = first["id"].as_str().unwrap();

  let (status, updated) = call(
    &app,
    "PUT",
    &format!("/membership-requests/{id}"),
    None,
    Some(application("Ada", "+241-66-00-00-01")),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["identity"]["contacts"], json!(["+24166000001"]));

  let second = submit(&app, "Awa", "+24166000001").await;
  assert_eq!(second["isDuplicate"], true);
}

#[tokio::test]
async fn only_admins_change_the_matricule() {
  let app = make_app().await;
  let request = submit(&app, "Ada", "+24166000001").await;
  let uri = format!("/membership-requests/{}", request["id"].as_str().unwrap());
  let mut edit = application("Ada", "+24166000001");
  edit["matricule"] = json!("0001-MK");

  let (status, _) = call(&app, "PUT", &uri, None, Some(edit.clone())).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, updated) = call(&app, "PUT", &uri, Some(ADMIN), Some(edit)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["matricule"], "0001-MK");
}

#[tokio::test]
async fn review_requires_admin_and_rejects_approved() {
  let app = make_app().await;
  let request = submit(&app, "Ada", "+24166000001").await;
  let uri = format!("/membership-requests/{}/review", request["id"].as_str().unwrap());

  let (status, _) = call(&app, "PATCH", &uri, None, Some(json!({ "isPaid": true }))).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) =
    call(&app, "PATCH", &uri, Some(ADMIN), Some(json!({ "status": "approved" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].is_string());

  let (status, body) = call(
    &app,
    "PATCH",
    &uri,
    Some(ADMIN),
    Some(json!({ "status": "under_review", "isPaid": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "under_review");
  assert_eq!(body["isPaid"], true);
}

#[tokio::test]
async fn resolve_and_filter_groups() {
  let app = make_app().await;
  submit(&app, "Ada", "+24166000001").await;
  submit(&app, "Awa", "+24166000001").await;

  let (_, groups) = call(&app, "GET", "/duplicate-groups?unresolved=true", Some(ADMIN), None).await;
  let id = groups[0]["id"].as_str().unwrap().to_string();

  let (status, group) = call(
    &app,
    "POST",
    &format!("/duplicate-groups/{id}/resolve"),
    Some(ADMIN),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(group["resolvedBy"], "admin-1");

  let (_, unresolved) =
    call(&app, "GET", "/duplicate-groups?unresolved=true", Some(ADMIN), None).await;
  assert_eq!(unresolved, json!([]));

  let (status, _) = call(&app, "GET", "/duplicate-groups/nope", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn migrate_reports_counts() {
  let app = make_app().await;
  submit(&app, "Ada", "+24166000001").await;
  submit(&app, "Awa", "+24166000001").await;
  submit(&app, "Ali", "+24199000000").await;

  let (status, report) = call(&app, "POST", "/admin/duplicates/migrate", Some(ADMIN), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report, json!({ "processed": 3, "duplicatesFound": 2 }));
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bad_credentials_are_rejected() {
  let app = make_app().await;
  let (status, body) =
    call(&app, "GET", "/notifications", Some((ADMIN.0, "wrong")), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());

  let (status, _) = call(
    &app,
    "POST",
    "/membership-requests",
    Some(("ghost@kara.ga", "x")),
    Some(application("Ada", "1")),
  )
  .await;
  // Submission takes no caller, so credentials are not checked.
  assert_eq!(status, StatusCode::CREATED);
}

// ─── Approval ────────────────────────────────────────────────────────────────

fn approval_body(request_id: &str) -> Value {
  json!({
    "requestId": request_id,
    "adminId": "admin-1",
    "membershipType": "adherant",
    "adhesionPdfURL": "https://files.kara.ga/adhesion.pdf"
  })
}

#[tokio::test]
async fn anonymous_approval_is_unauthenticated() {
  let app = make_app().await;
  let request = submit(&app, "Ada", "+24166000001").await;
  let (status, body) = call(
    &app,
    "POST",
    "/approvals",
    None,
    Some(approval_body(request["id"].as_str().unwrap())),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "caller is not authenticated");
}

#[tokio::test]
async fn unpaid_approval_is_a_failed_precondition() {
  let app = make_app().await;
  let request = submit(&app, "Ada", "+24166000001").await;
  let (status, _) = call(
    &app,
    "POST",
    "/approvals",
    Some(ADMIN),
    Some(approval_body(request["id"].as_str().unwrap())),
  )
  .await;
  assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn approval_over_http() {
  let app = make_app().await;
  let request = submit(&app, "Ada", "+24166000001").await;
  let id = request["id"].as_str().unwrap();

  call(
    &app,
    "PATCH",
    &format!("/membership-requests/{id}/review"),
    Some(ADMIN),
    Some(json!({ "isPaid": true })),
  )
  .await;

  let (status, approved) = call(&app, "POST", "/approvals", Some(ADMIN), Some(approval_body(id))).await;
  assert_eq!(status, StatusCode::OK, "{approved}");
  assert_eq!(approved["success"], true);
  assert_eq!(approved["matricule"], "0042-MK");
  assert_eq!(approved["email"], "adanze0042@kara.ga");
  let password = approved["password"].as_str().unwrap().to_string();

  // The new member can log in and read their own record.
  let member_creds = ("adanze0042@kara.ga", password.as_str());
  let (status, member) = call(&app, "GET", "/members/0042-MK", Some(member_creds), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(member["roles"], json!(["Adherant"]));

  let (status, subs) =
    call(&app, "GET", "/members/0042-MK/subscriptions", Some(member_creds), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(subs[0]["id"], approved["subscriptionId"]);

  let (status, _) = call(&app, "GET", "/notifications", Some(member_creds), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (_, notifications) = call(&app, "GET", "/notifications", Some(ADMIN), None).await;
  assert_eq!(notifications.as_array().unwrap().len(), 1);

  let (status, _) = call(&app, "POST", "/approvals", Some(ADMIN), Some(approval_body(id))).await;
  assert_eq!(status, StatusCode::CONFLICT);

  // A second request under the same matricule cannot replace the member.
  let other = submit(&app, "Awa", "+24177000002").await;
  let other_id = other["id"].as_str().unwrap();
  call(
    &app,
    "PATCH",
    &format!("/membership-requests/{other_id}/review"),
    Some(ADMIN),
    Some(json!({ "isPaid": true })),
  )
  .await;
  let (status, body) =
    call(&app, "POST", "/approvals", Some(ADMIN), Some(approval_body(other_id))).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["error"], "a member with matricule 0042-MK already exists");
  let (_, member) = call(&app, "GET", "/members/0042-MK", Some(ADMIN), None).await;
  assert_eq!(member["requestId"], id);
}
