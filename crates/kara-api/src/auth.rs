//! HTTP Basic caller extraction against the identity provider.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use kara_core::{identity::IdentityProvider, store::MemberStore};
use kara_workflows::approval::CallerContext;

use crate::{AppState, error::ApiError};

/// The caller of a request. `None` when no `Authorization` header was sent.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerContext>);

impl Caller {
  /// The caller, if it holds an admin-like role.
  pub fn require_admin(&self) -> Result<&CallerContext, ApiError> {
    let caller = self.0.as_ref().ok_or(ApiError::Unauthorized)?;
    if !caller.role.is_some_and(|r| r.is_admin_like()) {
      return Err(ApiError::Forbidden("admin role required".to_string()));
    }
    Ok(caller)
  }

  /// The caller, if it is an admin or the member `matricule` itself.
  pub fn require_admin_or(&self, matricule: &str) -> Result<&CallerContext, ApiError> {
    let caller = self.0.as_ref().ok_or(ApiError::Unauthorized)?;
    if caller.uid == matricule {
      return Ok(caller);
    }
    self.require_admin()
  }
}

/// Decode `Authorization: Basic <email:password>`.
///
/// Returns `Ok(None)` when the header is absent and `Err` when it is present
/// but malformed.
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| ApiError::Unauthorized)?;
  let encoded = value.strip_prefix("Basic ").ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;
  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  Ok(Some((email.to_owned(), password.to_owned())))
}

impl<S, I> FromRequestParts<AppState<S, I>> for Caller
where
  S: MemberStore + 'static,
  I: IdentityProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, I>,
  ) -> Result<Self, Self::Rejection> {
    let Some((email, password)) = basic_credentials(&parts.headers)? else {
      return Ok(Caller(None));
    };

    let account = state
      .identity
      .authenticate(&email, &password)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(Caller(Some(CallerContext {
      uid:  account.uid,
      role: account.role,
    })))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  #[test]
  fn missing_header_is_anonymous() {
    assert!(basic_credentials(&HeaderMap::new()).unwrap().is_none());
  }

  #[test]
  fn decodes_email_and_password() {
    let value = format!("Basic {}", B64.encode("admin@kara.ga:pa:ss"));
    let (email, password) = basic_credentials(&headers(&value)).unwrap().unwrap();
    assert_eq!(email, "admin@kara.ga");
    assert_eq!(password, "pa:ss");
  }

  #[test]
  fn malformed_headers_are_rejected() {
    let no_colon = format!("Basic {}", B64.encode("nocolon"));
    for value in ["Bearer abc", "Basic !!!not-base64!!!", no_colon.as_str()] {
      assert!(matches!(basic_credentials(&headers(value)), Err(ApiError::Unauthorized)));
    }
  }

  #[test]
  fn admin_checks() {
    use kara_core::member::UserRole;

    let anonymous = Caller(None);
    assert!(matches!(anonymous.require_admin(), Err(ApiError::Unauthorized)));

    let member = Caller(Some(CallerContext {
      uid:  "0001".to_string(),
      role: Some(UserRole::Adherant),
    }));
    assert!(matches!(member.require_admin(), Err(ApiError::Forbidden(_))));
    assert!(member.require_admin_or("0001").is_ok());
    assert!(matches!(member.require_admin_or("0002"), Err(ApiError::Forbidden(_))));

    let admin = Caller(Some(CallerContext {
      uid:  "a".to_string(),
      role: Some(UserRole::SuperAdmin),
    }));
    assert!(admin.require_admin().is_ok());
  }
}
