//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use kara_workflows::{ApprovalError, DuplicateError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("invalid credentials")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{0} timed out")]
  Timeout(&'static str),

  #[error(transparent)]
  Approval(#[from] ApprovalError),

  #[error(transparent)]
  Duplicates(#[from] DuplicateError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      Self::Approval(e) => match e {
        ApprovalError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ApprovalError::PermissionDenied | ApprovalError::AdminMismatch => StatusCode::FORBIDDEN,
        ApprovalError::RequestNotFound(_) => StatusCode::NOT_FOUND,
        ApprovalError::NotPaid => StatusCode::PRECONDITION_FAILED,
        ApprovalError::NotApprovable(_) | ApprovalError::MemberExists(_) => StatusCode::CONFLICT,
        ApprovalError::MissingPdfUrl | ApprovalError::InvalidMembershipType(_) => {
          StatusCode::BAD_REQUEST
        }
        ApprovalError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
      },
      Self::Duplicates(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"kara\""),
      );
    }
    res
  }
}
