//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Validation failures answer with a map of field name to messages, e.g.
//! `{"book_id": ["book 9 does not exist or has been deleted"]}`. Every other
//! failure answers with `{"detail": "..."}`.

use std::collections::BTreeMap;

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Key used for errors that belong to the payload as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(#[from] ValidationErrors),

  /// A single validation message against a named field.
  #[error("{field}: {message}")]
  Field { field: String, message: String },

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("permission denied")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Field { field: field.into(), message: message.into() }
  }

  pub fn not_found(label: &str, id: i64) -> Self {
    Self::NotFound(format!("{label} {id} not found"))
  }

  /// Classify a store error. Input problems reported by the core anywhere in
  /// the source chain become 400s; everything else is a 500.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = source {
      if let Some(core) = e.downcast_ref::<freebible_core::Error>() {
        return Self::from_core(core);
      }
      source = e.source();
    }
    Self::Store(Box::new(err))
  }

  fn from_core(err: &freebible_core::Error) -> Self {
    Self::field(err.field().unwrap_or(NON_FIELD_ERRORS), err.to_string())
  }
}

fn validation_messages(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
  errors
    .field_errors()
    .into_iter()
    .map(|(field, errs)| {
      let field = if field == "__all__" { NON_FIELD_ERRORS } else { field };
      let messages = errs
        .iter()
        .map(|e| match &e.message {
          Some(m) => m.to_string(),
          None => e.code.to_string(),
        })
        .collect();
      (field.to_owned(), messages)
    })
    .collect()
}

impl From<freebible_core::Error> for ApiError {
  fn from(err: freebible_core::Error) -> Self { Self::from_core(&err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, detail) = match &self {
      ApiError::Validation(errors) => {
        return (StatusCode::BAD_REQUEST, Json(validation_messages(errors))).into_response();
      }
      ApiError::Field { field, message } => {
        let body = BTreeMap::from([(field.clone(), vec![message.clone()])]);
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        "authentication credentials were not provided or are invalid".to_owned(),
      ),
      ApiError::Forbidden => (
        StatusCode::FORBIDDEN,
        "you do not have permission to perform this action".to_owned(),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Internal(_) | ApiError::Store(_) => {
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
      }
    };

    let mut resp = (status, Json(json!({ "detail": detail }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      resp.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static(r#"Basic realm="freebible""#),
      );
    }
    resp
  }
}
