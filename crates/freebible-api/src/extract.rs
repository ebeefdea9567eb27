//! Request extractors: validated JSON bodies, record ids and the
//! authenticated caller.

use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Path, Request},
  http::request::Parts,
};
use freebible_core::user::User;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

// ─── ValidatedJson ───────────────────────────────────────────────────────────

/// A JSON body that has been deserialised and passed its `validator` rules.
///
/// Malformed JSON is rejected with `{"detail": ...}`; rule violations with the
/// per-field messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
  T: DeserializeOwned + Validate,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    value.validate()?;
    Ok(Self(value))
  }
}

// ─── RecordId ────────────────────────────────────────────────────────────────

/// The `{id}` path segment. A non-numeric id is a 400 with a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

impl<S> FromRequestParts<S> for RecordId
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(id) = Path::<i64>::from_request_parts(parts, state)
      .await
      .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    Ok(Self(id))
  }
}

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The authenticated user a request runs on behalf of.
///
/// Placed in the request extensions by the authentication layer; handlers
/// that take a `Caller` answer 401 when it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub id:       i64,
  pub email:    String,
  pub is_staff: bool,
}

impl From<&User> for Caller {
  fn from(user: &User) -> Self {
    Self {
      id:       user.id,
      email:    user.email.clone(),
      is_staff: user.is_staff,
    }
  }
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Caller>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// A [`Caller`] with the staff flag set; anyone else gets 403.
#[derive(Debug, Clone)]
pub struct Staff(pub Caller);

impl<S> FromRequestParts<S> for Staff
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let caller = Caller::from_request_parts(parts, state).await?;
    if !caller.is_staff {
      tracing::debug!(caller = caller.id, "staff-only endpoint refused");
      return Err(ApiError::Forbidden);
    }
    Ok(Self(caller))
  }
}
