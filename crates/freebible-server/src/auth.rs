//! HTTP Basic authentication against the user table.
//!
//! The username is the account email. A request authenticates when a visible
//! user with that email exists and the password verifies against its argon2
//! hash; the user then rides along as a [`Caller`] in the request
//! extensions.

use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use freebible_api::{ApiError, Caller, password::verify_password};
use freebible_core::store::BibleStore;

use crate::AppState;

/// Decode `Authorization: Basic ...` into `(email, password)`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = B64.decode(encoded.trim()).ok()?;
  let creds = String::from_utf8(decoded).ok()?;
  let (email, password) = creds.split_once(':')?;
  Some((email.to_owned(), password.to_owned()))
}

/// Resolve the request's credentials to a [`Caller`].
pub async fn authenticate<S>(store: &S, headers: &HeaderMap) -> Result<Caller, ApiError>
where
  S: BibleStore,
{
  let (email, password) = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;

  let Some(user) = store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::from_store)?
  else {
    tracing::debug!(%email, "unknown or inactive user");
    return Err(ApiError::Unauthorized);
  };

  let hash = user.password_hash.clone();
  let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
    .await
    .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))?;
  if !verified {
    tracing::debug!(%email, "wrong password");
    return Err(ApiError::Unauthorized);
  }

  Ok(Caller::from(&user))
}

/// Middleware: authenticate or answer 401.
pub async fn require_caller<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: BibleStore + Clone + 'static,
{
  match authenticate(state.store.as_ref(), req.headers()).await {
    Ok(caller) => {
      req.extensions_mut().insert(caller);
      next.run(req).await
    }
    Err(e) => e.into_response(),
  }
}
