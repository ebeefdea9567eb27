//! Write handlers for `/user/custom_user`.
//!
//! Reads and the lifecycle endpoints go through [`crate::crud`]. Writes
//! differ: the body carries a plaintext `password` that is hashed before it
//! reaches the store and emails are normalised. Staff may write any account;
//! everyone else only their own, and never the `is_staff` / `is_superuser`
//! flags.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use freebible_core::{
  entity::Entity,
  store::BibleStore,
  user::{
    MaritalStatus, NewUser, Race, Sex, SpecialNeed, USERS, User, UserPatch, normalize_email,
  },
};
use serde::Deserialize;
use validator::Validate;

use crate::{
  crud::{self, DeleteParams},
  error::ApiError,
  extract::{Caller, RecordId, ValidatedJson},
  password::hash_password_blocking,
};

// ─── Bodies ──────────────────────────────────────────────────────────────────

/// Body of `POST` and `PUT`. `password` is required on create; on a full
/// update, leaving it out keeps the current one.
#[derive(Debug, Deserialize, Validate)]
pub struct UserBody {
  #[validate(email)]
  pub email:             String,
  #[validate(length(min = 8, max = 128))]
  pub password:          Option<String>,
  pub employee_number:   i64,
  #[validate(length(min = 1, max = 255))]
  pub name:              String,
  /// Defaults to `name`.
  #[validate(length(min = 1, max = 255))]
  pub collaborator_name: Option<String>,
  pub special_need:      Option<SpecialNeed>,
  pub marital_status:    Option<MaritalStatus>,
  #[validate(length(max = 20))]
  pub phone:             Option<String>,
  #[validate(length(max = 50))]
  pub nationality:       Option<String>,
  pub sex:               Option<Sex>,
  pub race:              Option<Race>,
  #[serde(default)]
  pub is_staff:          bool,
  #[serde(default)]
  pub is_superuser:      bool,
}

impl UserBody {
  fn flags(&self) -> (bool, bool) { (self.is_staff, self.is_superuser) }

  fn into_draft(self, password_hash: String) -> NewUser {
    NewUser {
      email: normalize_email(&self.email),
      password_hash,
      employee_number: self.employee_number,
      collaborator_name: self.collaborator_name.unwrap_or_else(|| self.name.clone()),
      name: self.name,
      special_need: self.special_need,
      marital_status: self.marital_status,
      phone: self.phone,
      nationality: self.nationality,
      sex: self.sex,
      race: self.race,
      is_staff: self.is_staff,
      is_superuser: self.is_superuser,
    }
  }
}

/// Body of `PATCH`: any subset of the user fields plus an optional new
/// `password`. A raw `password_hash` in the body is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct UserPatchBody {
  #[serde(default)]
  #[validate(length(min = 8, max = 128))]
  pub password: Option<String>,
  #[serde(flatten)]
  pub fields:   UserPatch,
}

fn guard_owner(caller: &Caller, id: i64) -> Result<(), ApiError> {
  if !caller.is_staff && caller.id != id {
    tracing::debug!(caller = caller.id, target = id, "write to another account refused");
    return Err(ApiError::Forbidden);
  }
  Ok(())
}

fn guard_flags(caller: &Caller, requested: (bool, bool), current: (bool, bool)) -> Result<(), ApiError> {
  if !caller.is_staff && requested != current {
    return Err(ApiError::Forbidden);
  }
  Ok(())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /user/custom_user`
pub async fn create<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  ValidatedJson(mut body): ValidatedJson<UserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BibleStore,
{
  guard_flags(&caller, body.flags(), (false, false))?;
  let password = body
    .password
    .take()
    .ok_or_else(|| ApiError::field("password", "this field is required"))?;

  let hash = hash_password_blocking(password).await?;
  let user = store
    .insert::<User>(body.into_draft(hash))
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(id = user.id, caller = caller.id, "user created");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /user/custom_user/{id}`
pub async fn replace<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
  ValidatedJson(mut body): ValidatedJson<UserBody>,
) -> Result<Json<User>, ApiError>
where
  S: BibleStore,
{
  guard_owner(&caller, id)?;
  let current = crud::visible::<S, User>(&store, id).await?;
  guard_flags(&caller, body.flags(), (current.is_staff, current.is_superuser))?;

  let hash = match body.password.take() {
    Some(password) => hash_password_blocking(password).await?,
    None => current.password_hash,
  };
  let user = store
    .replace::<User>(id, body.into_draft(hash))
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(USERS.label, id))?;
  Ok(Json(user))
}

/// `PATCH /user/custom_user/{id}`
pub async fn patch<S>(
  caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
  ValidatedJson(body): ValidatedJson<UserPatchBody>,
) -> Result<Json<User>, ApiError>
where
  S: BibleStore,
{
  let UserPatchBody { password, mut fields } = body;
  fields.validate()?;

  guard_owner(&caller, id)?;
  let current = crud::visible::<S, User>(&store, id).await?;
  current.check_patch(&fields)?;
  let requested = (
    fields.is_staff.unwrap_or(current.is_staff),
    fields.is_superuser.unwrap_or(current.is_superuser),
  );
  guard_flags(&caller, requested, (current.is_staff, current.is_superuser))?;

  fields.email = fields.email.as_deref().map(normalize_email);
  fields.password_hash = match password {
    Some(password) => Some(hash_password_blocking(password).await?),
    None => None,
  };

  let user = store
    .patch::<User>(id, fields)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(USERS.label, id))?;
  Ok(Json(user))
}

/// `DELETE /user/custom_user/{id}[?cascade=true]`
pub async fn destroy<S>(
  caller: Caller,
  state: State<Arc<S>>,
  RecordId(id): RecordId,
  params: Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: BibleStore,
{
  guard_owner(&caller, id)?;
  crud::destroy::<S, User>(caller, state, RecordId(id), params).await
}
