//! Generic handlers shared by every resource.
//!
//! | Method   | Path                 | Notes |
//! |----------|----------------------|-------|
//! | `GET`    | `/{res}`             | visible records |
//! | `POST`   | `/{res}`             | 201 + created record |
//! | `GET`    | `/{res}/{id}`        | 404 unless visible |
//! | `PUT`    | `/{res}/{id}`        | full update |
//! | `PATCH`  | `/{res}/{id}`        | partial update |
//! | `DELETE` | `/{res}/{id}`        | soft delete, `?cascade=true` to include descendants |
//! | `GET`    | `/{res}/search`      | allow-listed filters |
//! | `GET`    | `/{res}/list_active` | unscoped, active |
//! | `GET`    | `/{res}/list_inactive` | unscoped, inactive (staff) |
//! | `GET`    | `/{res}/all`         | unscoped (staff) |
//! | `POST`   | `/{res}/{id}/recover`| staff |
//! | `DELETE` | `/{res}/{id}/hard`   | staff |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use freebible_core::{entity::Entity, lifecycle::Scope, search::SearchQuery, store::BibleStore};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{Caller, RecordId, Staff, ValidatedJson},
};

/// Fetch a visible record or answer 404.
pub(crate) async fn visible<S, E>(store: &S, id: i64) -> Result<E, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  store
    .get::<E>(id, Scope::Visible)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(E::TABLE.label, id))
}

async fn listing<S, E>(store: &S, scope: Scope) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let records = store.list::<E>(scope).await.map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// `GET /{res}`
pub async fn list<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  listing::<S, E>(&store, Scope::Visible).await
}

/// `GET /{res}/list_active`
pub async fn list_active<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  listing::<S, E>(&store, Scope::Active).await
}

/// `GET /{res}/list_inactive`
pub async fn list_inactive<S, E>(
  _staff: Staff,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  listing::<S, E>(&store, Scope::Inactive).await
}

/// `GET /{res}/all`
pub async fn all<S, E>(
  _staff: Staff,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  listing::<S, E>(&store, Scope::All).await
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// `GET /{res}/search?field=value&...`
pub async fn search<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
  Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<E>>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let query = SearchQuery::from_params(
    &E::TABLE,
    params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
  )?;
  tracing::debug!(table = E::TABLE.name, filters = query.filters.len(), "search");

  let records = store
    .search::<E>(&query, Scope::Visible)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Create / read / update ──────────────────────────────────────────────────

/// `POST /{res}`
pub async fn create<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
  ValidatedJson(draft): ValidatedJson<E::Draft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let record = store.insert::<E>(draft).await.map_err(ApiError::from_store)?;
  tracing::info!(table = E::TABLE.name, id = record.id(), "created");
  Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /{res}/{id}`
pub async fn get_one<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
) -> Result<Json<E>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  Ok(Json(visible::<S, E>(&store, id).await?))
}

/// `PUT /{res}/{id}`
pub async fn replace<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
  ValidatedJson(draft): ValidatedJson<E::Draft>,
) -> Result<Json<E>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let record = store
    .replace::<E>(id, draft)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(E::TABLE.label, id))?;
  Ok(Json(record))
}

/// `PATCH /{res}/{id}`
pub async fn patch<S, E>(
  _caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
  ValidatedJson(patch): ValidatedJson<E::Patch>,
) -> Result<Json<E>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  visible::<S, E>(&store, id).await?.check_patch(&patch)?;
  let record = store
    .patch::<E>(id, patch)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(E::TABLE.label, id))?;
  Ok(Json(record))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  #[serde(default)]
  pub cascade: bool,
}

/// `DELETE /{res}/{id}[?cascade=true]`
pub async fn destroy<S, E>(
  caller: Caller,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
  Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  visible::<S, E>(&store, id).await?;
  store
    .soft_delete::<E>(id, params.cascade)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(
    table = E::TABLE.name,
    id,
    cascade = params.cascade,
    caller = caller.id,
    "soft-deleted"
  );
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /{res}/{id}/recover`
pub async fn recover<S, E>(
  Staff(caller): Staff,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
) -> Result<Json<E>, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let record = store
    .recover::<E>(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::not_found(E::TABLE.label, id))?;
  tracing::info!(table = E::TABLE.name, id, caller = caller.id, "recovered");
  Ok(Json(record))
}

/// `DELETE /{res}/{id}/hard`
pub async fn hard_delete<S, E>(
  Staff(caller): Staff,
  State(store): State<Arc<S>>,
  RecordId(id): RecordId,
) -> Result<StatusCode, ApiError>
where
  S: BibleStore,
  E: Entity,
{
  let removed = store.hard_delete::<E>(id).await.map_err(ApiError::from_store)?;
  if !removed {
    return Err(ApiError::not_found(E::TABLE.label, id));
  }
  tracing::warn!(table = E::TABLE.name, id, caller = caller.id, "hard-deleted");
  Ok(StatusCode::NO_CONTENT)
}
