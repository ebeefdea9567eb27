//! JSON REST API for FreeBible.
//!
//! Exposes an axum [`Router`] backed by any
//! [`freebible_core::store::BibleStore`]. Authentication is the caller's
//! responsibility: an outer layer must place a [`Caller`] in the request
//! extensions, and handlers answer 401 when it is missing.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", freebible_api::api_router(store.clone()))
//! ```

pub mod crud;
pub mod error;
pub mod extract;
pub mod password;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use freebible_core::{
  bible::{BibleVersion, Book, Chapter, Verse},
  entity::Entity,
  store::BibleStore,
  user::User,
};

pub use error::ApiError;
pub use extract::{Caller, RecordId, Staff, ValidatedJson};

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: BibleStore + 'static,
{
  Router::new()
    .merge(resource::<S, BibleVersion>("/bible/bible_version"))
    .merge(resource::<S, Book>("/bible/book"))
    .merge(resource::<S, Chapter>("/bible/chapter"))
    .merge(resource::<S, Verse>("/bible/verse"))
    .merge(user_resource::<S>("/user/custom_user"))
    .with_state(store)
}

/// Every endpoint of one entity, mounted at `base`.
fn resource<S, E>(base: &str) -> Router<Arc<S>>
where
  S: BibleStore + 'static,
  E: Entity,
{
  Router::new()
    .route(base, get(crud::list::<S, E>).post(crud::create::<S, E>))
    .route(
      &format!("{base}/{{id}}"),
      get(crud::get_one::<S, E>)
        .put(crud::replace::<S, E>)
        .patch(crud::patch::<S, E>)
        .delete(crud::destroy::<S, E>),
    )
    .merge(lifecycle_routes::<S, E>(base))
}

/// Users share reads and the staff lifecycle endpoints with the other
/// resources but have their own write and delete handlers.
fn user_resource<S>(base: &str) -> Router<Arc<S>>
where
  S: BibleStore + 'static,
{
  Router::new()
    .route(base, get(crud::list::<S, User>).post(users::create::<S>))
    .route(
      &format!("{base}/{{id}}"),
      get(crud::get_one::<S, User>)
        .put(users::replace::<S>)
        .patch(users::patch::<S>)
        .delete(users::destroy::<S>),
    )
    .merge(lifecycle_routes::<S, User>(base))
}

fn lifecycle_routes<S, E>(base: &str) -> Router<Arc<S>>
where
  S: BibleStore + 'static,
  E: Entity,
{
  Router::new()
    .route(&format!("{base}/search"), get(crud::search::<S, E>))
    .route(&format!("{base}/list_active"), get(crud::list_active::<S, E>))
    .route(&format!("{base}/list_inactive"), get(crud::list_inactive::<S, E>))
    .route(&format!("{base}/all"), get(crud::all::<S, E>))
    .route(&format!("{base}/{{id}}/recover"), post(crud::recover::<S, E>))
    .route(&format!("{base}/{{id}}/hard"), delete(crud::hard_delete::<S, E>))
}
