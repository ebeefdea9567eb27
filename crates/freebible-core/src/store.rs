//! The `BibleStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `freebible-store-sqlite`). Higher layers (`freebible-api`,
//! `freebible-server`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{entity::Entity, lifecycle::Scope, search::SearchQuery, user::User};

/// Abstraction over a FreeBible store backend.
///
/// Every method is generic over the [`Entity`] it touches; the backend
/// derives its queries from [`Entity::TABLE`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BibleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new record. Generated UUID columns and the lifecycle
  /// timestamps are assigned by the store.
  ///
  /// Fails with [`crate::Error::ParentNotVisible`] if the draft references a
  /// parent that is absent or soft-deleted.
  fn insert<E: Entity>(
    &self,
    draft: E::Draft,
  ) -> impl Future<Output = Result<E, Self::Error>> + Send + '_;

  /// Overwrite every writable column of a visible record. Returns `None` if
  /// no visible record has this id.
  fn replace<E: Entity>(
    &self,
    id: i64,
    draft: E::Draft,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Overwrite the columns present in `patch` on a visible record.
  fn patch<E: Entity>(
    &self,
    id: i64,
    patch: E::Patch,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  // ── Lifecycle ─────────────────────────────────────────────────────────

  /// Stamp `deleted_at` and clear `is_active` on any existing record,
  /// visible or not. With `cascade`, every still-visible descendant is
  /// soft-deleted too. Returns `None` if the row does not exist.
  fn soft_delete<E: Entity>(
    &self,
    id: i64,
    cascade: bool,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Clear `deleted_at` and set `is_active`. Descendants and ancestors are
  /// left as they are.
  fn recover<E: Entity>(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// Physically remove the record and, through the foreign keys, every
  /// descendant. Returns whether a row was removed.
  fn hard_delete<E: Entity>(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  fn get<E: Entity>(
    &self,
    id: i64,
    scope: Scope,
  ) -> impl Future<Output = Result<Option<E>, Self::Error>> + Send + '_;

  /// All records admitted by `scope`, in storage order.
  fn list<E: Entity>(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + '_;

  /// Records admitted by `scope` that satisfy every filter in `query`.
  fn search<'a, E: Entity>(
    &'a self,
    query: &'a SearchQuery,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<E>, Self::Error>> + Send + 'a;

  /// Look up a visible user by (normalised) email, for authentication.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}
