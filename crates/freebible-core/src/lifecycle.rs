//! Soft-delete lifecycle metadata shared by every persisted record.
//!
//! A record is never physically removed by the default delete path. Instead
//! `deleted_at` is stamped and `is_active` cleared, which hides the row from
//! the default [`Scope::Visible`] queries. Only a hard delete removes the row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Timestamps and the active flag carried by every record.
///
/// Serialised flattened into the owning record, so the JSON form of e.g. a
/// verse carries `created_at`, `updated_at`, `deleted_at` and `is_active`
/// next to its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
  pub is_active:  bool,
}

impl Lifecycle {
  /// Metadata for a record created at `now`.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      created_at: now,
      updated_at: now,
      deleted_at: None,
      is_active:  true,
    }
  }

  /// Hide the record. Calling this again keeps it hidden and advances both
  /// timestamps.
  pub fn soft_delete(&mut self, now: DateTime<Utc>) {
    self.deleted_at = Some(now);
    self.is_active = false;
    self.updated_at = now;
  }

  /// Make the record visible again.
  pub fn recover(&mut self, now: DateTime<Utc>) {
    self.deleted_at = None;
    self.is_active = true;
    self.updated_at = now;
  }

  /// Whether the record passes the default [`Scope::Visible`] filter.
  pub fn is_visible(&self) -> bool { self.is_active && self.deleted_at.is_none() }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The implicit filter applied by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
  /// Default scope: `is_active` set and `deleted_at` empty.
  #[default]
  Visible,
  /// Every row regardless of state.
  All,
  /// Unscoped rows with `is_active` set.
  Active,
  /// Unscoped rows with `is_active` cleared.
  Inactive,
}

impl Scope {
  pub fn admits(self, lifecycle: &Lifecycle) -> bool {
    match self {
      Self::Visible => lifecycle.is_visible(),
      Self::All => true,
      Self::Active => lifecycle.is_active,
      Self::Inactive => !lifecycle.is_active,
    }
  }
}
