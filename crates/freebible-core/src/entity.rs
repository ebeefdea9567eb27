//! Table descriptors and the [`Entity`] trait.
//!
//! Every persisted type describes its own table: the columns a storage
//! backend reads and writes, which of them are searchable and how, and the
//! owning parent table if the row hangs off a foreign key. Backends build
//! their SQL from these descriptors instead of reflecting over the types.

use std::fmt::Debug;

use serde::{Serialize, de::DeserializeOwned};
use validator::{Validate, ValidationErrors};

use crate::lifecycle::Lifecycle;

// ─── Descriptors ─────────────────────────────────────────────────────────────

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
  Text,
  Integer,
  Bool,
  /// A UUID generated by the store on insert and never written afterwards.
  GeneratedUuid,
  /// An integer foreign key into [`Table::parent`].
  ForeignKey,
}

/// How a search parameter is compared against a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
  /// Equality.
  Exact,
  /// Case-insensitive substring.
  Contains,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub name:   &'static str,
  pub kind:   ColumnKind,
  /// `None` keeps the column out of search entirely.
  pub search: Option<Match>,
}

impl Column {
  pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
    Self { name, kind, search: None }
  }

  pub const fn exact(self) -> Self { Self { search: Some(Match::Exact), ..self } }

  pub const fn contains(self) -> Self {
    Self { search: Some(Match::Contains), ..self }
  }
}

/// The owning side of a foreign key.
#[derive(Debug, Clone, Copy)]
pub struct Parent {
  /// Column on the child table holding the parent id.
  pub column: &'static str,
  /// Name of the parent table.
  pub table:  &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
  pub name:    &'static str,
  /// Singular, human-readable name used in messages.
  pub label:   &'static str,
  /// Domain columns, excluding `id` and the lifecycle columns.
  pub columns: &'static [Column],
  pub parent:  Option<Parent>,
}

impl Table {
  pub fn column(&self, name: &str) -> Option<&'static Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  /// Tables whose parent is `self`.
  pub fn children(&self) -> impl Iterator<Item = &'static Table> + '_ {
    TABLES
      .iter()
      .copied()
      .filter(move |t| t.parent.is_some_and(|p| p.table == self.name))
  }
}

/// Every table, parents before children.
pub const TABLES: &[&Table] = &[
  &crate::bible::BIBLE_VERSIONS,
  &crate::bible::BOOKS,
  &crate::bible::CHAPTERS,
  &crate::bible::VERSES,
  &crate::user::USERS,
];

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A persisted, soft-deletable record.
///
/// The serialised form of an entity is a flat JSON object holding `id`, every
/// column in [`Entity::TABLE`] and the flattened [`Lifecycle`]. Backends rely
/// on that shape to decode rows.
pub trait Entity:
  Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static
{
  const TABLE: Table;

  /// Payload for creation and full (PUT) updates.
  type Draft: Serialize + DeserializeOwned + Validate + Debug + Send + Sync + 'static;

  /// Payload for partial (PATCH) updates. Absent fields are left untouched,
  /// so it must serialise `None` fields by omitting them.
  type Patch: Serialize + DeserializeOwned + Validate + Debug + Send + Sync + 'static;

  fn id(&self) -> i64;

  fn lifecycle(&self) -> &Lifecycle;

  /// Rules spanning several columns, checked against `self` with `patch`
  /// applied, since a patch may carry only one side of the rule.
  fn check_patch(&self, _patch: &Self::Patch) -> Result<(), ValidationErrors> { Ok(()) }
}
