//! Error types for `freebible-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A foreign key points at a row that is absent or soft-deleted.
  #[error("{table} {id} does not exist or has been deleted")]
  ParentNotVisible {
    field: &'static str,
    table: &'static str,
    id:    i64,
  },

  /// A UNIQUE column already holds the submitted value.
  #[error("a {table} with this {field} already exists")]
  Conflict {
    table: &'static str,
    field: String,
  },

  #[error("invalid value {value:?} for filter {field:?}")]
  InvalidFilter { field: String, value: String },

  #[error("the email field must be set")]
  MissingEmail,

  #[error("superuser must have is_staff=true and is_superuser=true")]
  InvalidSuperuser,
}

impl Error {
  /// The request field this error should be reported against, if any.
  pub fn field(&self) -> Option<&str> {
    match self {
      Self::ParentNotVisible { field, .. } => Some(*field),
      Self::Conflict { field, .. } | Self::InvalidFilter { field, .. } => {
        Some(field.as_str())
      }
      Self::MissingEmail => Some("email"),
      Self::InvalidSuperuser => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
