//! Error type for the bootstrap tasks in `freebible-server`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] freebible_core::Error),

  #[error("invalid user: {0}")]
  Validation(#[from] validator::ValidationErrors),

  #[error("password must not be empty")]
  EmptyPassword,

  #[error("password hashing failed: {0}")]
  Password(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
