//! Superuser bootstrap.

use freebible_api::password::hash_password_blocking;
use freebible_core::{
  store::BibleStore,
  user::{NewUser, User},
};
use validator::Validate;

use crate::error::{Error, Result};

/// Input of `server create-superuser`.
#[derive(Debug, Clone)]
pub struct NewSuperuser {
  pub email:             String,
  pub password:          String,
  pub employee_number:   i64,
  pub name:              String,
  /// Defaults to `name`.
  pub collaborator_name: Option<String>,
}

/// Create an account with both the staff and superuser flags set.
pub async fn create_superuser<S>(store: &S, input: NewSuperuser) -> Result<User>
where
  S: BibleStore,
{
  if input.password.is_empty() {
    return Err(Error::EmptyPassword);
  }

  let hash = hash_password_blocking(input.password)
    .await
    .map_err(|e| Error::Password(e.to_string()))?;

  let mut draft = NewUser::new(&input.email, hash, input.employee_number, input.name)?
    .into_superuser();
  if let Some(collaborator_name) = input.collaborator_name {
    draft.collaborator_name = collaborator_name;
  }
  draft.ensure_superuser()?;
  draft.validate()?;

  let user = store.insert::<User>(draft).await.map_err(Error::store)?;
  tracing::info!(id = user.id, email = %user.email, "superuser created");
  Ok(user)
}
