//! User accounts. The email address is the sole login identifier.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
  Error, Result,
  entity::{Column, ColumnKind, Entity, Table},
  lifecycle::Lifecycle,
};

// ─── Demographics ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialNeed {
  #[serde(rename = "F")]
  Physical,
  #[serde(rename = "I")]
  Intellectual,
  #[serde(rename = "V")]
  Visual,
  #[serde(rename = "A")]
  Hearing,
  #[serde(rename = "M")]
  Multiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
  #[serde(rename = "S")]
  Single,
  #[serde(rename = "C")]
  Married,
  #[serde(rename = "D")]
  Divorced,
  #[serde(rename = "V")]
  Widowed,
  #[serde(rename = "U")]
  StableUnion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
  #[serde(rename = "M")]
  Male,
  #[serde(rename = "F")]
  Female,
  #[serde(rename = "O")]
  Other,
  #[serde(rename = "N")]
  Undisclosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Race {
  #[serde(rename = "BR")]
  White,
  #[serde(rename = "PR")]
  Black,
  #[serde(rename = "PA")]
  Brown,
  #[serde(rename = "IN")]
  Indigenous,
  #[serde(rename = "AM")]
  Asian,
}

// ─── Table ───────────────────────────────────────────────────────────────────

pub const USERS: Table = Table {
  name:    "users",
  label:   "user",
  columns: &[
    Column::new("code", ColumnKind::GeneratedUuid),
    Column::new("email", ColumnKind::Text).contains(),
    Column::new("password_hash", ColumnKind::Text),
    Column::new("employee_number", ColumnKind::Integer).exact(),
    Column::new("name", ColumnKind::Text).contains(),
    Column::new("collaborator_name", ColumnKind::Text).contains(),
    Column::new("special_need", ColumnKind::Text).exact(),
    Column::new("marital_status", ColumnKind::Text).exact(),
    Column::new("phone", ColumnKind::Text).contains(),
    Column::new("nationality", ColumnKind::Text).contains(),
    Column::new("sex", ColumnKind::Text).exact(),
    Column::new("race", ColumnKind::Text).exact(),
    Column::new("is_staff", ColumnKind::Bool).exact(),
    Column::new("is_superuser", ColumnKind::Bool),
  ],
  parent:  None,
};

// ─── User ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:                i64,
  pub code:              Uuid,
  pub email:             String,
  /// Argon2 PHC string. Read from storage, never written to API output.
  #[serde(skip_serializing)]
  pub password_hash:     String,
  pub employee_number:   i64,
  pub name:              String,
  pub collaborator_name: String,
  pub special_need:      Option<SpecialNeed>,
  pub marital_status:    Option<MaritalStatus>,
  pub phone:             Option<String>,
  pub nationality:       Option<String>,
  pub sex:               Option<Sex>,
  pub race:              Option<Race>,
  /// May use the administrative endpoints.
  pub is_staff:          bool,
  pub is_superuser:      bool,
  #[serde(flatten)]
  pub lifecycle:         Lifecycle,
}

/// Creation payload. Build through [`NewUser::new`] so the email is
/// normalised.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewUser {
  #[validate(email)]
  pub email:             String,
  pub password_hash:     String,
  pub employee_number:   i64,
  #[validate(length(min = 1, max = 255))]
  pub name:              String,
  #[validate(length(min = 1, max = 255))]
  pub collaborator_name: String,
  pub special_need:      Option<SpecialNeed>,
  pub marital_status:    Option<MaritalStatus>,
  #[validate(length(max = 20))]
  pub phone:             Option<String>,
  #[validate(length(max = 50))]
  pub nationality:       Option<String>,
  pub sex:               Option<Sex>,
  pub race:              Option<Race>,
  pub is_staff:          bool,
  pub is_superuser:      bool,
}

impl NewUser {
  /// A regular account with no demographic data and no elevated flags.
  /// `collaborator_name` starts out equal to `name`.
  pub fn new(
    email: &str,
    password_hash: String,
    employee_number: i64,
    name: impl Into<String>,
  ) -> Result<Self> {
    if email.trim().is_empty() {
      return Err(Error::MissingEmail);
    }
    let name = name.into();
    Ok(Self {
      email: normalize_email(email),
      password_hash,
      employee_number,
      collaborator_name: name.clone(),
      name,
      special_need: None,
      marital_status: None,
      phone: None,
      nationality: None,
      sex: None,
      race: None,
      is_staff: false,
      is_superuser: false,
    })
  }

  /// Grant the staff and superuser flags.
  pub fn into_superuser(self) -> Self {
    Self { is_staff: true, is_superuser: true, ..self }
  }

  /// Reject a superuser payload whose flags were switched back off.
  pub fn ensure_superuser(&self) -> Result<()> {
    if self.is_staff && self.is_superuser {
      Ok(())
    } else {
      Err(Error::InvalidSuperuser)
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(email)]
  pub email:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password_hash:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub employee_number:   Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(min = 1, max = 255))]
  pub name:              Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(min = 1, max = 255))]
  pub collaborator_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub special_need:      Option<SpecialNeed>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub marital_status:    Option<MaritalStatus>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(max = 20))]
  pub phone:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  #[validate(length(max = 50))]
  pub nationality:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sex:               Option<Sex>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub race:              Option<Race>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_staff:          Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_superuser:      Option<bool>,
}

impl Entity for User {
  type Draft = NewUser;
  type Patch = UserPatch;

  const TABLE: Table = USERS;

  fn id(&self) -> i64 { self.id }

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

/// Trim the address and lower-case its domain part. The local part is left
/// alone since some mail servers treat it case-sensitively.
pub fn normalize_email(email: &str) -> String {
  let email = email.trim();
  match email.rsplit_once('@') {
    Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
    None => email.to_owned(),
  }
}
