//! Encoding and decoding helpers between domain records and SQLite rows.
//!
//! All timestamps are stored as RFC 3339 strings, booleans as 0/1 integers
//! and UUIDs as hyphenated lowercase strings. Records cross the boundary as
//! flat JSON objects: a draft is serialised to an object whose keys are
//! column names, and a row is read back into an object the entity
//! deserialises from.

use chrono::{DateTime, Utc};
use freebible_core::{
  entity::{ColumnKind, Match, Table},
  lifecycle::{Lifecycle, Scope},
  search::{Filter, FilterValue},
};
use rusqlite::types::Value;
use serde::Serialize;
use serde_json::{Map, Value as Json};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Scope ───────────────────────────────────────────────────────────────────

pub fn scope_clause(scope: Scope) -> &'static str {
  match scope {
    Scope::Visible => "is_active = 1 AND deleted_at IS NULL",
    Scope::All => "1 = 1",
    Scope::Active => "is_active = 1",
    Scope::Inactive => "is_active = 0",
  }
}

// ─── Column lists ────────────────────────────────────────────────────────────

const LIFECYCLE_COLUMNS: &str = "created_at, updated_at, deleted_at, is_active";

/// `id, <domain columns>, <lifecycle columns>` for a SELECT.
pub fn select_list(table: &Table) -> String {
  let mut cols = vec!["id"];
  cols.extend(table.columns.iter().map(|c| c.name));
  format!("{}, {LIFECYCLE_COLUMNS}", cols.join(", "))
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Serialise `payload` and pick out the writable columns of `table`.
///
/// With `partial`, columns missing from the payload are skipped; otherwise
/// they are written as NULL. Generated columns are never included.
pub fn encode_fields<T: Serialize>(
  table: &Table,
  payload: &T,
  partial: bool,
) -> Result<Vec<(&'static str, Value)>> {
  let Json::Object(map) = serde_json::to_value(payload)? else {
    return Err(Error::Encode {
      table:  table.name,
      column: "*",
      value:  serde_json::to_value(payload)?,
    });
  };

  let mut fields = Vec::with_capacity(table.columns.len());
  for column in table.columns {
    if column.kind == ColumnKind::GeneratedUuid {
      continue;
    }
    let value = match map.get(column.name) {
      Some(v) => v,
      None if partial => continue,
      None => &Json::Null,
    };
    fields.push((column.name, encode_value(table, column.name, column.kind, value)?));
  }
  Ok(fields)
}

fn encode_value(
  table: &Table,
  column: &'static str,
  kind: ColumnKind,
  value: &Json,
) -> Result<Value> {
  let encoded = match (kind, value) {
    (_, Json::Null) => Some(Value::Null),
    (ColumnKind::Text | ColumnKind::GeneratedUuid, Json::String(s)) => {
      Some(Value::Text(s.clone()))
    }
    (ColumnKind::Integer | ColumnKind::ForeignKey, Json::Number(n)) => {
      n.as_i64().map(Value::Integer)
    }
    (ColumnKind::Bool, Json::Bool(b)) => Some(Value::Integer(i64::from(*b))),
    _ => None,
  };
  encoded.ok_or_else(|| Error::Encode {
    table: table.name,
    column,
    value: value.clone(),
  })
}

// ─── Filters ─────────────────────────────────────────────────────────────────

/// Render `filter` as a predicate using positional parameter `?{index}`.
///
/// Substring matches go through the `icontains` function registered on the
/// connection, which folds case over the full Unicode range rather than
/// ASCII only.
pub fn filter_clause(
  table: &Table,
  filter: &Filter,
  index: usize,
) -> Result<(String, Value)> {
  let column = table
    .column(filter.column)
    .ok_or(Error::UnknownColumn { table: table.name, column: filter.column })?;

  let value = match &filter.value {
    FilterValue::Text(s) => Value::Text(s.clone()),
    FilterValue::Integer(n) => Value::Integer(*n),
    FilterValue::Bool(b) => Value::Integer(i64::from(*b)),
  };

  let clause = match filter.matcher {
    Match::Exact => format!("{} = ?{index}", column.name),
    Match::Contains => format!("icontains({}, ?{index})", column.name),
  };
  Ok((clause, value))
}

/// Case-insensitive substring test backing the `icontains` SQL function.
pub fn icontains(haystack: Option<&str>, needle: &str) -> bool {
  haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Read a row selected with [`select_list`] into a flat JSON object.
pub fn row_to_json(table: &Table, row: &rusqlite::Row<'_>) -> rusqlite::Result<Map<String, Json>> {
  let mut map = Map::new();
  map.insert("id".into(), Json::from(row.get::<_, i64>(0)?));

  let mut idx = 1;
  for column in table.columns {
    let value = match column.kind {
      ColumnKind::Text | ColumnKind::GeneratedUuid => {
        row.get::<_, Option<String>>(idx)?.map(Json::from)
      }
      ColumnKind::Integer | ColumnKind::ForeignKey => {
        row.get::<_, Option<i64>>(idx)?.map(Json::from)
      }
      ColumnKind::Bool => row.get::<_, Option<bool>>(idx)?.map(Json::from),
    };
    map.insert(column.name.into(), value.unwrap_or(Json::Null));
    idx += 1;
  }

  map.insert("created_at".into(), Json::from(row.get::<_, String>(idx)?));
  map.insert("updated_at".into(), Json::from(row.get::<_, String>(idx + 1)?));
  map.insert(
    "deleted_at".into(),
    row.get::<_, Option<String>>(idx + 2)?.map(Json::from).unwrap_or(Json::Null),
  );
  map.insert("is_active".into(), Json::from(row.get::<_, bool>(idx + 3)?));
  Ok(map)
}

/// Raw lifecycle columns of one row.
pub struct RawLifecycle {
  pub created_at: String,
  pub updated_at: String,
  pub deleted_at: Option<String>,
  pub is_active:  bool,
}

impl RawLifecycle {
  pub const SELECT: &'static str = LIFECYCLE_COLUMNS;

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      created_at: row.get(0)?,
      updated_at: row.get(1)?,
      deleted_at: row.get(2)?,
      is_active:  row.get(3)?,
    })
  }

  pub fn into_lifecycle(self) -> Result<Lifecycle> {
    Ok(Lifecycle {
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      deleted_at: self.deleted_at.as_deref().map(decode_dt).transpose()?,
      is_active:  self.is_active,
    })
  }
}

#[cfg(test)]
mod tests {
  use freebible_core::{
    bible::{BOOKS, BookCode, BookPatch, CHAPTERS, NewChapter},
    search::SearchQuery,
  };

  use super::*;

  #[test]
  fn full_draft_writes_nulls_for_missing_optionals() {
    let draft = NewChapter { book_id: 4, author: None, number: 2 };
    let fields = encode_fields(&CHAPTERS, &draft, false).unwrap();
    assert_eq!(
      fields,
      vec![
        ("book_id", Value::Integer(4)),
        ("author", Value::Null),
        ("number", Value::Integer(2)),
      ]
    );
  }

  #[test]
  fn partial_patch_skips_absent_columns() {
    let patch = BookPatch { code: Some(BookCode::Exodus), ..Default::default() };
    let fields = encode_fields(&BOOKS, &patch, true).unwrap();
    assert_eq!(fields, vec![("code", Value::Text("EX".into()))]);
  }

  #[test]
  fn filter_clause_rejects_unknown_columns() {
    let query = SearchQuery::new().exact("nope", 1_i64);
    let err = filter_clause(&BOOKS, &query.filters[0], 1).unwrap_err();
    assert!(matches!(err, Error::UnknownColumn { column: "nope", .. }));
  }

  #[test]
  fn icontains_folds_unicode_case() {
    assert!(icontains(Some("Evangelho de JOÃO"), "joão"));
    assert!(!icontains(Some("Gênesis"), "êxodo"));
    assert!(!icontains(None, "a"));
  }

  #[test]
  fn rfc3339_roundtrip() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }
}
