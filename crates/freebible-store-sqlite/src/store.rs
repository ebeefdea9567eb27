//! [`SqliteStore`], the SQLite implementation of [`BibleStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use freebible_core::{
  entity::{ColumnKind, Entity, TABLES, Table},
  lifecycle::{Lifecycle, Scope},
  search::SearchQuery,
  store::BibleStore,
  user::{User, normalize_email},
};
use rusqlite::{
  Connection, ErrorCode, OptionalExtension as _, functions::FunctionFlags,
  params_from_iter, types::Value,
};
use serde_json::{Map, Value as Json};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawLifecycle, encode_dt, encode_fields, filter_clause, icontains, row_to_json,
    scope_clause, select_list,
  },
  schema::SCHEMA,
};

type Row = Map<String, Json>;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A FreeBible store backed by a single SQLite file.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.create_scalar_function(
          "icontains",
          2,
          FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
          |ctx| {
            let haystack = ctx.get::<Option<String>>(0)?;
            let needle = ctx.get::<String>(1)?;
            Ok(icontains(haystack.as_deref(), &needle))
          },
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run on the connection thread inside `Connection::call` and report
// failures through the crate error, which the async wrappers unnest.

fn decode<E: Entity>(row: Row) -> Result<E> {
  Ok(serde_json::from_value(Json::Object(row))?)
}

fn label_of(table_name: &'static str) -> &'static str {
  TABLES
    .iter()
    .find(|t| t.name == table_name)
    .map_or(table_name, |t| t.label)
}

fn fetch_row(conn: &Connection, table: &Table, id: i64) -> Result<Option<Row>> {
  let sql = format!("SELECT {} FROM {} WHERE id = ?1", select_list(table), table.name);
  Ok(conn.query_row(&sql, [id], |row| row_to_json(table, row)).optional()?)
}

fn query_rows(
  conn: &Connection,
  table: &Table,
  where_clause: &str,
  params: Vec<Value>,
) -> Result<Vec<Row>> {
  let sql = format!(
    "SELECT {} FROM {} WHERE {where_clause} ORDER BY id",
    select_list(table),
    table.name
  );
  let mut stmt = conn.prepare(&sql)?;
  let rows = stmt
    .query_map(params_from_iter(params), |row| row_to_json(table, row))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn is_visible(conn: &Connection, table_name: &str, id: i64) -> Result<bool> {
  let sql = format!(
    "SELECT 1 FROM {table_name} WHERE id = ?1 AND {}",
    scope_clause(Scope::Visible)
  );
  Ok(conn.query_row(&sql, [id], |_| Ok(())).optional()?.is_some())
}

/// Reject writes that point a foreign key at an absent or soft-deleted
/// parent. Patches that leave the key alone pass through.
fn check_parent(conn: &Connection, table: &Table, fields: &[(&'static str, Value)]) -> Result<()> {
  let Some(parent) = table.parent else { return Ok(()) };
  let Some((_, Value::Integer(id))) = fields.iter().find(|(name, _)| *name == parent.column)
  else {
    return Ok(());
  };

  if is_visible(conn, parent.table, *id)? {
    Ok(())
  } else {
    Err(
      freebible_core::Error::ParentNotVisible {
        field: parent.column,
        table: label_of(parent.table),
        id:    *id,
      }
      .into(),
    )
  }
}

/// Turn a UNIQUE violation into a field-level conflict.
fn map_constraint(table: &Table, err: rusqlite::Error) -> Error {
  if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err
    && e.code == ErrorCode::ConstraintViolation
    && let Some(cols) = msg.strip_prefix("UNIQUE constraint failed: ")
  {
    let field = cols
      .split(", ")
      .next()
      .and_then(|c| c.split_once('.'))
      .map_or(cols, |(_, column)| column);
    return freebible_core::Error::Conflict {
      table: table.label,
      field: field.to_owned(),
    }
    .into();
  }
  err.into()
}

fn insert_row(
  conn: &mut Connection,
  table: &Table,
  mut fields: Vec<(&'static str, Value)>,
  now: DateTime<Utc>,
) -> Result<Row> {
  let tx = conn.transaction()?;
  check_parent(&tx, table, &fields)?;

  for column in table.columns.iter().filter(|c| c.kind == ColumnKind::GeneratedUuid) {
    fields.push((column.name, Value::Text(Uuid::new_v4().hyphenated().to_string())));
  }
  let lc = Lifecycle::new(now);
  fields.push(("created_at", Value::Text(encode_dt(lc.created_at))));
  fields.push(("updated_at", Value::Text(encode_dt(lc.updated_at))));
  fields.push(("is_active", Value::Integer(i64::from(lc.is_active))));

  let names = fields.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ");
  let placeholders = (1..=fields.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!("INSERT INTO {} ({names}) VALUES ({placeholders})", table.name);

  tx.execute(&sql, params_from_iter(fields.into_iter().map(|(_, v)| v)))
    .map_err(|e| map_constraint(table, e))?;
  let id = tx.last_insert_rowid();

  let sql = format!("SELECT {} FROM {} WHERE id = ?1", select_list(table), table.name);
  let row = tx.query_row(&sql, [id], |row| row_to_json(table, row))?;
  tx.commit()?;
  Ok(row)
}

fn update_row(
  conn: &mut Connection,
  table: &Table,
  id: i64,
  mut fields: Vec<(&'static str, Value)>,
  now: DateTime<Utc>,
) -> Result<Option<Row>> {
  let tx = conn.transaction()?;
  if !is_visible(&tx, table.name, id)? {
    return Ok(None);
  }
  check_parent(&tx, table, &fields)?;

  fields.push(("updated_at", Value::Text(encode_dt(now))));
  let assignments = fields
    .iter()
    .enumerate()
    .map(|(i, (name, _))| format!("{name} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ");
  let sql = format!(
    "UPDATE {} SET {assignments} WHERE id = ?{} AND {}",
    table.name,
    fields.len() + 1,
    scope_clause(Scope::Visible)
  );

  let mut values = fields.into_iter().map(|(_, v)| v).collect::<Vec<_>>();
  values.push(Value::Integer(id));
  let changed = tx
    .execute(&sql, params_from_iter(values))
    .map_err(|e| map_constraint(table, e))?;
  if changed == 0 {
    return Ok(None);
  }

  let row = fetch_row(&tx, table, id)?;
  tx.commit()?;
  Ok(row)
}

fn load_lifecycle(conn: &Connection, table: &Table, id: i64) -> Result<Option<Lifecycle>> {
  let sql = format!("SELECT {} FROM {} WHERE id = ?1", RawLifecycle::SELECT, table.name);
  conn
    .query_row(&sql, [id], RawLifecycle::from_row)
    .optional()?
    .map(RawLifecycle::into_lifecycle)
    .transpose()
}

fn store_lifecycle(conn: &Connection, table: &Table, id: i64, lc: &Lifecycle) -> Result<()> {
  let sql = format!(
    "UPDATE {} SET updated_at = ?1, deleted_at = ?2, is_active = ?3 WHERE id = ?4",
    table.name
  );
  conn.execute(
    &sql,
    rusqlite::params![
      encode_dt(lc.updated_at),
      lc.deleted_at.map(encode_dt),
      lc.is_active,
      id,
    ],
  )?;
  Ok(())
}

/// Load, transform and write back the lifecycle of one row. Returns `false`
/// if the row does not exist.
fn update_lifecycle(
  conn: &Connection,
  table: &Table,
  id: i64,
  apply: impl FnOnce(&mut Lifecycle),
) -> Result<bool> {
  let Some(mut lc) = load_lifecycle(conn, table, id)? else { return Ok(false) };
  apply(&mut lc);
  store_lifecycle(conn, table, id, &lc)?;
  Ok(true)
}

/// Soft-delete every visible descendant of `parent_ids` in `table`.
/// Returns the number of rows hidden.
fn cascade_soft_delete(
  conn: &Connection,
  table: &Table,
  parent_ids: &[i64],
  now: DateTime<Utc>,
) -> Result<usize> {
  let mut hidden = 0;
  for child in table.children() {
    let Some(link) = child.parent else { continue };
    let sql = format!(
      "SELECT id FROM {} WHERE {} = ?1 AND {}",
      child.name,
      link.column,
      scope_clause(Scope::Visible)
    );

    let mut ids = Vec::new();
    {
      let mut stmt = conn.prepare(&sql)?;
      for parent_id in parent_ids {
        for id in stmt.query_map([parent_id], |r| r.get::<_, i64>(0))? {
          ids.push(id?);
        }
      }
    }

    for id in &ids {
      update_lifecycle(conn, child, *id, |lc| lc.soft_delete(now))?;
    }
    hidden += ids.len();
    hidden += cascade_soft_delete(conn, child, &ids, now)?;
  }
  Ok(hidden)
}

fn soft_delete_row(
  conn: &mut Connection,
  table: &Table,
  id: i64,
  cascade: bool,
  now: DateTime<Utc>,
) -> Result<Option<Row>> {
  let tx = conn.transaction()?;
  if !update_lifecycle(&tx, table, id, |lc| lc.soft_delete(now))? {
    return Ok(None);
  }
  if cascade {
    let hidden = cascade_soft_delete(&tx, table, &[id], now)?;
    tracing::debug!(table = table.name, id, hidden, "cascaded soft delete");
  }
  let row = fetch_row(&tx, table, id)?;
  tx.commit()?;
  Ok(row)
}

fn recover_row(conn: &Connection, table: &Table, id: i64, now: DateTime<Utc>) -> Result<Option<Row>> {
  if !update_lifecycle(conn, table, id, |lc| lc.recover(now))? {
    return Ok(None);
  }
  fetch_row(conn, table, id)
}

// ─── BibleStore impl ─────────────────────────────────────────────────────────

impl BibleStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert<E: Entity>(&self, draft: E::Draft) -> Result<E> {
    let table = E::TABLE;
    let fields = encode_fields(&table, &draft, false)?;
    let now = Utc::now();

    let row = self
      .conn
      .call(move |conn| Ok(insert_row(conn, &table, fields, now)))
      .await??;

    decode(row)
  }

  async fn replace<E: Entity>(&self, id: i64, draft: E::Draft) -> Result<Option<E>> {
    let table = E::TABLE;
    let fields = encode_fields(&table, &draft, false)?;
    let now = Utc::now();

    let row = self
      .conn
      .call(move |conn| Ok(update_row(conn, &table, id, fields, now)))
      .await??;

    row.map(decode).transpose()
  }

  async fn patch<E: Entity>(&self, id: i64, patch: E::Patch) -> Result<Option<E>> {
    let table = E::TABLE;
    let fields = encode_fields(&table, &patch, true)?;
    let now = Utc::now();

    let row = self
      .conn
      .call(move |conn| Ok(update_row(conn, &table, id, fields, now)))
      .await??;

    row.map(decode).transpose()
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  async fn soft_delete<E: Entity>(&self, id: i64, cascade: bool) -> Result<Option<E>> {
    let table = E::TABLE;
    let now = Utc::now();

    let row = self
      .conn
      .call(move |conn| Ok(soft_delete_row(conn, &table, id, cascade, now)))
      .await??;

    row.map(decode).transpose()
  }

  async fn recover<E: Entity>(&self, id: i64) -> Result<Option<E>> {
    let table = E::TABLE;
    let now = Utc::now();

    let row = self
      .conn
      .call(move |conn| Ok(recover_row(conn, &table, id, now)))
      .await??;

    row.map(decode).transpose()
  }

  async fn hard_delete<E: Entity>(&self, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", E::TABLE.name);

    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, [id])?))
      .await?;

    Ok(removed > 0)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get<E: Entity>(&self, id: i64, scope: Scope) -> Result<Option<E>> {
    let table = E::TABLE;

    let row = self
      .conn
      .call(move |conn| Ok(fetch_row(conn, &table, id)))
      .await??;

    let record = row.map(decode::<E>).transpose()?;
    Ok(record.filter(|r| scope.admits(r.lifecycle())))
  }

  async fn list<E: Entity>(&self, scope: Scope) -> Result<Vec<E>> {
    let table = E::TABLE;

    let rows = self
      .conn
      .call(move |conn| Ok(query_rows(conn, &table, scope_clause(scope), Vec::new())))
      .await??;

    rows.into_iter().map(decode).collect()
  }

  async fn search<'a, E: Entity>(
    &'a self,
    query: &'a SearchQuery,
    scope: Scope,
  ) -> Result<Vec<E>> {
    let table = E::TABLE;

    let mut clauses = vec![scope_clause(scope).to_owned()];
    let mut params = Vec::with_capacity(query.filters.len());
    for (i, filter) in query.filters.iter().enumerate() {
      let (clause, value) = filter_clause(&table, filter, i + 1)?;
      clauses.push(clause);
      params.push(value);
    }
    let where_clause = clauses.join(" AND ");

    let rows = self
      .conn
      .call(move |conn| Ok(query_rows(conn, &table, &where_clause, params)))
      .await??;

    rows.into_iter().map(decode).collect()
  }

  async fn find_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    let query = SearchQuery::new().exact("email", normalize_email(email));
    let users: Vec<User> = self.search(&query, Scope::Visible).await?;
    Ok(users.into_iter().next())
  }
}
