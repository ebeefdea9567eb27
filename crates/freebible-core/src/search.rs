//! Parameterised search over a single table.
//!
//! Request parameters are matched against the table's allow-list (the
//! columns carrying a [`Match`]). Known parameters become AND-combined
//! filters; unknown ones are dropped.

use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{ColumnKind, Match, Table},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
  Text(String),
  Integer(i64),
  Bool(bool),
}

impl From<&str> for FilterValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for FilterValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for FilterValue {
  fn from(n: i64) -> Self { Self::Integer(n) }
}

impl From<bool> for FilterValue {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

/// One `column <op> value` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
  pub column:  &'static str,
  pub matcher: Match,
  pub value:   FilterValue,
}

/// A conjunction of filters. An empty query matches every row in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
  pub filters: Vec<Filter>,
}

impl SearchQuery {
  pub fn new() -> Self { Self::default() }

  /// Add an equality filter. Programmatic queries are not bound by the
  /// table's allow-list.
  pub fn exact(mut self, column: &'static str, value: impl Into<FilterValue>) -> Self {
    self.filters.push(Filter { column, matcher: Match::Exact, value: value.into() });
    self
  }

  pub fn contains(mut self, column: &'static str, value: impl Into<String>) -> Self {
    self.filters.push(Filter {
      column,
      matcher: Match::Contains,
      value: FilterValue::Text(value.into()),
    });
    self
  }

  /// Build a query from request parameters against `table`'s allow-list.
  pub fn from_params<'a, I>(table: &Table, params: I) -> Result<Self>
  where
    I: IntoIterator<Item = (&'a str, &'a str)>,
  {
    let mut filters = Vec::new();
    for (name, raw) in params {
      let Some(column) = table.column(name) else { continue };
      let Some(matcher) = column.search else { continue };

      let invalid = || Error::InvalidFilter {
        field: name.to_owned(),
        value: raw.to_owned(),
      };

      let value = match (column.kind, matcher) {
        (_, Match::Contains) => FilterValue::Text(raw.to_owned()),
        (ColumnKind::Integer | ColumnKind::ForeignKey, Match::Exact) => {
          FilterValue::Integer(raw.trim().parse().map_err(|_| invalid())?)
        }
        (ColumnKind::Bool, Match::Exact) => FilterValue::Bool(parse_bool(raw).ok_or_else(invalid)?),
        (ColumnKind::GeneratedUuid, Match::Exact) => {
          let id = Uuid::parse_str(raw.trim()).map_err(|_| invalid())?;
          FilterValue::Text(id.hyphenated().to_string())
        }
        (ColumnKind::Text, Match::Exact) => FilterValue::Text(raw.to_owned()),
      };

      filters.push(Filter { column: column.name, matcher, value });
    }
    Ok(Self { filters })
  }
}

fn parse_bool(raw: &str) -> Option<bool> {
  match raw.trim() {
    "true" | "True" | "1" => Some(true),
    "false" | "False" | "0" => Some(false),
    _ => None,
  }
}
