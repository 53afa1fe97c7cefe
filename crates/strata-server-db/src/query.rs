// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed builder for dynamic WHERE and SET clauses.
//!
//! Optional filter and patch fields become an ordered list of
//! `(column, operator, value)` terms. Rendering produces SQL with numbered
//! placeholders (`?1`, `?2`, ...) and the values are bound separately, so a
//! value never ends up inside the SQL text.
//!
//! ```ignore
//! let mut set = Assignments::new();
//! set.set("updater_id", 42).set_opt("branch_filter", Some("main"));
//!
//! let mut filter = Predicates::new();
//! filter.eq("id", 7);
//!
//! let sql = format!(
//!     "UPDATE repository SET {} WHERE {}",
//!     set.render(1),
//!     filter.render(set.len() + 1),
//! );
//! // UPDATE repository SET updater_id = ?1, branch_filter = ?2 WHERE id = ?3
//! let query = bind_values(sqlx::query(&sql), set.values().chain(filter.values()));
//! ```

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// A value bound to a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
	Integer(i64),
	Text(String),
}

impl From<i64> for SqlValue {
	fn from(value: i64) -> Self {
		SqlValue::Integer(value)
	}
}

impl From<String> for SqlValue {
	fn from(value: String) -> Self {
		SqlValue::Text(value)
	}
}

impl From<&str> for SqlValue {
	fn from(value: &str) -> Self {
		SqlValue::Text(value.to_string())
	}
}

/// Comparison operator of a term. Filters here are equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
}

impl CompareOp {
	fn as_sql(self) -> &'static str {
		match self {
			CompareOp::Eq => "=",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
	column: &'static str,
	op: CompareOp,
	value: SqlValue,
}

fn render_terms(terms: &[Term], first_index: usize, separator: &str) -> String {
	terms
		.iter()
		.enumerate()
		.map(|(i, t)| format!("{} {} ?{}", t.column, t.op.as_sql(), first_index + i))
		.collect::<Vec<_>>()
		.join(separator)
}

/// Conjunctive WHERE clause. An empty clause matches every row.
#[derive(Debug, Clone, Default)]
pub struct Predicates {
	terms: Vec<Term>,
}

impl Predicates {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn eq(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
		self.terms.push(Term {
			column,
			op: CompareOp::Eq,
			value: value.into(),
		});
		self
	}

	/// Adds `column = value` only when `value` is present.
	pub fn eq_opt<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
		if let Some(value) = value {
			self.eq(column, value);
		}
		self
	}

	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	/// Render as `a = ?N AND b = ?N+1`, or `1 = 1` when there are no terms.
	pub fn render(&self, first_index: usize) -> String {
		if self.terms.is_empty() {
			return "1 = 1".to_string();
		}
		render_terms(&self.terms, first_index, " AND ")
	}

	pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
		self.terms.iter().map(|t| &t.value)
	}
}

/// Comma separated SET clause.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
	terms: Vec<Term>,
}

impl Assignments {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
		self.terms.push(Term {
			column,
			op: CompareOp::Eq,
			value: value.into(),
		});
		self
	}

	/// Adds `column = value` only when `value` is present.
	pub fn set_opt<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
		if let Some(value) = value {
			self.set(column, value);
		}
		self
	}

	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.terms.iter().map(|t| t.column)
	}

	/// Render as `a = ?N, b = ?N+1`.
	pub fn render(&self, first_index: usize) -> String {
		render_terms(&self.terms, first_index, ", ")
	}

	pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
		self.terms.iter().map(|t| &t.value)
	}
}

/// Bind `values` to `query` in order.
pub fn bind_values<'q, 'v>(
	mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
	values: impl IntoIterator<Item = &'v SqlValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
	for value in values {
		query = match value {
			SqlValue::Integer(v) => query.bind(*v),
			SqlValue::Text(v) => query.bind(v.clone()),
		};
	}
	query
}
