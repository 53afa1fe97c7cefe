// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Embedded schema migrations.

use sqlx::sqlite::SqlitePool;

use crate::error::DbError;

const MIGRATIONS: &[(&str, &str)] = &[
	("001_project", include_str!("../migrations/001_project.sql")),
	("002_repository", include_str!("../migrations/002_repository.sql")),
];

/// Run all database migrations in order.
///
/// Every statement is `IF NOT EXISTS`, so running this against an
/// already-migrated database is a no-op.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
	apply(pool, MIGRATIONS).await
}

async fn apply(pool: &SqlitePool, migrations: &[(&str, &str)]) -> Result<(), DbError> {
	for &(name, sql) in migrations {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			if let Err(e) = sqlx::query(stmt).execute(pool).await {
				tracing::error!(migration = name, error = %e, "migration failed");
				return Err(e.into());
			}
		}
		tracing::debug!(migration = name, "migration applied");
	}

	tracing::info!(count = migrations.len(), "database migrations complete");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use sqlx::Row;

	#[tokio::test]
	async fn test_migrations_are_idempotent() {
		let pool = SqlitePool::connect(":memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();
		run_migrations(&pool).await.unwrap();

		let tables: Vec<String> = sqlx::query(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('project', 'repository') ORDER BY name",
		)
		.fetch_all(&pool)
		.await
		.unwrap()
		.iter()
		.map(|r| r.get::<String, _>("name"))
		.collect();
		assert_eq!(tables, vec!["project".to_string(), "repository".to_string()]);
	}

	#[tokio::test]
	async fn test_failed_statement_is_propagated() {
		let pool = SqlitePool::connect(":memory:").await.unwrap();
		run_migrations(&pool).await.unwrap();

		let err = apply(&pool, &[("003_bad", "CREATE TABLE project (id INTEGER)")])
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Sqlx(_)));
		assert!(err.to_string().contains("already exists"));
	}
}
