// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::migrations::run_migrations;

/// In-memory pool with the real schema applied.
///
/// A single connection keeps every query on the same in-memory database and
/// serializes transactions the way a busy file-backed pool would.
pub async fn create_test_pool() -> SqlitePool {
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.unwrap();
	sqlx::query("PRAGMA foreign_keys = ON")
		.execute(&pool)
		.await
		.unwrap();
	run_migrations(&pool).await.unwrap();
	pool
}
