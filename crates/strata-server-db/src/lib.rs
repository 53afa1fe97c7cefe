// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # strata-server-db
//!
//! SQLite persistence for Strata projects and their VCS-linked repositories.
//!
//! ## Store Pattern
//!
//! Each domain has two components:
//! - **`*Store` trait**: the interface (`ProjectStore`, `RepositoryStore`)
//! - a concrete struct holding a `SqlitePool` that implements it by
//!   delegating to inherent, instrumented methods
//!
//! ```rust,ignore
//! let pool = create_pool("sqlite:./strata.db", 5).await?;
//! run_migrations(&pool).await?;
//!
//! let projects = ProjectRepository::new(pool.clone());
//! let repositories = RepositoryService::new(pool, Arc::new(projects));
//! ```
//!
//! `RepositoryService` takes its [`WorkflowModeWriter`] as a trait object so
//! the project mode switch can be swapped out. The writer always runs on the
//! service's transaction.
//!
//! ## Error Handling
//!
//! | Variant | When |
//! |---------|------|
//! | `NotFound` | Patch or workflow update of an id that does not exist |
//! | `Conflict` | Unique violation, ambiguous find-one |
//! | `Validation` | Malformed create request |
//! | `Sqlx` | Unexpected database errors, propagated with `?` |
//! | `Internal` | Invalid stored data (e.g. unknown workflow type) |
//!
//! Lookups where absence is normal return `Result<Option<T>>`.
//!
//! ## Dynamic Queries
//!
//! Optional filters and patch fields go through [`query::Predicates`] and
//! [`query::Assignments`]. Values are always bound, never formatted into SQL.

mod error;
pub mod migrations;
pub mod pool;
pub mod project;
pub mod query;
pub mod repository;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use error::{DbError, Result};
pub use migrations::run_migrations;
pub use pool::create_pool;
pub use project::{Project, ProjectCreate, ProjectRepository, ProjectStore};
pub use repository::{
	Repository, RepositoryCreate, RepositoryDelete, RepositoryFind, RepositoryPatch,
	RepositoryService, RepositoryStore,
};
pub use workflow::{WorkflowModeWriter, WorkflowType, WorkflowTypePatch};
