// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project workflow mode and the writer that flips it.

use std::fmt;

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::error::DbError;

/// How schema changes reach a project: through the UI, or from a linked
/// VCS repository (GitOps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowType {
	Ui,
	Vcs,
}

impl WorkflowType {
	pub fn as_str(&self) -> &'static str {
		match self {
			WorkflowType::Ui => "UI",
			WorkflowType::Vcs => "VCS",
		}
	}

	/// Parse the stored column value.
	pub fn parse(s: &str) -> Result<Self, DbError> {
		match s {
			"UI" => Ok(WorkflowType::Ui),
			"VCS" => Ok(WorkflowType::Vcs),
			other => Err(DbError::Internal(format!("Unknown workflow type: {other}"))),
		}
	}
}

impl fmt::Display for WorkflowType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTypePatch {
	pub project_id: i64,
	pub updater_id: i64,
	pub workflow_type: WorkflowType,
}

/// Updates a project's workflow mode on a connection the caller owns.
///
/// Implementations must not open their own transaction: the repository
/// service calls this inside its create/delete transaction so the mode flip
/// and the row change commit or roll back together.
#[async_trait]
pub trait WorkflowModeWriter: Send + Sync {
	async fn set_workflow_type(
		&self,
		conn: &mut SqliteConnection,
		patch: &WorkflowTypePatch,
	) -> Result<(), DbError>;
}
