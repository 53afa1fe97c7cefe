// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Project repository for database operations.

use async_trait::async_trait;
use sqlx::{
	sqlite::{SqlitePool, SqliteRow},
	Row, SqliteConnection,
};

use crate::error::DbError;
use crate::workflow::{WorkflowModeWriter, WorkflowType, WorkflowTypePatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
	pub id: i64,
	pub creator_id: i64,
	pub created_ts: i64,
	pub updater_id: i64,
	pub updated_ts: i64,
	pub name: String,
	pub key: String,
	pub workflow_type: WorkflowType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCreate {
	pub creator_id: i64,
	pub name: String,
	pub key: String,
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
	async fn create_project(&self, create: &ProjectCreate) -> Result<Project, DbError>;
	async fn get_project_by_id(&self, id: i64) -> Result<Option<Project>, DbError>;
	async fn list_projects(&self) -> Result<Vec<Project>, DbError>;
}

#[derive(Clone)]
pub struct ProjectRepository {
	pool: SqlitePool,
}

impl ProjectRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a project. New projects start in UI mode.
	#[tracing::instrument(skip(self, create), fields(name = %create.name, key = %create.key))]
	pub async fn create_project(&self, create: &ProjectCreate) -> Result<Project, DbError> {
		let now = chrono::Utc::now().timestamp();
		let row = sqlx::query(
			r#"
			INSERT INTO project (creator_id, created_ts, updater_id, updated_ts, name, key, workflow_type)
			VALUES (?, ?, ?, ?, ?, ?, ?)
			RETURNING id, creator_id, created_ts, updater_id, updated_ts, name, key, workflow_type
			"#,
		)
		.bind(create.creator_id)
		.bind(now)
		.bind(create.creator_id)
		.bind(now)
		.bind(&create.name)
		.bind(&create.key)
		.bind(WorkflowType::Ui.as_str())
		.fetch_one(&self.pool)
		.await?;

		let project = row_to_project(&row)?;
		tracing::debug!(project_id = project.id, "project created");
		Ok(project)
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_project_by_id(&self, id: i64) -> Result<Option<Project>, DbError> {
		let row = sqlx::query(
			r#"
			SELECT id, creator_id, created_ts, updater_id, updated_ts, name, key, workflow_type
			FROM project
			WHERE id = ?
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(row_to_project).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_projects(&self) -> Result<Vec<Project>, DbError> {
		let rows = sqlx::query(
			r#"
			SELECT id, creator_id, created_ts, updater_id, updated_ts, name, key, workflow_type
			FROM project
			ORDER BY id ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_project).collect()
	}
}

#[async_trait]
impl ProjectStore for ProjectRepository {
	async fn create_project(&self, create: &ProjectCreate) -> Result<Project, DbError> {
		self.create_project(create).await
	}

	async fn get_project_by_id(&self, id: i64) -> Result<Option<Project>, DbError> {
		self.get_project_by_id(id).await
	}

	async fn list_projects(&self) -> Result<Vec<Project>, DbError> {
		self.list_projects().await
	}
}

#[async_trait]
impl WorkflowModeWriter for ProjectRepository {
	#[tracing::instrument(
		skip(self, conn, patch),
		fields(project_id = patch.project_id, workflow_type = %patch.workflow_type)
	)]
	async fn set_workflow_type(
		&self,
		conn: &mut SqliteConnection,
		patch: &WorkflowTypePatch,
	) -> Result<(), DbError> {
		let result = sqlx::query(
			r#"
			UPDATE project
			SET workflow_type = ?, updater_id = ?, updated_ts = ?
			WHERE id = ?
			"#,
		)
		.bind(patch.workflow_type.as_str())
		.bind(patch.updater_id)
		.bind(chrono::Utc::now().timestamp())
		.bind(patch.project_id)
		.execute(&mut *conn)
		.await?;

		if result.rows_affected() == 0 {
			return Err(DbError::NotFound(format!(
				"Project {} not found",
				patch.project_id
			)));
		}
		Ok(())
	}
}

fn row_to_project(row: &SqliteRow) -> Result<Project, DbError> {
	let workflow_type: String = row.get("workflow_type");
	Ok(Project {
		id: row.get("id"),
		creator_id: row.get("creator_id"),
		created_ts: row.get("created_ts"),
		updater_id: row.get("updater_id"),
		updated_ts: row.get("updated_ts"),
		name: row.get("name"),
		key: row.get("key"),
		workflow_type: WorkflowType::parse(&workflow_type)?,
	})
}
