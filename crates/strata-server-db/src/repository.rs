// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! VCS-linked repository persistence.
//!
//! A repository row links a project to a project in an external VCS. Its
//! existence decides the project's workflow mode: creating one switches the
//! project to [`WorkflowType::Vcs`], deleting it switches back to
//! [`WorkflowType::Ui`]. Both writes happen in one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{
	sqlite::{Sqlite, SqlitePool, SqliteRow},
	Row, SqliteConnection, Transaction,
};
use strata_common_secret::SecretString;

use crate::error::DbError;
use crate::query::{bind_values, Assignments, Predicates};
use crate::workflow::{WorkflowModeWriter, WorkflowType, WorkflowTypePatch};

const REPOSITORY_COLUMNS: &str = "id, creator_id, created_ts, updater_id, updated_ts, \
	vcs_id, project_id, name, full_path, web_url, \
	branch_filter, base_directory, file_path_template, schema_path_template, \
	external_id, external_webhook_id, webhook_url_host, webhook_endpoint_id, \
	webhook_secret_token, access_token, expires_ts, refresh_token";

/// A stored repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
	pub id: i64,
	pub creator_id: i64,
	pub created_ts: i64,
	pub updater_id: i64,
	pub updated_ts: i64,

	pub vcs_id: i64,
	pub project_id: i64,

	pub name: String,
	pub full_path: String,
	pub web_url: String,

	pub branch_filter: String,
	pub base_directory: String,
	pub file_path_template: String,
	pub schema_path_template: String,

	pub external_id: String,
	pub external_webhook_id: String,
	pub webhook_url_host: String,
	pub webhook_endpoint_id: String,
	pub webhook_secret_token: SecretString,
	pub access_token: SecretString,
	pub expires_ts: i64,
	pub refresh_token: SecretString,
}

/// Fields for a new repository. `id` and the audit timestamps are assigned
/// by the store; the updater is the creator.
#[derive(Debug, Clone, Default)]
pub struct RepositoryCreate {
	pub creator_id: i64,

	pub vcs_id: i64,
	pub project_id: i64,

	pub name: String,
	pub full_path: String,
	pub web_url: String,

	pub branch_filter: String,
	pub base_directory: String,
	pub file_path_template: String,
	pub schema_path_template: String,

	pub external_id: String,
	pub external_webhook_id: String,
	pub webhook_url_host: String,
	pub webhook_endpoint_id: String,
	pub webhook_secret_token: SecretString,
	pub access_token: SecretString,
	pub expires_ts: i64,
	pub refresh_token: SecretString,
}

impl RepositoryCreate {
	pub fn validate(&self) -> Result<(), DbError> {
		if self.creator_id <= 0 {
			return Err(DbError::Validation("creator_id must be positive".to_string()));
		}
		if self.vcs_id <= 0 {
			return Err(DbError::Validation("vcs_id must be positive".to_string()));
		}
		if self.project_id <= 0 {
			return Err(DbError::Validation("project_id must be positive".to_string()));
		}
		if self.name.trim().is_empty() {
			return Err(DbError::Validation("name must not be empty".to_string()));
		}
		if self.full_path.trim().is_empty() {
			return Err(DbError::Validation("full_path must not be empty".to_string()));
		}
		Ok(())
	}
}

/// Equality filters. Absent fields do not constrain; all present fields must
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryFind {
	pub id: Option<i64>,
	pub vcs_id: Option<i64>,
	pub project_id: Option<i64>,
	pub webhook_endpoint_id: Option<String>,
}

impl RepositoryFind {
	fn predicates(&self) -> Predicates {
		let mut filter = Predicates::new();
		filter
			.eq_opt("id", self.id)
			.eq_opt("vcs_id", self.vcs_id)
			.eq_opt("project_id", self.project_id)
			.eq_opt("webhook_endpoint_id", self.webhook_endpoint_id.as_deref());
		filter
	}
}

/// Partial update of the mutable repository fields.
#[derive(Debug, Clone, Default)]
pub struct RepositoryPatch {
	pub id: i64,
	pub updater_id: i64,

	pub branch_filter: Option<String>,
	pub base_directory: Option<String>,
	pub file_path_template: Option<String>,
	pub schema_path_template: Option<String>,

	pub access_token: Option<SecretString>,
	pub expires_ts: Option<i64>,
	pub refresh_token: Option<SecretString>,
}

impl RepositoryPatch {
	fn assignments(&self, now: i64) -> Assignments {
		let mut set = Assignments::new();
		set.set("updater_id", self.updater_id)
			.set("updated_ts", now)
			.set_opt("branch_filter", self.branch_filter.as_deref())
			.set_opt("base_directory", self.base_directory.as_deref())
			.set_opt("file_path_template", self.file_path_template.as_deref())
			.set_opt("schema_path_template", self.schema_path_template.as_deref())
			.set_opt(
				"access_token",
				self.access_token.as_ref().map(|t| t.expose().as_str()),
			)
			.set_opt("expires_ts", self.expires_ts)
			.set_opt(
				"refresh_token",
				self.refresh_token.as_ref().map(|t| t.expose().as_str()),
			);
		set
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryDelete {
	pub project_id: i64,
	pub deleter_id: i64,
}

#[async_trait]
pub trait RepositoryStore: Send + Sync {
	async fn create_repository(&self, create: &RepositoryCreate) -> Result<Repository, DbError>;
	async fn list_repositories(&self, find: &RepositoryFind) -> Result<Vec<Repository>, DbError>;
	async fn find_repository(&self, find: &RepositoryFind) -> Result<Option<Repository>, DbError>;
	async fn patch_repository(&self, patch: &RepositoryPatch) -> Result<Repository, DbError>;
	async fn delete_repository(&self, delete: &RepositoryDelete) -> Result<(), DbError>;
}

#[async_trait]
impl RepositoryStore for RepositoryService {
	async fn create_repository(&self, create: &RepositoryCreate) -> Result<Repository, DbError> {
		self.create_repository(create).await
	}

	async fn list_repositories(&self, find: &RepositoryFind) -> Result<Vec<Repository>, DbError> {
		self.list_repositories(find).await
	}

	async fn find_repository(&self, find: &RepositoryFind) -> Result<Option<Repository>, DbError> {
		self.find_repository(find).await
	}

	async fn patch_repository(&self, patch: &RepositoryPatch) -> Result<Repository, DbError> {
		self.patch_repository(patch).await
	}

	async fn delete_repository(&self, delete: &RepositoryDelete) -> Result<(), DbError> {
		self.delete_repository(delete).await
	}
}

/// Repository store backed by SQLite.
///
/// The workflow writer is called on the same transaction as the repository
/// row change.
#[derive(Clone)]
pub struct RepositoryService {
	pool: SqlitePool,
	workflow: Arc<dyn WorkflowModeWriter>,
}

impl RepositoryService {
	pub fn new(pool: SqlitePool, workflow: Arc<dyn WorkflowModeWriter>) -> Self {
		Self { pool, workflow }
	}

	/// Create a repository and switch its project to VCS mode.
	///
	/// # Errors
	/// - `DbError::Validation` for a malformed request.
	/// - `DbError::Conflict` if the project already has a repository.
	/// - Whatever the workflow writer returns, e.g. `DbError::NotFound` for
	///   an unknown project. Nothing is persisted on any error.
	#[tracing::instrument(
		skip(self, create),
		fields(project_id = create.project_id, vcs_id = create.vcs_id, full_path = %create.full_path)
	)]
	pub async fn create_repository(&self, create: &RepositoryCreate) -> Result<Repository, DbError> {
		create.validate()?;

		let mut tx = self.pool.begin().await?;
		let result = self.create_in_tx(&mut tx, create).await;
		let repository = finish(tx, result).await?;

		tracing::info!(repository_id = repository.id, "repository created");
		Ok(repository)
	}

	async fn create_in_tx(
		&self,
		conn: &mut SqliteConnection,
		create: &RepositoryCreate,
	) -> Result<Repository, DbError> {
		self
			.workflow
			.set_workflow_type(
				&mut *conn,
				&WorkflowTypePatch {
					project_id: create.project_id,
					updater_id: create.creator_id,
					workflow_type: WorkflowType::Vcs,
				},
			)
			.await?;

		let now = chrono::Utc::now().timestamp();
		let sql = format!(
			r#"
			INSERT INTO repository (
				creator_id, created_ts, updater_id, updated_ts,
				vcs_id, project_id, name, full_path, web_url,
				branch_filter, base_directory, file_path_template, schema_path_template,
				external_id, external_webhook_id, webhook_url_host, webhook_endpoint_id,
				webhook_secret_token, access_token, expires_ts, refresh_token
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			RETURNING {REPOSITORY_COLUMNS}
			"#
		);
		let row = sqlx::query(&sql)
			.bind(create.creator_id)
			.bind(now)
			.bind(create.creator_id)
			.bind(now)
			.bind(create.vcs_id)
			.bind(create.project_id)
			.bind(&create.name)
			.bind(&create.full_path)
			.bind(&create.web_url)
			.bind(&create.branch_filter)
			.bind(&create.base_directory)
			.bind(&create.file_path_template)
			.bind(&create.schema_path_template)
			.bind(&create.external_id)
			.bind(&create.external_webhook_id)
			.bind(&create.webhook_url_host)
			.bind(&create.webhook_endpoint_id)
			.bind(create.webhook_secret_token.expose().as_str())
			.bind(create.access_token.expose().as_str())
			.bind(create.expires_ts)
			.bind(create.refresh_token.expose().as_str())
			.fetch_one(&mut *conn)
			.await
			.map_err(|e| match e {
				sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::Conflict(format!(
					"Project {} already has a repository",
					create.project_id
				)),
				e => DbError::Sqlx(e),
			})?;

		row_to_repository(&row)
	}

	/// List repositories matching every present filter, oldest first.
	#[tracing::instrument(
		skip(self, find),
		fields(id = ?find.id, vcs_id = ?find.vcs_id, project_id = ?find.project_id)
	)]
	pub async fn list_repositories(&self, find: &RepositoryFind) -> Result<Vec<Repository>, DbError> {
		let mut tx = self.pool.begin().await?;
		let result = fetch_matching(&mut tx, find, None).await;
		finish(tx, result).await
	}

	/// Find the single repository matching `find`.
	///
	/// Returns `Ok(None)` when nothing matches and `DbError::Conflict` when
	/// the filter is ambiguous.
	#[tracing::instrument(
		skip(self, find),
		fields(id = ?find.id, vcs_id = ?find.vcs_id, project_id = ?find.project_id)
	)]
	pub async fn find_repository(&self, find: &RepositoryFind) -> Result<Option<Repository>, DbError> {
		let mut tx = self.pool.begin().await?;
		let result = fetch_matching(&mut tx, find, Some(2)).await;
		let mut matches = finish(tx, result).await?;

		match matches.len() {
			0 => Ok(None),
			1 => Ok(matches.pop()),
			_ => Err(DbError::Conflict(format!(
				"Found 2 or more repositories matching {find:?}"
			))),
		}
	}

	/// Apply the present fields of `patch` in one statement. `updater_id` and
	/// `updated_ts` are always written.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if no repository has `patch.id`.
	#[tracing::instrument(skip(self, patch), fields(repository_id = patch.id, updater_id = patch.updater_id))]
	pub async fn patch_repository(&self, patch: &RepositoryPatch) -> Result<Repository, DbError> {
		let set = patch.assignments(chrono::Utc::now().timestamp());
		let mut filter = Predicates::new();
		filter.eq("id", patch.id);

		let sql = format!(
			"UPDATE repository SET {} WHERE {} RETURNING {REPOSITORY_COLUMNS}",
			set.render(1),
			filter.render(set.len() + 1),
		);

		let mut tx = self.pool.begin().await?;
		let result = bind_values(sqlx::query(&sql), set.values().chain(filter.values()))
			.fetch_optional(&mut *tx)
			.await
			.map_err(DbError::from);
		let row = finish(tx, result)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("Repository {} not found", patch.id)))?;

		let repository = row_to_repository(&row)?;
		tracing::debug!(columns = set.len(), "repository patched");
		Ok(repository)
	}

	/// Switch the project back to UI mode and remove its repositories.
	///
	/// The mode switch runs first; if it fails no row is deleted.
	#[tracing::instrument(skip(self), fields(project_id = delete.project_id))]
	pub async fn delete_repository(&self, delete: &RepositoryDelete) -> Result<(), DbError> {
		let mut tx = self.pool.begin().await?;
		let result = self.delete_in_tx(&mut tx, delete).await;
		let deleted = finish(tx, result).await?;

		tracing::info!(deleted, "repository deleted");
		Ok(())
	}

	async fn delete_in_tx(
		&self,
		conn: &mut SqliteConnection,
		delete: &RepositoryDelete,
	) -> Result<u64, DbError> {
		self
			.workflow
			.set_workflow_type(
				&mut *conn,
				&WorkflowTypePatch {
					project_id: delete.project_id,
					updater_id: delete.deleter_id,
					workflow_type: WorkflowType::Ui,
				},
			)
			.await?;

		let result = sqlx::query("DELETE FROM repository WHERE project_id = ?")
			.bind(delete.project_id)
			.execute(&mut *conn)
			.await?;
		Ok(result.rows_affected())
	}
}

async fn fetch_matching(
	conn: &mut SqliteConnection,
	find: &RepositoryFind,
	limit: Option<i64>,
) -> Result<Vec<Repository>, DbError> {
	let filter = find.predicates();
	let mut sql = format!(
		"SELECT {REPOSITORY_COLUMNS} FROM repository WHERE {} ORDER BY id ASC",
		filter.render(1)
	);
	if let Some(limit) = limit {
		sql.push_str(&format!(" LIMIT {limit}"));
	}

	let rows = bind_values(sqlx::query(&sql), filter.values())
		.fetch_all(&mut *conn)
		.await?;
	rows.iter().map(row_to_repository).collect()
}

/// Commit on success, roll back on failure. A failed rollback is logged and
/// the original error is returned.
async fn finish<T>(tx: Transaction<'_, Sqlite>, result: Result<T, DbError>) -> Result<T, DbError> {
	match result {
		Ok(value) => {
			tx.commit().await?;
			Ok(value)
		}
		Err(e) => {
			if let Err(rollback_err) = tx.rollback().await {
				tracing::warn!(error = %rollback_err, "transaction rollback failed");
			}
			Err(e)
		}
	}
}

fn row_to_repository(row: &SqliteRow) -> Result<Repository, DbError> {
	Ok(Repository {
		id: row.try_get("id")?,
		creator_id: row.try_get("creator_id")?,
		created_ts: row.try_get("created_ts")?,
		updater_id: row.try_get("updater_id")?,
		updated_ts: row.try_get("updated_ts")?,
		vcs_id: row.try_get("vcs_id")?,
		project_id: row.try_get("project_id")?,
		name: row.try_get("name")?,
		full_path: row.try_get("full_path")?,
		web_url: row.try_get("web_url")?,
		branch_filter: row.try_get("branch_filter")?,
		base_directory: row.try_get("base_directory")?,
		file_path_template: row.try_get("file_path_template")?,
		schema_path_template: row.try_get("schema_path_template")?,
		external_id: row.try_get("external_id")?,
		external_webhook_id: row.try_get("external_webhook_id")?,
		webhook_url_host: row.try_get("webhook_url_host")?,
		webhook_endpoint_id: row.try_get("webhook_endpoint_id")?,
		webhook_secret_token: row.try_get::<String, _>("webhook_secret_token")?.into(),
		access_token: row.try_get::<String, _>("access_token")?.into(),
		expires_ts: row.try_get("expires_ts")?,
		refresh_token: row.try_get::<String, _>("refresh_token")?.into(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::project::{ProjectCreate, ProjectRepository};
	use crate::testing::create_test_pool;

	struct FailingWriter;

	#[async_trait]
	impl WorkflowModeWriter for FailingWriter {
		async fn set_workflow_type(
			&self,
			_conn: &mut SqliteConnection,
			_patch: &WorkflowTypePatch,
		) -> Result<(), DbError> {
			Err(DbError::Internal("workflow writer unavailable".to_string()))
		}
	}

	async fn setup() -> (SqlitePool, ProjectRepository, RepositoryService) {
		let pool = create_test_pool().await;
		let projects = ProjectRepository::new(pool.clone());
		let service = RepositoryService::new(pool.clone(), Arc::new(projects.clone()));
		(pool, projects, service)
	}

	async fn make_project(projects: &ProjectRepository, name: &str) -> i64 {
		projects
			.create_project(&ProjectCreate {
				creator_id: 1,
				name: name.to_string(),
				key: name.to_uppercase(),
			})
			.await
			.unwrap()
			.id
	}

	fn make_create(project_id: i64, vcs_id: i64, name: &str) -> RepositoryCreate {
		RepositoryCreate {
			creator_id: 10,
			vcs_id,
			project_id,
			name: name.to_string(),
			full_path: format!("org/{name}"),
			web_url: format!("https://gitlab.example.com/org/{name}"),
			branch_filter: "main".to_string(),
			base_directory: "db".to_string(),
			file_path_template: "{{ENV_NAME}}/{{DB_NAME}}__{{VERSION}}.sql".to_string(),
			schema_path_template: "{{ENV_NAME}}/.{{DB_NAME}}__LATEST.sql".to_string(),
			external_id: format!("ext-{name}"),
			external_webhook_id: format!("hook-{name}"),
			webhook_url_host: "https://strata.example.com".to_string(),
			webhook_endpoint_id: format!("ep-{name}"),
			webhook_secret_token: "whsec".into(),
			access_token: "t1".into(),
			expires_ts: 1_700_000_000,
			refresh_token: "r1".into(),
		}
	}

	fn assert_matches_create(repo: &Repository, create: &RepositoryCreate) {
		assert_eq!(repo.creator_id, create.creator_id);
		assert_eq!(repo.vcs_id, create.vcs_id);
		assert_eq!(repo.project_id, create.project_id);
		assert_eq!(repo.name, create.name);
		assert_eq!(repo.full_path, create.full_path);
		assert_eq!(repo.web_url, create.web_url);
		assert_eq!(repo.branch_filter, create.branch_filter);
		assert_eq!(repo.base_directory, create.base_directory);
		assert_eq!(repo.file_path_template, create.file_path_template);
		assert_eq!(repo.schema_path_template, create.schema_path_template);
		assert_eq!(repo.external_id, create.external_id);
		assert_eq!(repo.external_webhook_id, create.external_webhook_id);
		assert_eq!(repo.webhook_url_host, create.webhook_url_host);
		assert_eq!(repo.webhook_endpoint_id, create.webhook_endpoint_id);
		assert_eq!(repo.webhook_secret_token, create.webhook_secret_token);
		assert_eq!(repo.access_token, create.access_token);
		assert_eq!(repo.expires_ts, create.expires_ts);
		assert_eq!(repo.refresh_token, create.refresh_token);
	}

	async fn workflow_of(projects: &ProjectRepository, id: i64) -> WorkflowType {
		projects
			.get_project_by_id(id)
			.await
			.unwrap()
			.unwrap()
			.workflow_type
	}

	#[tokio::test]
	async fn test_create_sets_vcs_mode_and_assigns_audit_fields() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;

		let create = make_create(project_id, 3, "svc");
		let repo = service.create_repository(&create).await.unwrap();

		assert!(repo.id > 0);
		assert!(repo.created_ts > 0);
		assert_eq!(repo.created_ts, repo.updated_ts);
		assert_eq!(repo.updater_id, create.creator_id);
		assert_matches_create(&repo, &create);
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Vcs);

		let found = service
			.find_repository(&RepositoryFind {
				id: Some(repo.id),
				..Default::default()
			})
			.await
			.unwrap()
			.unwrap();
		assert_matches_create(&found, &create);
		assert_eq!(found, repo);

		let project = projects.get_project_by_id(project_id).await.unwrap().unwrap();
		assert_eq!(project.updater_id, 10);
	}

	#[tokio::test]
	async fn test_create_rejects_invalid_request() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;

		let mut create = make_create(project_id, 3, "svc");
		create.full_path = String::new();
		let err = service.create_repository(&create).await.unwrap_err();
		assert!(matches!(err, DbError::Validation(_)));

		let mut create = make_create(project_id, 3, "svc");
		create.vcs_id = 0;
		let err = service.create_repository(&create).await.unwrap_err();
		assert!(matches!(err, DbError::Validation(_)));

		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Ui);
	}

	#[tokio::test]
	async fn test_create_for_unknown_project_persists_nothing() {
		let (_pool, _projects, service) = setup().await;

		let err = service
			.create_repository(&make_create(99, 3, "svc"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));

		let all = service.list_repositories(&RepositoryFind::default()).await.unwrap();
		assert!(all.is_empty());
	}

	#[tokio::test]
	async fn test_second_repository_for_project_conflicts() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;

		service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap();
		let err = service
			.create_repository(&make_create(project_id, 4, "other"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));

		let all = service.list_repositories(&RepositoryFind::default()).await.unwrap();
		assert_eq!(all.len(), 1);
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Vcs);
	}

	#[tokio::test]
	async fn test_failing_writer_aborts_create() {
		let (pool, projects, _service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		let service = RepositoryService::new(pool, Arc::new(FailingWriter));

		let err = service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));

		let all = service.list_repositories(&RepositoryFind::default()).await.unwrap();
		assert!(all.is_empty());
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Ui);
	}

	#[tokio::test]
	async fn test_failed_insert_rolls_back_workflow_mode() {
		let (pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		sqlx::query("DROP TABLE repository")
			.execute(&pool)
			.await
			.unwrap();

		let err = service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Sqlx(_)));
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Ui);
	}

	#[tokio::test]
	async fn test_list_filters_are_conjunctive() {
		let (_pool, projects, service) = setup().await;
		let p1 = make_project(&projects, "a").await;
		let p2 = make_project(&projects, "b").await;
		let p3 = make_project(&projects, "c").await;

		let r1 = service.create_repository(&make_create(p1, 3, "a")).await.unwrap();
		let r2 = service.create_repository(&make_create(p2, 3, "b")).await.unwrap();
		let r3 = service.create_repository(&make_create(p3, 5, "c")).await.unwrap();

		let all = service.list_repositories(&RepositoryFind::default()).await.unwrap();
		assert_eq!(
			all.iter().map(|r| r.id).collect::<Vec<_>>(),
			vec![r1.id, r2.id, r3.id]
		);

		let by_vcs = service
			.list_repositories(&RepositoryFind {
				vcs_id: Some(3),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(by_vcs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![r1.id, r2.id]);

		let by_vcs_and_project = service
			.list_repositories(&RepositoryFind {
				vcs_id: Some(3),
				project_id: Some(p2),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(by_vcs_and_project, vec![r2.clone()]);

		let by_endpoint = service
			.list_repositories(&RepositoryFind {
				webhook_endpoint_id: Some("ep-c".to_string()),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(by_endpoint, vec![r3]);

		let none = service
			.list_repositories(&RepositoryFind {
				vcs_id: Some(5),
				project_id: Some(p1),
				..Default::default()
			})
			.await
			.unwrap();
		assert!(none.is_empty());
	}

	#[tokio::test]
	async fn test_find_repository_zero_one_many() {
		let (_pool, projects, service) = setup().await;
		let p1 = make_project(&projects, "a").await;
		let p2 = make_project(&projects, "b").await;

		let r1 = service.create_repository(&make_create(p1, 3, "a")).await.unwrap();
		service.create_repository(&make_create(p2, 3, "b")).await.unwrap();

		let found = service
			.find_repository(&RepositoryFind {
				id: Some(r1.id),
				..Default::default()
			})
			.await
			.unwrap();
		assert_eq!(found, Some(r1));

		let missing = service
			.find_repository(&RepositoryFind {
				vcs_id: Some(42),
				..Default::default()
			})
			.await
			.unwrap();
		assert!(missing.is_none());

		let err = service
			.find_repository(&RepositoryFind {
				vcs_id: Some(3),
				..Default::default()
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
		assert!(err.to_string().contains("2 or more repositories"));
	}

	#[tokio::test]
	async fn test_patch_changes_only_present_fields() {
		let (pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		let created = service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap();
		sqlx::query("UPDATE repository SET updated_ts = 0 WHERE id = ?")
			.bind(created.id)
			.execute(&pool)
			.await
			.unwrap();
		let before = Repository {
			updated_ts: 0,
			..created
		};

		let after = service
			.patch_repository(&RepositoryPatch {
				id: before.id,
				updater_id: 20,
				branch_filter: Some("release/*".to_string()),
				..Default::default()
			})
			.await
			.unwrap();

		assert_eq!(after.branch_filter, "release/*");
		assert_eq!(after.updater_id, 20);
		assert!(after.updated_ts > 0);
		assert_eq!(after.created_ts, before.created_ts);
		assert_eq!(
			Repository {
				branch_filter: before.branch_filter.clone(),
				updater_id: before.updater_id,
				updated_ts: before.updated_ts,
				..after.clone()
			},
			before
		);
	}

	#[tokio::test]
	async fn test_patch_tokens() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		let repo = service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap();

		let patched = service
			.patch_repository(&RepositoryPatch {
				id: repo.id,
				updater_id: 10,
				access_token: Some("t2".into()),
				refresh_token: Some("r2".into()),
				expires_ts: Some(1_800_000_000),
				..Default::default()
			})
			.await
			.unwrap();

		assert_eq!(patched.access_token.expose(), "t2");
		assert_eq!(patched.refresh_token.expose(), "r2");
		assert_eq!(patched.expires_ts, 1_800_000_000);
		assert_eq!(patched.webhook_secret_token.expose(), "whsec");
	}

	#[tokio::test]
	async fn test_patch_missing_repository_is_not_found() {
		let (_pool, _projects, service) = setup().await;

		let err = service
			.patch_repository(&RepositoryPatch {
				id: 404,
				updater_id: 1,
				branch_filter: Some("main".to_string()),
				..Default::default()
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn test_delete_restores_ui_mode() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap();

		service
			.delete_repository(&RepositoryDelete {
				project_id,
				deleter_id: 30,
			})
			.await
			.unwrap();

		let left = service
			.list_repositories(&RepositoryFind {
				project_id: Some(project_id),
				..Default::default()
			})
			.await
			.unwrap();
		assert!(left.is_empty());

		let project = projects.get_project_by_id(project_id).await.unwrap().unwrap();
		assert_eq!(project.workflow_type, WorkflowType::Ui);
		assert_eq!(project.updater_id, 30);
	}

	#[tokio::test]
	async fn test_delete_without_repository_still_sets_ui_mode() {
		let (_pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;

		service
			.delete_repository(&RepositoryDelete {
				project_id,
				deleter_id: 30,
			})
			.await
			.unwrap();
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Ui);
	}

	#[tokio::test]
	async fn test_failing_writer_keeps_repository_on_delete() {
		let (pool, projects, service) = setup().await;
		let project_id = make_project(&projects, "shop").await;
		service
			.create_repository(&make_create(project_id, 3, "svc"))
			.await
			.unwrap();

		let failing = RepositoryService::new(pool, Arc::new(FailingWriter));
		let err = failing
			.delete_repository(&RepositoryDelete {
				project_id,
				deleter_id: 30,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Internal(_)));

		let left = service.list_repositories(&RepositoryFind::default()).await.unwrap();
		assert_eq!(left.len(), 1);
		assert_eq!(workflow_of(&projects, project_id).await, WorkflowType::Vcs);
	}

	#[test]
	fn test_debug_output_redacts_tokens() {
		let create = make_create(1, 3, "svc");
		let debug = format!("{create:?}");
		assert!(!debug.contains("whsec"));
		assert!(!debug.contains("\"t1\""));
		assert!(!debug.contains("\"r1\""));
	}
}
