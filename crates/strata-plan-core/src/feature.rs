// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Feature identifiers and the plan entitlement matrix.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::plan::PlanType;

/// A gated capability. Serialized as its `bb.feature.*` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
	/// DDL backward-compatibility checks before a migration runs.
	#[serde(rename = "bb.feature.backward-compatibility")]
	BackwardCompatibility,
	/// Detect schema drift between recorded and live schema.
	#[serde(rename = "bb.feature.schema-drift")]
	SchemaDrift,
	/// Run a task at a scheduled time.
	#[serde(rename = "bb.feature.task-schedule-time")]
	TaskScheduleTime,
	/// Tenant mode: track a homogeneous change across many databases.
	#[serde(rename = "bb.feature.multi-tenancy")]
	MultiTenancy,
	/// Instances are managed by DBAs only; developers see databases.
	#[serde(rename = "bb.feature.dba-workflow")]
	DbaWorkflow,
	/// Multiple data sources per instance. Not exposed on any plan.
	#[serde(rename = "bb.feature.data-source")]
	DataSource,
	/// Per-environment approval policy.
	#[serde(rename = "bb.feature.approval-policy")]
	ApprovalPolicy,
	/// Per-environment backup policy.
	#[serde(rename = "bb.feature.backup-policy")]
	BackupPolicy,
	/// Workspace and project level RBAC.
	#[serde(rename = "bb.feature.rbac")]
	Rbac,
	/// Login through an external identity provider.
	#[serde(rename = "bb.feature.3rd-party-login")]
	ThirdPartyLogin,
}

/// Entitlements per feature, indexed by [`PlanType::index`] (FREE, TEAM, ENTERPRISE).
pub const FEATURE_MATRIX: [(FeatureType, [bool; 3]); 10] = [
	(FeatureType::BackwardCompatibility, [false, true, true]),
	(FeatureType::SchemaDrift, [false, true, true]),
	(FeatureType::TaskScheduleTime, [false, true, true]),
	(FeatureType::MultiTenancy, [false, true, true]),
	(FeatureType::DbaWorkflow, [false, false, true]),
	(FeatureType::DataSource, [false, false, false]),
	(FeatureType::ApprovalPolicy, [false, true, true]),
	(FeatureType::BackupPolicy, [false, true, true]),
	(FeatureType::Rbac, [false, true, true]),
	(FeatureType::ThirdPartyLogin, [false, true, true]),
];

impl FeatureType {
	pub fn all() -> impl Iterator<Item = FeatureType> {
		FEATURE_MATRIX.iter().map(|(feature, _)| *feature)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			FeatureType::BackwardCompatibility => "bb.feature.backward-compatibility",
			FeatureType::SchemaDrift => "bb.feature.schema-drift",
			FeatureType::TaskScheduleTime => "bb.feature.task-schedule-time",
			FeatureType::MultiTenancy => "bb.feature.multi-tenancy",
			FeatureType::DbaWorkflow => "bb.feature.dba-workflow",
			FeatureType::DataSource => "bb.feature.data-source",
			FeatureType::ApprovalPolicy => "bb.feature.approval-policy",
			FeatureType::BackupPolicy => "bb.feature.backup-policy",
			FeatureType::Rbac => "bb.feature.rbac",
			FeatureType::ThirdPartyLogin => "bb.feature.3rd-party-login",
		}
	}

	/// Human readable name for UI and error messages.
	pub fn name(self) -> &'static str {
		match self {
			FeatureType::BackwardCompatibility => "Backward compatibility",
			FeatureType::SchemaDrift => "Schema drift",
			FeatureType::TaskScheduleTime => "Task schedule time",
			FeatureType::MultiTenancy => "Multi-tenancy",
			FeatureType::DbaWorkflow => "DBA workflow",
			FeatureType::DataSource => "Data source",
			FeatureType::ApprovalPolicy => "Approval policy",
			FeatureType::BackupPolicy => "Backup policy",
			FeatureType::Rbac => "RBAC",
			FeatureType::ThirdPartyLogin => "3rd party login",
		}
	}

	/// Row of [`FEATURE_MATRIX`] for this feature.
	pub fn entitlements(self) -> [bool; 3] {
		FEATURE_MATRIX
			.iter()
			.find(|(feature, _)| *feature == self)
			.map(|(_, plans)| *plans)
			.unwrap_or([false; 3])
	}

	pub fn is_enabled(self, plan: PlanType) -> bool {
		self.entitlements()[plan.index()]
	}

	/// Cheapest plan that enables the feature. Features no plan enables report ENTERPRISE.
	pub fn minimum_supported_plan(self) -> PlanType {
		PlanType::ALL
			.into_iter()
			.find(|plan| self.is_enabled(*plan))
			.unwrap_or(PlanType::Enterprise)
	}

	pub fn access_error_message(self) -> String {
		format!(
			"{} is a {} feature, please upgrade to access it.",
			self.name(),
			self.minimum_supported_plan()
		)
	}
}

impl fmt::Display for FeatureType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FeatureType {
	type Err = PlanError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		FeatureType::all()
			.find(|feature| feature.as_str() == s)
			.ok_or_else(|| PlanError::UnknownFeature(s.to_string()))
	}
}
