// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Subscription tier. Ordered from least to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
	Free,
	Team,
	Enterprise,
}

impl PlanType {
	pub const ALL: [PlanType; 3] = [PlanType::Free, PlanType::Team, PlanType::Enterprise];

	/// Column of this plan in [`crate::FEATURE_MATRIX`].
	pub fn index(self) -> usize {
		match self {
			PlanType::Free => 0,
			PlanType::Team => 1,
			PlanType::Enterprise => 2,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			PlanType::Free => "FREE",
			PlanType::Team => "TEAM",
			PlanType::Enterprise => "ENTERPRISE",
		}
	}
}

impl fmt::Display for PlanType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PlanType {
	type Err = PlanError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"FREE" => Ok(PlanType::Free),
			"TEAM" => Ok(PlanType::Team),
			"ENTERPRISE" => Ok(PlanType::Enterprise),
			_ => Err(PlanError::UnknownPlan(s.to_string())),
		}
	}
}

/// The workspace's current subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
	#[serde(rename = "type")]
	pub plan_type: PlanType,
}

/// Request to switch the workspace to another plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPatch {
	#[serde(rename = "type")]
	pub plan_type: PlanType,
}

impl Plan {
	pub fn apply(&mut self, patch: PlanPatch) {
		self.plan_type = patch.plan_type;
	}
}
