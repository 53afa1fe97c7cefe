// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Plain-text tables for the admin subcommands.

use std::fmt::Write;

use strata_plan_core::{FeatureType, PlanType};
use strata_server_db::Repository;

/// Render the feature matrix. With `plan`, list only that plan's column.
pub fn feature_table(plan: Option<PlanType>) -> String {
	let plans: Vec<PlanType> = match plan {
		Some(plan) => vec![plan],
		None => PlanType::ALL.to_vec(),
	};

	let mut out = format!("{:<32}", "FEATURE");
	for plan in &plans {
		let _ = write!(out, " {:<10}", plan.as_str());
	}
	out.push('\n');

	for feature in FeatureType::all() {
		let _ = write!(out, "{:<32}", feature.as_str());
		for plan in &plans {
			let mark = if feature.is_enabled(*plan) { "yes" } else { "-" };
			let _ = write!(out, " {:<10}", mark);
		}
		out.push('\n');
	}
	out
}

/// Render repositories, one per line. Tokens are never printed.
pub fn repository_table(repositories: &[Repository]) -> String {
	if repositories.is_empty() {
		return "no repositories\n".to_string();
	}

	let mut out = format!(
		"{:<6} {:<8} {:<8} {:<16} {}\n",
		"ID", "PROJECT", "VCS", "BRANCH", "FULL PATH"
	);
	for repo in repositories {
		let _ = writeln!(
			out,
			"{:<6} {:<8} {:<8} {:<16} {}",
			repo.id, repo.project_id, repo.vcs_id, repo.branch_filter, repo.full_path
		);
	}
	out
}
