// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
	#[error("unknown plan type: {0}")]
	UnknownPlan(String),

	#[error("unknown feature: {0}")]
	UnknownFeature(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
