// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subscription plans and feature entitlements.
//!
//! The entitlement matrix is compiled into the binary as a `const` table and
//! has no mutation path; services only ever read it.
//!
//! ```
//! use strata_plan_core::{FeatureType, PlanType};
//!
//! assert!(!FeatureType::SchemaDrift.is_enabled(PlanType::Free));
//! assert!(FeatureType::SchemaDrift.is_enabled(PlanType::Team));
//! assert_eq!(FeatureType::DbaWorkflow.minimum_supported_plan(), PlanType::Enterprise);
//! ```

pub mod error;
pub mod feature;
pub mod plan;

pub use error::{PlanError, Result};
pub use feature::{FeatureType, FEATURE_MATRIX};
pub use plan::{Plan, PlanPatch, PlanType};
