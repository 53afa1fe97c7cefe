// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Strata admin binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use strata_plan_core::PlanType;
use strata_server_db::{
	create_pool, run_migrations, ProjectRepository, RepositoryFind, RepositoryService,
	RepositoryStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;
mod version;

/// Strata server - VCS-linked repository administration.
#[derive(Parser, Debug)]
#[command(name = "strata-server", about = "Strata repository administration", version)]
struct Args {
	/// Config file to use instead of /etc/strata/server.toml
	#[arg(long, global = true, env = "STRATA_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
	/// Apply database migrations
	Migrate,
	/// List repositories
	Repos {
		#[arg(long)]
		project_id: Option<i64>,
		#[arg(long)]
		vcs_id: Option<i64>,
	},
	/// Show which features each plan includes
	Features {
		/// FREE, TEAM or ENTERPRISE
		#[arg(long)]
		plan: Option<PlanType>,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Subcommands that need neither config nor database
	match args.command {
		Command::Version => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Command::Features { plan } => {
			print!("{}", render::feature_table(plan));
			return Ok(());
		}
		_ => {}
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => strata_server_config::load_config_with_file(path)?,
		None => strata_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(database = %config.database.url, "starting strata-server");

	let pool = create_pool(&config.database.url, config.database.max_connections).await?;
	run_migrations(&pool).await?;

	match args.command {
		Command::Migrate => {
			tracing::info!("migrations applied");
		}
		Command::Repos { project_id, vcs_id } => {
			let projects = ProjectRepository::new(pool.clone());
			let repositories = RepositoryService::new(pool.clone(), Arc::new(projects));
			let found = repositories
				.list_repositories(&RepositoryFind {
					project_id,
					vcs_id,
					..Default::default()
				})
				.await?;
			print!("{}", render::repository_table(&found));
		}
		Command::Version | Command::Features { .. } => {}
	}

	pool.close().await;
	Ok(())
}
