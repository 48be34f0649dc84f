// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migration Command
//!
//! `turcrm migrate` applies the embedded SQL migrations to the PostgreSQL
//! database named by `spec.database.url` (or `TURCRM_DATABASE_URL`).
//!
//! ```bash
//! # Apply all pending migrations
//! turcrm migrate
//!
//! # Preview migrations without applying
//! turcrm migrate --dry-run
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sqlx::PgPool;
use std::path::PathBuf;
use tracing::info;

use turcrm_core::domain::crm_config::CrmConfigManifest;
use turcrm_core::domain::repository::StorageBackend;
use turcrm_core::infrastructure::db::Database;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Args)]
pub struct MigrateCommand {
    /// List pending migrations without applying them
    #[arg(long)]
    pub dry_run: bool,
}

/// Apply every pending migration; used by `serve` when `run_migrations` is set
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR.run(pool).await.context("Failed to apply migrations")?;
    info!("Database schema is up to date");
    Ok(())
}

async fn applied_count(pool: &PgPool) -> usize {
    // The bookkeeping table does not exist before the first run
    sqlx::query("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(pool)
        .await
        .map(|rows| rows.len())
        .unwrap_or(0)
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "TurCRM Migrate".bold().green());

    let config = CrmConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    let pg = match config.storage_backend()? {
        StorageBackend::PostgreSQL(pg) => pg,
        StorageBackend::InMemory => {
            anyhow::bail!("spec.database.backend is 'memory'; set TURCRM_DATABASE_URL or configure postgres")
        }
    };

    println!("Connecting to database...");
    let database = Database::new(&pg).await?;
    let pool = database.get_pool();

    let applied = applied_count(pool).await;
    let total = MIGRATOR.iter().count();
    println!("Migration status: {} applied, {} total available.", applied, total);

    if applied >= total {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations (dry run):");
        for migration in MIGRATOR.iter().skip(applied) {
            println!(" - {} {}", migration.version, migration.description);
        }
        return Ok(());
    }

    println!("Applying pending migrations...");
    run_migrations(pool).await?;
    println!("{}", "✓ Database updated successfully.".green());
    Ok(())
}
