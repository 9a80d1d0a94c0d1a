use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::{Row, SqlitePool};

use project_desk::authz::PlatformRole;
use project_desk::db;
use project_desk::models::user::normalize_email;
use project_desk::store::users;

#[derive(Parser, Debug)]
#[command(author, version, about = "project-desk admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Set the platform role of an existing account (member or platform_admin)
    SetPlatformRole { email: String, role: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The binary CWD may differ inside containers; fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::SetPlatformRole { email, role } => {
            let role = PlatformRole::parse_strict(&role)
                .with_context(|| format!("unknown platform role `{role}`; use member or platform_admin"))?;
            let email = normalize_email(&email)?;

            let pool = get_pool().await?;
            let updated = users::set_platform_role(&pool, &email, role).await?;
            if updated == 0 {
                anyhow::bail!("no profile found for {email}");
            }
            println!("{email} is now {}", role.as_str());
        }
    }

    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let filename = format!("{}_{}.sql", timestamp, sanitize_name(name));
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    db::connect(&database_url).await
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // If the migrations table doesn't exist, nothing is applied yet
    let table = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;

    let applied_versions: HashSet<i64> = if table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} Name", "Status", "Version");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations when run from the repo root, else the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", display))
}
