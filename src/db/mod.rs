use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub async fn init() -> anyhow::Result<SqlitePool> {
	let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
	let pool = connect(&database_url).await?;

	sqlx::migrate!()
		.run(&pool)
		.await
		.context("failed to run migrations")?;

	Ok(pool)
}

/// Opens a pool with foreign keys enforced; member and task cascades rely on it.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.context("invalid DATABASE_URL")?
		.create_if_missing(true)
		.foreign_keys(true);

	SqlitePoolOptions::new()
		.max_connections(10)
		.min_connections(1)
		.acquire_timeout(Duration::from_secs(10))
		.connect_with(options)
		.await
		.context("failed to connect to database")
}
