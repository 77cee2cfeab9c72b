/// Database migration runner
///
/// This module provides utilities for running and managing database
/// migrations using sqlx's migration system.
///
/// # Migration Files
///
/// Migrations are stored in the `migrations/` directory at the workspace
/// root. Each migration is a `{timestamp}_{name}.sql` file applied exactly
/// once, in order.
///
/// # Example
///
/// ```no_run
/// use trousseau_shared::db::pool::{create_pool, DatabaseConfig};
/// use trousseau_shared::db::migrations::{run_migrations, get_migration_status};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///
///     run_migrations(&pool).await?;
///
///     let status = get_migration_status(&pool).await?;
///     println!("Applied {} migrations", status.applied_migrations);
///
///     Ok(())
/// }
/// ```

use sqlx::{migrate::MigrateDatabase, mysql::MySqlPool, MySql};
use tracing::{debug, info, warn};

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp)
    pub latest_version: Option<i64>,
}

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if:
/// - A migration file is malformed
/// - A migration fails to execute
/// - Database connection is lost during migration
pub async fn run_migrations(pool: &MySqlPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Gets the current migration status
///
/// Returns the number of applied migrations and the latest applied version.
///
/// # Errors
///
/// Returns an error if the migrations table cannot be queried
pub async fn get_migration_status(pool: &MySqlPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)
         FROM information_schema.tables
         WHERE table_schema = DATABASE()
           AND table_name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    if table_exists == 0 {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version)
         FROM _sqlx_migrations
         WHERE success = TRUE",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(MigrationStatus {
        applied_migrations: count as usize,
        latest_version,
    })
}

/// Creates the database if it doesn't exist
///
/// Useful for development and testing. In production the database should
/// already exist.
///
/// # Errors
///
/// Returns an error if the server is unreachable or creation is not permitted
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    info!("Checking if database exists");

    if !MySql::database_exists(database_url).await? {
        info!("Database does not exist, creating it");
        MySql::create_database(database_url).await?;
        info!("Database created successfully");
    } else {
        debug!("Database already exists");
    }

    Ok(())
}

/// Drops the database (USE WITH CAUTION!)
///
/// # Safety
///
/// This PERMANENTLY DELETES ALL DATA. Only for development and test
/// environments, never production.
pub async fn drop_database(database_url: &str) -> Result<(), sqlx::Error> {
    warn!("Dropping database: {}", database_url);

    if MySql::database_exists(database_url).await? {
        MySql::drop_database(database_url).await?;
        info!("Database dropped successfully");
    } else {
        debug!("Database does not exist, nothing to drop");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_status_clone() {
        let status = MigrationStatus {
            applied_migrations: 1,
            latest_version: Some(20240110000000),
        };

        let cloned = status.clone();
        assert_eq!(status.applied_migrations, cloned.applied_migrations);
        assert_eq!(status.latest_version, cloned.latest_version);
    }

    // Integration tests require a running database
    // These are in the tests/ directory
}
