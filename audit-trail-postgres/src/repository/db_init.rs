//! Audit schema setup and teardown
//!
//! Executes the SQL files of `migrations/` (ascending) or `cleanup/`
//! (descending) for deployments that do not run `sqlx migrate`.

use sqlx::PgPool;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Create the audit tables by executing migration files in ascending order
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use audit_trail_postgres::repository::db_init::init_database;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// init_database(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn init_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    execute_sql_files_in_order(pool, &migrations_dir, true).await
}

/// Drop the audit tables by executing cleanup files in descending order
///
/// # Example
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use audit_trail_postgres::repository::db_init::cleanup_database;
///
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// cleanup_database(pool).await?;
/// # Ok(())
/// # }
/// ```
pub async fn cleanup_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    let cleanup_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("cleanup");
    execute_sql_files_in_order(pool, &cleanup_dir, false).await
}

/// Execute SQL files from a directory in the specified order
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `dir` - Directory containing SQL files
/// * `ascending` - If true, execute in ascending order; if false, in descending order
async fn execute_sql_files_in_order(
    pool: &PgPool,
    dir: &Path,
    ascending: bool,
) -> Result<(), sqlx::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(sqlx::Error::Io)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.path().extension().and_then(|s| s.to_str()) == Some("sql")
        })
        .collect();

    entries.sort_by(|a, b| {
        let ordering = a.file_name().cmp(&b.file_name());
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });

    for entry in entries {
        let path = entry.path();
        let sql = fs::read_to_string(&path).map_err(sqlx::Error::Io)?;
        debug!(file = %path.display(), "Executing schema script");
        sqlx::raw_sql(&sql).execute(pool).await?;
    }

    Ok(())
}
