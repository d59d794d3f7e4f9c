/// Embedded database migration runner
///
/// Migrations live in `migrations/` at the workspace root as
/// `{version}_{name}.up.sql` / `{version}_{name}.down.sql` pairs and are
/// compiled into the binary with `sqlx::migrate!`. They run at process
/// start, before the server begins accepting requests.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration is malformed or fails to apply; the
/// failing migration is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");

    match sqlx::migrate!("../migrations").run(pool).await {
        Ok(()) => {
            info!("database migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!("migration failed: {}", e);
            Err(e)
        }
    }
}
