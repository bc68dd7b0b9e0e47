use bv_core::Error as CoreError;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Opens (creating if absent) the SQLite file at `path`, runs migrations,
/// and returns a pooled connection manager, mirroring the teacher's
/// `establish_connection` but returning a pool instead of a bare
/// connection since the store is accessed from a blocking-task pool.
pub fn establish_pool(path: &str) -> Result<DbPool, CoreError> {
  // SQLite's `:memory:` database is private to the connection that opened
  // it; a pool of more than one connection would each see an empty,
  // independent database. Cap the pool at one connection in that case so
  // in-memory stores behave like a single persistent handle.
  let max_size = if path == ":memory:" { 1 } else { 4 };

  let manager = ConnectionManager::<SqliteConnection>::new(path);
  let pool = Pool::builder()
    .max_size(max_size)
    .build(manager)
    .map_err(|e| CoreError::Store(format!("failed to build connection pool: {e}")))?;

  let mut conn = pool
    .get()
    .map_err(|e| CoreError::Store(format!("failed to acquire connection: {e}")))?;

  conn
    .batch_execute("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
    .map_err(|e| CoreError::Store(format!("failed to set pragmas: {e}")))?;

  check_integrity(&mut conn, path)?;

  conn
    .run_pending_migrations(MIGRATIONS)
    .map_err(|e| CoreError::Store(format!("failed to run migrations: {e}")))?;

  Ok(pool)
}

/// Runs `PRAGMA integrity_check` and maps a non-`ok` result to
/// `Error::StoreCorruption`. A brand-new file always passes this check.
fn check_integrity(conn: &mut SqliteConnection, path: &str) -> Result<(), CoreError> {
  let result: String = diesel::sql_query("PRAGMA integrity_check")
    .get_result::<IntegrityCheckRow>(conn)
    .map(|row| row.integrity_check)
    .map_err(|e| CoreError::Store(format!("integrity check query failed: {e}")))?;

  if result == "ok" {
    Ok(())
  } else {
    Err(CoreError::StoreCorruption {
      path: path.to_string(),
      hint: format!("PRAGMA integrity_check reported {result:?}; delete the file and re-fetch"),
    })
  }
}

#[derive(diesel::QueryableByName)]
struct IntegrityCheckRow {
  #[diesel(sql_type = diesel::sql_types::Text)]
  integrity_check: String,
}
