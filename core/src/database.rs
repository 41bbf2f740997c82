// ABOUTME: SQLite-backed persistence for membership state
// ABOUTME: Pool setup plus the name-keyed migration ledger

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Executor, SqlitePool};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    /// Open (or create) the state database at `path`.
    ///
    /// There is no degraded mode: a failure here means the process cannot
    /// safely continue and the caller is expected to exit.
    pub async fn new(path: &Path) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }
}

/// A named schema migration, embedded in the binary.
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations shipped with this build. Names carry a sortable prefix;
/// application order is lexicographic by name.
pub const MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_create_members.sql",
    sql: include_str!("../migrations/0001_create_members.sql"),
}];

/// Apply every migration not yet recorded in the ledger.
///
/// Each pending migration executes together with its ledger insert in one
/// transaction, so a migration name is recorded iff its statements ran.
/// Already-recorded names are skipped.
pub async fn apply_migrations(
    pool: &SqlitePool,
    migrations: &[Migration],
) -> Result<(), DatabaseError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (id INTEGER NOT NULL PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
    )
    .execute(pool)
    .await?;

    let mut ordered: Vec<&Migration> = migrations.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(b.name));

    for migration in ordered {
        let applied: Option<i64> = sqlx::query_scalar("SELECT 1 FROM migrations WHERE name = ?1")
            .bind(migration.name)
            .fetch_optional(pool)
            .await?;
        if applied.is_some() {
            continue;
        }

        tracing::info!(name = migration.name, "applying migration");
        let mut tx = pool.begin().await?;
        (&mut *tx)
            .execute(migration.sql)
            .await
            .map_err(|source| DatabaseError::Migration {
                name: migration.name,
                source,
            })?;
        sqlx::query("INSERT INTO migrations (name) VALUES (?1)")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(name = migration.name, "migration applied");
    }

    Ok(())
}
