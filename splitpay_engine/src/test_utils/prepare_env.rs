use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh, migrated database at `url`.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
}

/// A throwaway SQLite file in the system temp directory.
pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/splitpay_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 1).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db.pool().close().await;
    info!("🚀️ Migrations complete");
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🚀️ Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("🚀️ Created Sqlite database {url}");
}

/// Deletes the database file, along with the WAL and shared memory files.
pub async fn drop_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
    if let Some(path) = url.strip_prefix("sqlite://") {
        for suffix in ["-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{path}{suffix}"));
        }
    }
}
