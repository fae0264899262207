mod item_repo;
mod order_repo;
mod patient_repo;
mod user_repo;

pub use item_repo::ItemRepository;
pub use order_repo::OrderRepository;
pub use patient_repo::PatientRepository;
pub use user_repo::UserRepository;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Open (creating if needed) the database at `path` and run migrations.
pub async fn init_db(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = %path.display(), "database ready");
    Ok(pool)
}

pub(crate) fn decode_error<E>(e: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(e.into())
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_id(value: &str) -> Result<uuid::Uuid, sqlx::Error> {
    uuid::Uuid::parse_str(value).map_err(decode_error)
}

pub(crate) fn to_json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn from_json_list(value: &str) -> Vec<String> {
    serde_json::from_str(value).unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::init_db;
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// A migrated database living in a temp dir for the duration of a test.
    pub struct TestDb {
        pub pool: SqlitePool,
        _temp_dir: TempDir,
    }

    pub async fn test_db() -> TestDb {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        TestDb {
            pool,
            _temp_dir: temp_dir,
        }
    }
}
