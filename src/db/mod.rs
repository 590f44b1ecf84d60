use crate::domain::{FilterKey, FilterType};
use crate::models::{PlanningEntity, SearchRecord};
use crate::services::planning_service::SearchError;
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Persistence seam for search snapshots.
///
/// Implementations must tolerate concurrent reads and appends; each append
/// is independent and nothing is ever overwritten.
#[async_trait::async_trait]
pub trait SearchRecordStore: Send + Sync {
    /// Most recent snapshot for the key, if any.
    async fn latest(&self, key: &FilterKey) -> Result<Option<SearchRecord>, SearchError>;

    /// Appends a new snapshot stamped with the current time.
    async fn append(
        &self,
        key: &FilterKey,
        filter_type: FilterType,
        results: &[PlanningEntity],
    ) -> Result<SearchRecord, SearchError>;

    /// Snapshots for the key, newest first.
    async fn history(&self, key: &FilterKey, limit: u64) -> Result<Vec<SearchRecord>, SearchError>;

    /// Every key that has at least one snapshot.
    async fn filter_keys(&self) -> Result<Vec<FilterKey>, SearchError>;

    /// Deletes all but the newest `keep` snapshots for the key.
    async fn prune(&self, key: &FilterKey, keep: u64) -> Result<u64, SearchError>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn history_repo(&self) -> repositories::search_history::SearchHistoryRepository {
        repositories::search_history::SearchHistoryRepository::new(self.conn.clone())
    }

    pub async fn count_searches(&self, key: &FilterKey) -> Result<u64> {
        self.history_repo().count(key).await
    }
}

fn cache_err(err: &anyhow::Error) -> SearchError {
    SearchError::CacheUnavailable(format!("{err:#}"))
}

#[async_trait::async_trait]
impl SearchRecordStore for Store {
    async fn latest(&self, key: &FilterKey) -> Result<Option<SearchRecord>, SearchError> {
        self.history_repo().latest(key).await.map_err(|e| cache_err(&e))
    }

    async fn append(
        &self,
        key: &FilterKey,
        filter_type: FilterType,
        results: &[PlanningEntity],
    ) -> Result<SearchRecord, SearchError> {
        self.history_repo()
            .append(key, filter_type, results)
            .await
            .map_err(|e| cache_err(&e))
    }

    async fn history(&self, key: &FilterKey, limit: u64) -> Result<Vec<SearchRecord>, SearchError> {
        self.history_repo()
            .history(key, limit)
            .await
            .map_err(|e| cache_err(&e))
    }

    async fn filter_keys(&self) -> Result<Vec<FilterKey>, SearchError> {
        self.history_repo()
            .filter_keys()
            .await
            .map_err(|e| cache_err(&e))
    }

    async fn prune(&self, key: &FilterKey, keep: u64) -> Result<u64, SearchError> {
        self.history_repo()
            .prune(key, keep)
            .await
            .map_err(|e| cache_err(&e))
    }
}
