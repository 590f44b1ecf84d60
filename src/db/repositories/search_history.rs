use crate::domain::{FilterKey, FilterType};
use crate::entities::{planning_searches, prelude::*};
use crate::models::{PlanningEntity, SearchRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::debug;

/// Append-only log of search snapshots, partitioned by filter key.
pub struct SearchHistoryRepository {
    conn: DatabaseConnection,
}

impl SearchHistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: planning_searches::Model) -> Result<SearchRecord> {
        let results: Vec<PlanningEntity> = serde_json::from_str(&m.results_json)
            .with_context(|| format!("Corrupt snapshot in planning_searches row {}", m.id))?;
        let filter_type: FilterType = m.filter_type.parse()?;
        let created_at = DateTime::parse_from_rfc3339(&m.created_at)
            .with_context(|| format!("Bad created_at in planning_searches row {}", m.id))?
            .with_timezone(&Utc);

        Ok(SearchRecord {
            id: m.id,
            filter_key: FilterKey::from_normalized(m.filter_key),
            filter_type,
            results,
            created_at,
        })
    }

    /// Most recent snapshot for the key; ties on `created_at` go to the later row.
    pub async fn latest(&self, key: &FilterKey) -> Result<Option<SearchRecord>> {
        let row = PlanningSearches::find()
            .filter(planning_searches::Column::FilterKey.eq(key.as_str()))
            .order_by_desc(planning_searches::Column::CreatedAt)
            .order_by_desc(planning_searches::Column::Id)
            .one(&self.conn)
            .await?;

        row.map(Self::map_model).transpose()
    }

    pub async fn append(
        &self,
        key: &FilterKey,
        filter_type: FilterType,
        results: &[PlanningEntity],
    ) -> Result<SearchRecord> {
        let results_json = serde_json::to_string(results)?;
        let created_at = Utc::now().trunc_subsecs(6);

        let active_model = planning_searches::ActiveModel {
            filter_key: Set(key.as_str().to_string()),
            filter_type: Set(filter_type.as_str().to_string()),
            results_json: Set(results_json),
            created_at: Set(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
            ..Default::default()
        };

        let res = PlanningSearches::insert(active_model)
            .exec(&self.conn)
            .await?;

        debug!(
            filter_key = %key,
            id = res.last_insert_id,
            results = results.len(),
            "Stored search snapshot"
        );

        Ok(SearchRecord {
            id: res.last_insert_id,
            filter_key: key.clone(),
            filter_type,
            results: results.to_vec(),
            created_at,
        })
    }

    /// Snapshots for the key, newest first.
    pub async fn history(&self, key: &FilterKey, limit: u64) -> Result<Vec<SearchRecord>> {
        let rows = PlanningSearches::find()
            .filter(planning_searches::Column::FilterKey.eq(key.as_str()))
            .order_by_desc(planning_searches::Column::CreatedAt)
            .order_by_desc(planning_searches::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await?;

        rows.into_iter().map(Self::map_model).collect()
    }

    pub async fn count(&self, key: &FilterKey) -> Result<u64> {
        let count = PlanningSearches::find()
            .filter(planning_searches::Column::FilterKey.eq(key.as_str()))
            .count(&self.conn)
            .await?;
        Ok(count)
    }

    pub async fn filter_keys(&self) -> Result<Vec<FilterKey>> {
        let keys: Vec<String> = PlanningSearches::find()
            .select_only()
            .column(planning_searches::Column::FilterKey)
            .distinct()
            .order_by_asc(planning_searches::Column::FilterKey)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(keys.into_iter().map(FilterKey::from_normalized).collect())
    }

    /// Deletes all but the newest `keep` snapshots for the key.
    pub async fn prune(&self, key: &FilterKey, keep: u64) -> Result<u64> {
        let keep_ids: Vec<i32> = PlanningSearches::find()
            .select_only()
            .column(planning_searches::Column::Id)
            .filter(planning_searches::Column::FilterKey.eq(key.as_str()))
            .order_by_desc(planning_searches::Column::CreatedAt)
            .order_by_desc(planning_searches::Column::Id)
            .limit(keep)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut delete = PlanningSearches::delete_many()
            .filter(planning_searches::Column::FilterKey.eq(key.as_str()));
        if !keep_ids.is_empty() {
            delete = delete.filter(planning_searches::Column::Id.is_not_in(keep_ids));
        }

        let res = delete.exec(&self.conn).await?;
        Ok(res.rows_affected)
    }
}
