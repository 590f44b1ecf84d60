use tracing::{debug, info};

use crate::db::SearchRecordStore;
use crate::services::planning_service::SearchError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub keys: usize,
    pub removed: u64,
}

/// Keeps the newest `keep` snapshots for every filter key and deletes the rest.
///
/// Searches never call this; history is only trimmed on request.
pub async fn prune_history(
    store: &dyn SearchRecordStore,
    keep: u32,
) -> Result<PruneSummary, SearchError> {
    let keys = store.filter_keys().await?;
    let mut summary = PruneSummary {
        keys: keys.len(),
        removed: 0,
    };

    for key in &keys {
        let removed = store.prune(key, u64::from(keep)).await?;
        if removed > 0 {
            debug!(filter_key = %key, removed, "Pruned search snapshots");
        }
        summary.removed += removed;
    }

    info!(
        keys = summary.keys,
        removed = summary.removed,
        keep,
        "Search history pruned"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::domain::FilterType;
    use crate::models::PlanningEntity;

    fn entity(id: &str) -> PlanningEntity {
        PlanningEntity {
            id: id.to_string(),
            name: id.to_string(),
            site_address: String::new(),
            postcode: String::new(),
            local_authority: String::new(),
            description: String::new(),
            url: String::new(),
            start_date: String::new(),
            end_date: None,
            applicant: None,
            raw: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn prunes_each_key_independently() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let a = FilterType::Postcode.normalize("E1 6AN").unwrap();
        let b = FilterType::LocalAuthority.normalize("Camden").unwrap();

        for i in 0..3 {
            store
                .append(&a, FilterType::Postcode, &[entity(&format!("a{i}"))])
                .await
                .unwrap();
        }
        store
            .append(&b, FilterType::LocalAuthority, &[entity("b0")])
            .await
            .unwrap();

        let summary = prune_history(&store, 1).await.unwrap();
        assert_eq!(summary, PruneSummary { keys: 2, removed: 2 });

        let latest = store.latest(&a).await.unwrap().unwrap();
        assert_eq!(latest.results[0].id, "a2");
        assert_eq!(store.count_searches(&a).await.unwrap(), 1);
        assert_eq!(store.count_searches(&b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_store_is_a_no_op() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let summary = prune_history(&store, 5).await.unwrap();
        assert_eq!(summary, PruneSummary::default());
    }
}
