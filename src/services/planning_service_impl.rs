//! Registry-backed implementation of the `PlanningService` trait.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;

use crate::clients::{Notifier, RegistryClient};
use crate::db::SearchRecordStore;
use crate::models::{DeltaResult, PlanningEntity, SearchRecord, WebhookPayload};
use crate::services::delta::compute_delta;
use crate::services::planning_service::{
    PlanningService, SearchError, SearchFilter, SearchRequest, parse_webhook_url,
};

pub struct DefaultPlanningService {
    registry: Arc<dyn RegistryClient>,
    store: Arc<dyn SearchRecordStore>,
    notifier: Arc<dyn Notifier>,
    max_limit: u32,
    freshness: Duration,
    webhooks: Mutex<JoinSet<()>>,
}

impl DefaultPlanningService {
    #[must_use]
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        store: Arc<dyn SearchRecordStore>,
        notifier: Arc<dyn Notifier>,
        max_limit: u32,
    ) -> Self {
        Self {
            registry,
            store,
            notifier,
            max_limit,
            freshness: Duration::zero(),
            webhooks: Mutex::new(JoinSet::new()),
        }
    }

    /// Serves snapshots younger than `seconds` without calling the registry.
    #[must_use]
    pub fn with_freshness_seconds(mut self, seconds: u64) -> Self {
        self.freshness = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(Duration::zero);
        self
    }

    async fn fresh_snapshot(&self, filter: &SearchFilter) -> Option<SearchRecord> {
        if self.freshness <= Duration::zero() {
            return None;
        }

        match self.store.latest(&filter.key).await {
            Ok(Some(record)) if Utc::now() - record.created_at < self.freshness => Some(record),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Freshness lookup failed, fetching live");
                None
            }
        }
    }

    /// Previous results for the key. A failed read counts as "no baseline".
    async fn baseline(
        &self,
        filter: &SearchFilter,
        warnings: &mut Vec<String>,
    ) -> Vec<PlanningEntity> {
        match self.store.latest(&filter.key).await {
            Ok(Some(record)) => record.results,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read previous snapshot, treating search as first");
                warnings.push(format!("Previous results unavailable: {e}"));
                Vec::new()
            }
        }
    }

    fn dispatch_webhook(&self, url: Url, payload: WebhookPayload) {
        let notifier = Arc::clone(&self.notifier);
        let mut tasks = self.webhooks.lock().unwrap_or_else(PoisonError::into_inner);

        // Reap finished deliveries so a long-lived service doesn't accumulate them.
        while tasks.try_join_next().is_some() {}

        tasks.spawn(
            async move {
                if let Err(e) = notifier.notify(&url, &payload).await {
                    metrics::counter!("planning_webhook_failures_total").increment(1);
                    warn!(error = %e, %url, "Webhook notification failed");
                }
            }
            .in_current_span(),
        );
    }
}

#[async_trait]
impl PlanningService for DefaultPlanningService {
    async fn search(&self, request: SearchRequest) -> Result<DeltaResult, SearchError> {
        let filter = SearchFilter::new(
            request.filter_type,
            &request.filter_value,
            request.limit,
            self.max_limit,
        )?;
        let webhook = parse_webhook_url(request.webhook_url.as_deref())?;

        let span = info_span!(
            "planning_search",
            search_id = %uuid::Uuid::new_v4(),
            filter_type = %filter.filter_type,
            filter_key = %filter.key,
        );

        async move {
            if let Some(record) = self.fresh_snapshot(&filter).await {
                metrics::counter!("planning_searches_total", "outcome" => "cached").increment(1);
                info!(
                    total = record.results.len(),
                    "Serving snapshot from freshness window"
                );
                return Ok(DeltaResult {
                    filter_key: filter.key,
                    total_results: record.results.len(),
                    new_entities: Vec::new(),
                    cached: true,
                    timestamp: record.created_at,
                    warnings: Vec::new(),
                });
            }

            let current = match self.registry.search(&filter).await {
                Ok(entities) => entities,
                Err(e) => {
                    metrics::counter!("planning_searches_total", "outcome" => "failed")
                        .increment(1);
                    warn!(error = %e, "Registry search failed");
                    return Err(e);
                }
            };

            let mut warnings = Vec::new();
            let previous = self.baseline(&filter, &mut warnings).await;
            let new_entities = compute_delta(&previous, &current);

            let timestamp = match self
                .store
                .append(&filter.key, filter.filter_type, &current)
                .await
            {
                Ok(record) => record.created_at,
                Err(e) => {
                    warn!(error = %e, "Could not store search snapshot");
                    warnings.push(format!("Search results were not saved: {e}"));
                    Utc::now()
                }
            };

            metrics::counter!("planning_searches_total", "outcome" => "live").increment(1);
            metrics::counter!("planning_new_entities_total").increment(new_entities.len() as u64);
            info!(
                total = current.len(),
                new = new_entities.len(),
                "Planning search finished"
            );

            if let Some(url) = webhook.filter(|_| !new_entities.is_empty()) {
                self.dispatch_webhook(
                    url,
                    WebhookPayload {
                        filter_key: filter.key.clone(),
                        new_entities: new_entities.clone(),
                        timestamp,
                    },
                );
            }

            Ok(DeltaResult {
                filter_key: filter.key,
                total_results: current.len(),
                new_entities,
                cached: false,
                timestamp,
                warnings,
            })
        }
        .instrument(span)
        .await
    }

    async fn flush(&self) {
        let mut pending = {
            let mut tasks = self.webhooks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *tasks)
        };

        if pending.is_empty() {
            return;
        }

        debug!(pending = pending.len(), "Waiting for webhook deliveries");
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Webhook task did not complete");
            }
        }
    }
}
