use anyhow::Context;
use std::sync::Arc;

use crate::clients::{PlanItClient, WebhookNotifier};
use crate::config::Config;
use crate::db::Store;
use crate::services::{DefaultPlanningService, PlanningService};

/// Everything a command needs, built once from explicit configuration.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub planning: Arc<dyn PlanningService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .context("Failed to open search history database")?;

        let registry =
            PlanItClient::new(&config.registry).context("Failed to build registry client")?;
        let notifier =
            WebhookNotifier::new(&config.webhook).context("Failed to build webhook notifier")?;

        let planning = DefaultPlanningService::new(
            Arc::new(registry),
            Arc::new(store.clone()),
            Arc::new(notifier),
            config.registry.max_limit,
        )
        .with_freshness_seconds(config.cache.freshness_seconds);

        Ok(Self {
            config: Arc::new(config),
            store,
            planning: Arc::new(planning),
        })
    }
}
