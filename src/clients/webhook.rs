use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::WebhookConfig;
use crate::models::WebhookPayload;

/// Delivers new-application notifications. Best effort: callers log failures
/// and move on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &Url, payload: &WebhookPayload) -> Result<()>;
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, url: &Url, payload: &WebhookPayload) -> Result<()> {
        debug!(
            %url,
            filter_key = %payload.filter_key,
            count = payload.new_entities.len(),
            "Posting webhook notification"
        );

        let response = self.client.post(url.clone()).json(payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Webhook returned {status}: {body}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FilterKey;
    use chrono::Utc;
    use httpmock::MockServer;

    fn payload() -> WebhookPayload {
        WebhookPayload {
            filter_key: FilterKey::from_normalized("e16an".to_string()),
            new_entities: vec![],
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn posts_camel_case_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/hooks/planning")
                    .header("content-type", "application/json")
                    .body_includes("\"filterKey\":\"e16an\"")
                    .body_includes("\"newEntities\":[]");
                then.status(204);
            })
            .await;

        let notifier = WebhookNotifier::new(&WebhookConfig::default()).unwrap();
        let url = Url::parse(&server.url("/hooks/planning")).unwrap();
        notifier.notify(&url, &payload()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/hooks/planning");
                then.status(500).body("nope");
            })
            .await;

        let notifier = WebhookNotifier::new(&WebhookConfig::default()).unwrap();
        let url = Url::parse(&server.url("/hooks/planning")).unwrap();
        let err = notifier.notify(&url, &payload()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
