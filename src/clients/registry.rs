use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::RegistryConfig;
use crate::domain::FilterType;
use crate::models::{Applicant, PlanningEntity};
use crate::services::planning_service::{SearchError, SearchFilter};

/// Outbound search against a planning-application registry.
///
/// One call, one request. Failures are surfaced as-is and never retried.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<PlanningEntity>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct ApplicsResponse {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApplicRecord {
    name: Option<String>,
    uid: Option<String>,
    address: Option<String>,
    postcode: Option<String>,
    area_name: Option<String>,
    description: Option<String>,
    link: Option<String>,
    url: Option<String>,
    start_date: Option<String>,
    decided_date: Option<String>,
    other_fields: Option<OtherFields>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OtherFields {
    applicant_name: Option<String>,
    applicant_email: Option<String>,
    applicant_telephone: Option<String>,
    applicant_address: Option<String>,
}

impl ApplicRecord {
    fn into_entity(self, raw: serde_json::Value) -> Option<PlanningEntity> {
        let id = self
            .name
            .filter(|name| !name.trim().is_empty())
            .or(self.uid.filter(|uid| !uid.trim().is_empty()))?;

        let other = self.other_fields.unwrap_or_default();
        let applicant = Applicant {
            name: other.applicant_name,
            email: other.applicant_email,
            telephone: other.applicant_telephone,
            address: other.applicant_address,
        };

        Some(PlanningEntity {
            name: id.clone(),
            id,
            site_address: self.address.unwrap_or_default(),
            postcode: self.postcode.unwrap_or_default(),
            local_authority: self.area_name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            url: self.link.or(self.url).unwrap_or_default(),
            start_date: self.start_date.unwrap_or_default(),
            end_date: self.decided_date,
            applicant: (!applicant.is_empty()).then_some(applicant),
            raw,
        })
    }
}

/// Client for the PlanIt planning-applications API.
#[derive(Clone)]
pub struct PlanItClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl PlanItClient {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()
            .context("Failed to build registry HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn search_url(&self, filter: &SearchFilter) -> Result<Url, SearchError> {
        let mut url = self
            .base_url
            .join("api/applics/json")
            .map_err(|e| SearchError::RegistryUnavailable(format!("Bad registry URL: {e}")))?;

        let param = match filter.filter_type {
            FilterType::Postcode => "pcode",
            FilterType::LocalAuthority => "auth",
        };

        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair(param, filter.key.as_str())
                .append_pair("limit", &filter.limit.to_string());
            if let Some(key) = &self.api_key {
                pairs.append_pair("api_key", key);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl RegistryClient for PlanItClient {
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<PlanningEntity>, SearchError> {
        let url = self.search_url(filter)?;

        debug!(
            filter_type = %filter.filter_type,
            filter_key = %filter.key,
            limit = filter.limit,
            "Querying planning registry"
        );

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::RegistryUnavailable(format!(
                "Registry API error: {status} - {body}"
            )));
        }

        let body: ApplicsResponse = response.json().await?;

        let entities: Vec<PlanningEntity> = body
            .records
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| map_record(index, raw))
            .take(filter.limit as usize)
            .collect();

        debug!(count = entities.len(), "Registry returned entities");

        Ok(entities)
    }
}

/// Maps one upstream record, logging the ones that have to be skipped.
fn map_record(index: usize, raw: serde_json::Value) -> Option<PlanningEntity> {
    let record: ApplicRecord = match serde_json::from_value(raw.clone()) {
        Ok(record) => record,
        Err(e) => {
            warn!(
                index,
                uid = raw.get("uid").and_then(|v| v.as_str()),
                error = %e,
                "Skipping unreadable registry record"
            );
            return None;
        }
    };

    let entity = record.into_entity(raw);
    if entity.is_none() {
        warn!(index, "Skipping registry record with no name or uid");
    }
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    fn config_for(server: &MockServer) -> RegistryConfig {
        RegistryConfig {
            base_url: server.base_url(),
            api_key: Some("secret".to_string()),
            ..RegistryConfig::default()
        }
    }

    fn postcode_filter(raw: &str, limit: u32) -> SearchFilter {
        SearchFilter::new(FilterType::Postcode, raw, limit, 500).unwrap()
    }

    #[tokio::test]
    async fn maps_records_in_upstream_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/applics/json")
                    .query_param("pcode", "e16an")
                    .query_param("limit", "10")
                    .query_param("api_key", "secret");
                then.status(200).json_body(serde_json::json!({
                    "records": [
                        {
                            "name": "TowerHamlets/PA/26/0002",
                            "uid": "PA/26/0002",
                            "address": "2 Brick Lane",
                            "postcode": "E1 6AN",
                            "area_name": "Tower Hamlets",
                            "description": "Change of use",
                            "link": "https://planit.example/2",
                            "start_date": "2026-02-01",
                            "other_fields": {
                                "applicant_name": "J Smith",
                                "applicant_email": "j@example.org"
                            }
                        },
                        {
                            "name": "TowerHamlets/PA/26/0001",
                            "address": "1 Brick Lane",
                            "postcode": "E1 6AN",
                            "area_name": "Tower Hamlets",
                            "description": "Loft conversion",
                            "url": "https://planit.example/1",
                            "start_date": "2026-01-15",
                            "decided_date": "2026-03-01"
                        }
                    ]
                }));
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let entities = client.search(&postcode_filter("E1 6AN", 10)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(entities.len(), 2);

        let first = &entities[0];
        assert_eq!(first.id, "TowerHamlets/PA/26/0002");
        assert_eq!(first.local_authority, "Tower Hamlets");
        assert_eq!(first.url, "https://planit.example/2");
        assert!(first.end_date.is_none());
        let applicant = first.applicant.as_ref().expect("applicant");
        assert_eq!(applicant.name.as_deref(), Some("J Smith"));
        assert_eq!(first.raw["uid"], "PA/26/0002");

        let second = &entities[1];
        assert_eq!(second.url, "https://planit.example/1");
        assert_eq!(second.end_date.as_deref(), Some("2026-03-01"));
        assert!(second.applicant.is_none());
    }

    #[tokio::test]
    async fn authority_filter_uses_auth_param() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("GET")
                    .path("/api/applics/json")
                    .query_param("auth", "tower hamlets");
                then.status(200).json_body(serde_json::json!({ "records": [] }));
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let filter = SearchFilter::new(FilterType::LocalAuthority, "Tower  Hamlets", 5, 500).unwrap();
        let entities = client.search(&filter).await.unwrap();

        mock.assert_async().await;
        assert!(entities.is_empty());
    }

    #[tokio::test]
    async fn truncates_to_limit() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/applics/json");
                then.status(200).json_body(serde_json::json!({
                    "records": [
                        { "name": "a" }, { "name": "b" }, { "name": "c" }
                    ]
                }));
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let entities = client.search(&postcode_filter("E1 6AN", 2)).await.unwrap();
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn http_error_is_registry_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/applics/json");
                then.status(503).body("maintenance");
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let err = client
            .search(&postcode_filter("E1 6AN", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RegistryUnavailable(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn undecodable_body_is_registry_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/applics/json");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let err = client
            .search(&postcode_filter("E1 6AN", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_registry_unavailable() {
        let config = RegistryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_seconds: 2,
            ..RegistryConfig::default()
        };
        let client = PlanItClient::new(&config).unwrap();
        let err = client
            .search(&postcode_filter("E1 6AN", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn null_fields_do_not_drop_records() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/applics/json");
                then.status(200).json_body(serde_json::json!({
                    "records": [
                        {
                            "name": null,
                            "uid": "PA/1",
                            "address": "1 High Street",
                            "decided_date": null,
                            "other_fields": { "applicant_name": null }
                        },
                        { "name": "B", "other_fields": null, "postcode": null }
                    ]
                }));
            })
            .await;

        let client = PlanItClient::new(&config_for(&server)).unwrap();
        let entities = client.search(&postcode_filter("E1 6AN", 10)).await.unwrap();
        let ids: Vec<&str> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["PA/1", "B"]);
        assert_eq!(entities[0].name, "PA/1");
        assert_eq!(entities[0].site_address, "1 High Street");
        assert!(entities[0].applicant.is_none());
        assert!(entities[1].postcode.is_empty());
    }

    #[test]
    fn mistyped_record_is_skipped_without_failing_the_page() {
        let skipped = map_record(0, serde_json::json!({ "name": "A", "address": 42 }));
        assert!(skipped.is_none());

        let kept = map_record(1, serde_json::json!({ "name": "B" })).unwrap();
        assert_eq!(kept.id, "B");
    }

    #[test]
    fn blank_name_falls_back_to_uid() {
        let entity = map_record(0, serde_json::json!({ "name": "  ", "uid": "PA/9" })).unwrap();
        assert_eq!(entity.id, "PA/9");
    }

    #[test]
    fn builds_with_default_config() {
        assert!(PlanItClient::new(&RegistryConfig::default()).is_ok());
    }

    #[test]
    fn record_without_identity_is_skipped() {
        let record = ApplicRecord::default();
        assert!(record.into_entity(serde_json::Value::Null).is_none());
    }
}
