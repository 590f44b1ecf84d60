use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FilterKey, FilterType};

/// A single planning-application record from the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanningEntity {
    /// Unique per registry; the identity used for delta comparison.
    pub id: String,

    pub name: String,

    pub site_address: String,

    pub postcode: String,

    pub local_authority: String,

    pub description: String,

    pub url: String,

    pub start_date: String,

    /// Absent while the application is still open.
    #[serde(default)]
    pub end_date: Option<String>,

    #[serde(default)]
    pub applicant: Option<Applicant>,

    /// Upstream payload kept for auditing. Never interpreted.
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Applicant {
    pub name: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub address: Option<String>,
}

impl Applicant {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.telephone.is_none()
            && self.address.is_none()
    }
}

/// One stored snapshot of a search. Rows are append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecord {
    pub id: i32,
    pub filter_key: FilterKey,
    pub filter_type: FilterType,
    pub results: Vec<PlanningEntity>,
    pub created_at: DateTime<Utc>,
}

/// What a caller gets back from a search.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaResult {
    pub filter_key: FilterKey,
    pub total_results: usize,
    pub new_entities: Vec<PlanningEntity>,
    /// True when the snapshot came from the freshness window instead of a live fetch.
    pub cached: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Body POSTed to a caller-supplied webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub filter_key: FilterKey,
    pub new_entities: Vec<PlanningEntity>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_uses_camel_case_on_the_wire() {
        let entity = PlanningEntity {
            id: "Camden/2026/0001".to_string(),
            name: "Camden/2026/0001".to_string(),
            site_address: "1 High Street".to_string(),
            postcode: "NW1 1AA".to_string(),
            local_authority: "Camden".to_string(),
            description: "Rear extension".to_string(),
            url: "https://example.org/a".to_string(),
            start_date: "2026-01-02".to_string(),
            end_date: None,
            applicant: None,
            raw: serde_json::Value::Null,
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["siteAddress"], "1 High Street");
        assert_eq!(json["localAuthority"], "Camden");
        assert!(json["endDate"].is_null());
    }

    #[test]
    fn delta_result_omits_empty_warnings() {
        let result = DeltaResult {
            filter_key: FilterKey::from_normalized("e16an".to_string()),
            total_results: 0,
            new_entities: vec![],
            cached: false,
            timestamp: Utc::now(),
            warnings: vec![],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["filterKey"], "e16an");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn applicant_emptiness() {
        assert!(Applicant::default().is_empty());
        let applicant = Applicant {
            email: Some("a@example.org".to_string()),
            ..Applicant::default()
        };
        assert!(!applicant.is_empty());
    }
}
