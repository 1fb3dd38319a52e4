//! ATS board adapter: structured JSON postings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FetchError, FetchResult};
use crate::sources::markup::strip_markup;
use crate::traits::source::SourceAdapter;
use crate::types::job::{RawPosting, SourceKind};

/// One posting as the board API publishes it.
#[derive(Debug, Deserialize)]
struct AtsPosting {
    id: u64,
    title: String,
    absolute_url: String,
    location: Option<AtsLocation>,
    /// Structured workplace field ("remote", "hybrid", "on_site"); most
    /// boards omit it
    workplace_type: Option<String>,
    updated_at: Option<DateTime<Utc>>,
    /// Posting body as an HTML fragment
    content: Option<String>,
    #[serde(default)]
    departments: Vec<AtsDepartment>,
}

#[derive(Debug, Deserialize)]
struct AtsLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtsDepartment {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtsResponse {
    jobs: Vec<AtsPosting>,
}

/// Adapter for a single employer's ATS board.
///
/// Fetches the board's JSON endpoint and normalizes each typed record.
pub struct AtsAdapter {
    name: String,
    company: String,
    endpoint: String,
    client: reqwest::Client,
}

impl AtsAdapter {
    /// Create an adapter for one board.
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            company: company.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn normalize(&self, posting: AtsPosting) -> RawPosting {
        let mut raw = RawPosting::new(
            format!("{}:{}", self.name, posting.id),
            posting.title,
            posting.absolute_url,
        );

        if let Some(location) = posting.location {
            raw = raw.with_location(location.name);
        }
        if let Some(workplace) = posting.workplace_type {
            raw = raw.with_workplace_type(workplace);
        }
        if let Some(updated) = posting.updated_at {
            raw = raw.with_posted_at(updated);
        }
        if let Some(content) = posting.content {
            raw = raw.with_body(strip_markup(&content));
        }
        if !posting.departments.is_empty() {
            let departments: Vec<_> =
                posting.departments.into_iter().map(|d| d.name).collect();
            raw = raw.with_metadata("departments", departments.join(", "));
        }

        raw.with_metadata("company", self.company.clone())
    }
}

#[async_trait]
impl SourceAdapter for AtsAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Ats
    }

    fn company_hint(&self) -> Option<&str> {
        Some(&self.company)
    }

    async fn fetch(&self) -> FetchResult<Vec<RawPosting>> {
        debug!(adapter = %self.name, url = %self.endpoint, "fetching ATS board");

        let endpoint = crate::sources::checked_url(&self.endpoint)?;
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: self.endpoint.clone(),
                    }
                } else {
                    FetchError::Http(Box::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: AtsResponse = response.json().await.map_err(|e| {
            warn!(adapter = %self.name, error = %e, "ATS response did not match schema");
            FetchError::Malformed {
                reason: e.to_string(),
            }
        })?;

        Ok(body.jobs.into_iter().map(|p| self.normalize(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> AtsAdapter {
        AtsAdapter::new("acme-board", "Acme", "https://boards.test/acme/jobs")
    }

    #[test]
    fn test_normalize_full_record() {
        let posting: AtsPosting = serde_json::from_value(serde_json::json!({
            "id": 4012,
            "title": "Senior Backend Engineer",
            "absolute_url": "https://boards.test/acme/jobs/4012",
            "location": {"name": "Remote - US"},
            "workplace_type": "remote",
            "updated_at": "2026-07-01T09:30:00Z",
            "content": "<p>Build our ingestion stack.</p>",
            "departments": [{"name": "Engineering"}]
        }))
        .unwrap();

        let raw = adapter().normalize(posting);

        assert_eq!(raw.external_id, "acme-board:4012");
        assert_eq!(raw.location.as_deref(), Some("Remote - US"));
        assert_eq!(raw.workplace_type.as_deref(), Some("remote"));
        assert_eq!(raw.body, "Build our ingestion stack.");
        assert_eq!(raw.metadata.get("company").map(String::as_str), Some("Acme"));
        assert_eq!(
            raw.metadata.get("departments").map(String::as_str),
            Some("Engineering")
        );
    }

    #[test]
    fn test_normalize_minimal_record() {
        let posting: AtsPosting = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "QA Tester",
            "absolute_url": "https://boards.test/acme/jobs/7"
        }))
        .unwrap();

        let raw = adapter().normalize(posting);

        assert_eq!(raw.external_id, "acme-board:7");
        assert!(raw.location.is_none());
        assert!(raw.posted_at.is_none());
        assert!(raw.body.is_empty());
    }

    #[test]
    fn test_response_schema() {
        let response: AtsResponse = serde_json::from_str(
            r#"{"jobs": [{"id": 1, "title": "Dev", "absolute_url": "https://x.test/1"}]}"#,
        )
        .unwrap();
        assert_eq!(response.jobs.len(), 1);
    }
}
