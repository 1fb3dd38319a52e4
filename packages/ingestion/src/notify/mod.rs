//! Downstream notification implementations.
//!
//! Delivery is fire-and-forget: search-engine indexing pings and
//! social-post queuing are at-most-once, failures are logged, and
//! nothing here ever rolls back or blocks job creation.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::warn;

use crate::error::{IngestError, Result};
use crate::traits::notify::Notifier;
use crate::types::job::Job;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Webhook-based notifier: an indexing ping endpoint and a social-queue
/// endpoint, either of which may be absent.
pub struct WebhookNotifier {
    index_endpoint: Option<String>,
    social_endpoint: Option<String>,
    client: Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            index_endpoint: None,
            social_endpoint: None,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Set the search-engine indexing ping endpoint.
    pub fn with_index_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.index_endpoint = Some(endpoint.into());
        self
    }

    /// Set the social-post queue endpoint.
    pub fn with_social_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.social_endpoint = Some(endpoint.into());
        self
    }

    async fn post(&self, endpoint: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| IngestError::Notify(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Notify(
                format!("{endpoint} returned HTTP {status}").into(),
            ));
        }
        Ok(())
    }

    async fn deliver(&self, job: &Job, event: &str) -> Result<()> {
        let payload = serde_json::json!({
            "event": event,
            "url": job.source_url,
            "title": job.title,
            "category": job.category.as_slug(),
            "remote_type": job.remote_type.as_str(),
        });

        if let Some(endpoint) = &self.index_endpoint {
            self.post(endpoint, &payload).await?;
        }
        if let Some(endpoint) = &self.social_endpoint {
            // Only fresh postings are worth a social post.
            if event == "published" {
                self.post(endpoint, &payload).await?;
            }
        }
        Ok(())
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn job_published(&self, job: &Job) -> Result<()> {
        self.deliver(job, "published").await
    }

    async fn job_updated(&self, job: &Job) -> Result<()> {
        self.deliver(job, "updated").await
    }
}

/// Deliver a notification, logging failure instead of surfacing it.
pub async fn notify_best_effort(notifier: &Arc<dyn Notifier>, job: &Job, updated: bool) {
    let result = if updated {
        notifier.job_updated(job).await
    } else {
        notifier.job_published(job).await
    };

    if let Err(e) = result {
        warn!(
            title = %job.title,
            url = %job.source_url,
            error = %e,
            "downstream notification failed"
        );
    }
}
