//! ATS board discovery.
//!
//! A long-running probe over candidate board tokens (derived from known
//! company names) looking for feeds not yet registered. Cancellation is
//! cooperative via a [`CancellationToken`] checked between probes, and
//! progress lives in an explicit state object behind a shared handle
//! owned by the caller. Individual probe failures are recorded on the
//! progress, never fatal to the sweep.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::{Arc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::types::company::slugify;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Where a discovery sweep currently stands.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryProgress {
    /// Candidates in the sweep
    pub total: usize,
    /// Candidates probed so far
    pub probed: usize,
    /// Tokens that answered with a live board
    pub found: Vec<String>,
    /// Probes that errored (network trouble, not a miss)
    pub failed: usize,
    /// True once the sweep ran to natural completion
    pub finished: bool,
}

/// Shared, cloneable view onto a sweep's progress.
///
/// The caller owns the handle and can snapshot it from anywhere while
/// the sweep runs; the sweep holds a clone and is the only writer.
#[derive(Clone, Default)]
pub struct DiscoveryHandle {
    inner: Arc<RwLock<DiscoveryProgress>>,
}

impl DiscoveryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// A point-in-time copy of the progress.
    pub fn snapshot(&self) -> DiscoveryProgress {
        self.inner.read().unwrap().clone()
    }

    fn update(&self, f: impl FnOnce(&mut DiscoveryProgress)) {
        f(&mut self.inner.write().unwrap());
    }
}

/// Probes candidate board tokens against an ATS endpoint template.
pub struct BoardDiscovery {
    /// Endpoint with a `{token}` placeholder
    endpoint_template: String,
    client: reqwest::Client,
    limiter: DefaultRateLimiter,
}

impl BoardDiscovery {
    /// Create a discovery probe, throttled to `probes_per_minute`.
    pub fn new(endpoint_template: impl Into<String>, probes_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(probes_per_minute).unwrap_or(nonzero!(1u32));
        Self {
            endpoint_template: endpoint_template.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }

    /// Sweep the candidate tokens, reporting into `progress`.
    ///
    /// Returns the tokens with live boards, or `Cancelled` if the token
    /// fired mid-sweep; partial results remain readable on the handle
    /// either way.
    pub async fn run(
        &self,
        candidates: &[String],
        progress: &DiscoveryHandle,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        progress.update(|p| p.total = candidates.len());
        let mut found = Vec::new();

        for token in candidates {
            if cancel.is_cancelled() {
                info!(probed = progress.snapshot().probed, "discovery cancelled");
                return Err(IngestError::Cancelled);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(probed = progress.snapshot().probed, "discovery cancelled");
                    return Err(IngestError::Cancelled);
                }
                _ = self.limiter.until_ready() => {}
            }

            match self.probe(token).await {
                Ok(true) => {
                    info!(token = %token, "live board discovered");
                    found.push(token.clone());
                    progress.update(|p| {
                        p.probed += 1;
                        p.found.push(token.clone());
                    });
                }
                Ok(false) => {
                    progress.update(|p| p.probed += 1);
                }
                Err(e) => {
                    debug!(token = %token, error = %e, "probe failed");
                    progress.update(|p| {
                        p.probed += 1;
                        p.failed += 1;
                    });
                }
            }
        }

        progress.update(|p| p.finished = true);
        info!(
            probed = candidates.len(),
            found = found.len(),
            "discovery sweep complete"
        );
        Ok(found)
    }

    /// Whether a token answers with something that looks like a board:
    /// a success status and a JSON body carrying a `jobs` array.
    async fn probe(&self, token: &str) -> Result<bool> {
        let url = self.endpoint_template.replace("{token}", token);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| IngestError::Fetch(crate::error::FetchError::Http(Box::new(e))))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(_) => return Ok(false),
        };
        Ok(body.get("jobs").map(|j| j.is_array()).unwrap_or(false))
    }
}

/// Candidate board tokens for a set of company names.
///
/// Each name yields its slug and, when different, the slug with the
/// hyphens collapsed ("acme-corp" and "acmecorp"); duplicates are
/// dropped while preserving first-seen order.
pub fn candidate_tokens(company_names: &[String]) -> Vec<String> {
    let mut tokens = Vec::new();
    for name in company_names {
        let slug = slugify(name);
        let collapsed = slug.replace('-', "");
        for candidate in [slug, collapsed] {
            if !tokens.contains(&candidate) {
                tokens.push(candidate);
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_tokens_variants_and_dedup() {
        let tokens = candidate_tokens(&["Acme Corp".into(), "acmecorp".into(), "Initech".into()]);
        assert_eq!(tokens, vec!["acme-corp", "acmecorp", "initech"]);
    }

    #[tokio::test]
    async fn test_cancellation_between_probes() {
        let discovery = BoardDiscovery::new("https://boards.test/{token}/jobs", 600);
        let progress = DiscoveryHandle::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let candidates = vec!["acme".to_string(), "initech".to_string()];
        let err = discovery.run(&candidates, &progress, &cancel).await;

        assert!(matches!(err, Err(IngestError::Cancelled)));
        let snapshot = progress.snapshot();
        assert_eq!(snapshot.total, 2);
        assert_eq!(snapshot.probed, 0);
        assert!(!snapshot.finished);
    }

    #[test]
    fn test_handle_snapshots_are_independent() {
        let handle = DiscoveryHandle::new();
        handle.update(|p| p.probed = 3);

        let snapshot = handle.snapshot();
        handle.update(|p| p.probed = 5);

        assert_eq!(snapshot.probed, 3);
        assert_eq!(handle.snapshot().probed, 5);
    }
}
