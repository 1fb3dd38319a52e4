//! AI relevance filter: confirm topical relevance with the AI service.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::error::StageResult;
use crate::pipeline::stage::{FilterContext, FilterStage, StagePartition};
use crate::traits::ai::ExtractionAi;
use crate::types::job::{FilterableJob, FilterReason};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// How much posting body the relevance check gets to see.
const EXCERPT_CHARS: usize = 400;

/// Confirms topical relevance per job via the AI service (reason
/// `AiRejected` on a negative verdict).
///
/// This is the only stage that performs blocking I/O. Jobs are checked
/// strictly one at a time, never concurrently, behind a rate limiter, so
/// external API usage stays deterministic and bounded. A service error
/// passes that job through rather than rejecting it: per-job fail-open,
/// distinct from the engine's per-stage fail-open.
pub struct RelevanceStage<A: ExtractionAi> {
    ai: Arc<A>,
    limiter: DefaultRateLimiter,
}

impl<A: ExtractionAi> RelevanceStage<A> {
    /// Create a relevance stage throttled to `calls_per_minute`.
    pub fn new(ai: Arc<A>, calls_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(calls_per_minute).unwrap_or(nonzero!(1u32));
        Self {
            ai,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }
}

#[async_trait]
impl<A: ExtractionAi> FilterStage for RelevanceStage<A> {
    fn name(&self) -> &'static str {
        "relevance"
    }

    async fn filter(
        &self,
        jobs: Vec<FilterableJob>,
        ctx: &FilterContext,
    ) -> StageResult<StagePartition> {
        let mut partition = StagePartition::default();

        for job in jobs {
            self.limiter.until_ready().await;

            let excerpt: String = job.raw.body.chars().take(EXCERPT_CHARS).collect();
            match self.ai.is_relevant(&job.title, &excerpt).await {
                Ok(true) => partition.passed.push(job),
                Ok(false) => partition.rejected.push((job, FilterReason::AiRejected)),
                Err(e) => {
                    warn!(
                        source = %ctx.source_name,
                        title = %job.title,
                        error = %e,
                        "relevance check unavailable, passing job through"
                    );
                    partition.passed.push(job);
                }
            }
        }

        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAi;
    use crate::types::job::RawPosting;

    fn job(title: &str) -> FilterableJob {
        RawPosting::new(title, title, format!("https://x.test/{title}"))
            .with_body("posting body")
            .into()
    }

    #[tokio::test]
    async fn test_negative_verdict_rejects() {
        let ai = Arc::new(MockAi::new().with_relevance("Crypto Scheme", false));
        let stage = RelevanceStage::new(ai, 600);
        let ctx = FilterContext::new("test");

        let partition = stage
            .filter(vec![job("Backend Engineer"), job("Crypto Scheme")], &ctx)
            .await
            .unwrap();

        assert_eq!(partition.passed.len(), 1);
        assert_eq!(partition.rejected.len(), 1);
        assert_eq!(partition.rejected[0].1, FilterReason::AiRejected);
    }

    #[tokio::test]
    async fn test_service_error_passes_job_through() {
        let ai = Arc::new(MockAi::new().failing());
        let stage = RelevanceStage::new(ai, 600);
        let ctx = FilterContext::new("test");

        let partition = stage.filter(vec![job("Backend Engineer")], &ctx).await.unwrap();

        assert_eq!(partition.passed.len(), 1);
        assert!(partition.rejected.is_empty());
    }
}
