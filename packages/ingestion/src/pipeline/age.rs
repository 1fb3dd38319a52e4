//! Age filter: reject postings older than the configured maximum.

use async_trait::async_trait;
use chrono::Duration;

use crate::error::StageResult;
use crate::pipeline::stage::{FilterContext, FilterStage, StagePartition};
use crate::types::job::{FilterableJob, FilterReason};

/// Rejects postings older than `max_age_days` (reason `TooOld`).
///
/// Pure date comparison against the run clock. Postings with no
/// publication timestamp pass: an unknown age is not proof of staleness.
pub struct AgeStage {
    max_age_days: i64,
}

impl AgeStage {
    pub fn new(max_age_days: i64) -> Self {
        Self { max_age_days }
    }
}

#[async_trait]
impl FilterStage for AgeStage {
    fn name(&self) -> &'static str {
        "age"
    }

    async fn filter(
        &self,
        jobs: Vec<FilterableJob>,
        ctx: &FilterContext,
    ) -> StageResult<StagePartition> {
        let cutoff = ctx.now - Duration::days(self.max_age_days);
        let mut partition = StagePartition::default();

        for job in jobs {
            match job.posted_at {
                Some(posted) if posted < cutoff => {
                    partition.rejected.push((job, FilterReason::TooOld));
                }
                _ => partition.passed.push(job),
            }
        }

        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::RawPosting;
    use chrono::Utc;

    fn job_posted_days_ago(id: &str, days: i64) -> FilterableJob {
        let raw = RawPosting::new(id, "Engineer", format!("https://x.test/{id}"))
            .with_posted_at(Utc::now() - Duration::days(days));
        raw.into()
    }

    #[tokio::test]
    async fn test_old_postings_rejected() {
        let stage = AgeStage::new(30);
        let ctx = FilterContext::new("test");
        let jobs = vec![
            job_posted_days_ago("fresh", 1),
            job_posted_days_ago("stale", 45),
        ];

        let partition = stage.filter(jobs, &ctx).await.unwrap();

        assert_eq!(partition.passed.len(), 1);
        assert_eq!(partition.passed[0].id, "fresh");
        assert_eq!(partition.rejected.len(), 1);
        assert_eq!(partition.rejected[0].1, FilterReason::TooOld);
    }

    #[tokio::test]
    async fn test_unknown_age_passes() {
        let stage = AgeStage::new(30);
        let ctx = FilterContext::new("test");
        let undated: FilterableJob =
            RawPosting::new("undated", "Engineer", "https://x.test/undated").into();

        let partition = stage.filter(vec![undated], &ctx).await.unwrap();

        assert_eq!(partition.passed.len(), 1);
        assert!(partition.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_age_cutoff_uses_run_clock() {
        let stage = AgeStage::new(30);
        // With the clock pinned 60 days in the future, even a fresh
        // posting falls outside the window.
        let ctx = FilterContext::new("test").with_now(Utc::now() + Duration::days(60));

        let partition = stage
            .filter(vec![job_posted_days_ago("fresh", 1)], &ctx)
            .await
            .unwrap();

        assert_eq!(partition.rejected.len(), 1);
    }
}
