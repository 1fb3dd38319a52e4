//! Duplicate filter: reject postings already persisted.

use async_trait::async_trait;

use crate::error::StageResult;
use crate::pipeline::stage::{FilterContext, FilterStage, StagePartition};
use crate::types::job::{FilterableJob, FilterReason};

/// Rejects postings whose id or canonical URL is already in the
/// pre-loaded existing sets (reason `Duplicate`).
///
/// The caller pre-fetches the snapshots; the stage itself does no I/O.
#[derive(Default)]
pub struct DuplicateStage;

impl DuplicateStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FilterStage for DuplicateStage {
    fn name(&self) -> &'static str {
        "duplicate"
    }

    async fn filter(
        &self,
        jobs: Vec<FilterableJob>,
        ctx: &FilterContext,
    ) -> StageResult<StagePartition> {
        let mut partition = StagePartition::default();

        for job in jobs {
            if ctx.existing_ids.contains(&job.id) || ctx.existing_urls.contains(&job.source_url) {
                partition.rejected.push((job, FilterReason::Duplicate));
            } else {
                partition.passed.push(job);
            }
        }

        Ok(partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::job::RawPosting;
    use std::collections::HashSet;

    fn job(id: &str, url: &str) -> FilterableJob {
        RawPosting::new(id, "Engineer", url).into()
    }

    #[tokio::test]
    async fn test_known_id_and_url_rejected() {
        let stage = DuplicateStage::new();
        let ids: HashSet<String> = ["seen-id".to_string()].into();
        let urls: HashSet<String> = ["https://x.test/seen-url".to_string()].into();
        let ctx = FilterContext::new("test").with_existing(ids, urls);

        let jobs = vec![
            job("seen-id", "https://x.test/new-1"),
            job("new-id", "https://x.test/seen-url"),
            job("fresh", "https://x.test/fresh"),
        ];

        let partition = stage.filter(jobs, &ctx).await.unwrap();

        assert_eq!(partition.passed.len(), 1);
        assert_eq!(partition.passed[0].id, "fresh");
        assert!(partition
            .rejected
            .iter()
            .all(|(_, reason)| *reason == FilterReason::Duplicate));
    }

    #[tokio::test]
    async fn test_empty_snapshots_pass_everything() {
        let stage = DuplicateStage::new();
        let ctx = FilterContext::new("test");

        let partition = stage
            .filter(vec![job("a", "https://x.test/a")], &ctx)
            .await
            .unwrap();

        assert_eq!(partition.passed.len(), 1);
    }
}
