//! Whitelist filter: only curated target professions get through.

use async_trait::async_trait;

use crate::error::StageResult;
use crate::pipeline::stage::{FilterContext, FilterStage, StagePartition};
use crate::types::job::{FilterableJob, FilterReason};

/// Rejects postings whose title matches none of the allow-list keywords
/// (reason `NonTargetTitle`).
///
/// Case-insensitive substring matching, no I/O.
pub struct WhitelistStage {
    keywords: Vec<String>,
}

impl WhitelistStage {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.keywords.iter().any(|k| title.contains(k))
    }
}

#[async_trait]
impl FilterStage for WhitelistStage {
    fn name(&self) -> &'static str {
        "whitelist"
    }

    async fn filter(
        &self,
        jobs: Vec<FilterableJob>,
        _ctx: &FilterContext,
    ) -> StageResult<StagePartition> {
        let mut partition = StagePartition::default();

        for job in jobs {
            if self.matches(&job.title) {
                partition.passed.push(job);
            } else {
                partition.rejected.push((job, FilterReason::NonTargetTitle));
            }
        }

        Ok(partition)
    }
}
