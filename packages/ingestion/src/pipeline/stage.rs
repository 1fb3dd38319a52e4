//! Filter stage protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::StageResult;
use crate::types::job::{FilterableJob, FilterReason};

/// Context shared by every stage in one pipeline run.
///
/// The existing-id/url sets are read-only snapshots loaded once before
/// the run; stages themselves do no I/O against the store. The clock is
/// injected so age decisions are deterministic under test.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Source being processed, for logging and audit records
    pub source_name: String,

    /// Employer hint used on audit records ("" when the feed is
    /// multi-employer and the company is only known after extraction)
    pub company: String,

    /// Snapshot of source ids already persisted
    pub existing_ids: HashSet<String>,

    /// Snapshot of source URLs already persisted
    pub existing_urls: HashSet<String>,

    /// The run's notion of "now"
    pub now: DateTime<Utc>,
}

impl FilterContext {
    /// Context with empty dedup snapshots and the current time.
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            company: String::new(),
            existing_ids: HashSet::new(),
            existing_urls: HashSet::new(),
            now: Utc::now(),
        }
    }

    /// Set the employer hint.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// Set the dedup snapshots.
    pub fn with_existing(mut self, ids: HashSet<String>, urls: HashSet<String>) -> Self {
        self.existing_ids = ids;
        self.existing_urls = urls;
        self
    }

    /// Pin the clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// The outcome of one stage over one batch: a partition of its input.
#[derive(Debug, Default)]
pub struct StagePartition {
    pub passed: Vec<FilterableJob>,
    pub rejected: Vec<(FilterableJob, FilterReason)>,
}

impl StagePartition {
    /// A partition where everything passed.
    pub fn all_passed(jobs: Vec<FilterableJob>) -> Self {
        Self {
            passed: jobs,
            rejected: Vec::new(),
        }
    }

    /// Total jobs accounted for by this partition.
    pub fn total(&self) -> usize {
        self.passed.len() + self.rejected.len()
    }
}

/// One filtering decision over a batch.
///
/// A stage partitions its input; it never mutates jobs. Taking the batch
/// by value makes that structural: the only way to emit a job is to move
/// it into `passed` or `rejected`.
#[async_trait]
pub trait FilterStage: Send + Sync {
    /// Stage name for logs and stats.
    fn name(&self) -> &'static str;

    /// Partition the batch.
    async fn filter(
        &self,
        jobs: Vec<FilterableJob>,
        ctx: &FilterContext,
    ) -> StageResult<StagePartition>;
}
