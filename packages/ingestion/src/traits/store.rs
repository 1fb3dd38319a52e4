//! Storage traits.
//!
//! The storage layer is split into focused traits:
//! - `JobStore`: canonical jobs and the dedup snapshots
//! - `CompanyStore`: employers
//! - `BenchmarkStore`: the salary benchmark cache
//! - `SourceStore`: registered feeds and their scheduling bookkeeping
//! - `AuditStore`: rejection audit records
//! - `IngestStore`: composite trait combining all five
//!
//! Backends are consumed as unique-constraint stores: `insert_*` methods
//! surface key collisions as `IngestError::Conflict` and callers decide
//! the retry policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::Result;
use crate::types::company::Company;
use crate::types::job::{Job, RejectedPosting};
use crate::types::salary::SalaryBenchmark;
use crate::types::source::IngestSource;

/// Store for canonical job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Find a job by either half of its dedup identity.
    async fn find_job_by_source(&self, source_id: &str, source_url: &str)
        -> Result<Option<Job>>;

    /// Insert a new job. Fails with `Conflict` when the dedup identity
    /// already exists.
    async fn insert_job(&self, job: &Job) -> Result<Job>;

    /// Update an existing job in place.
    async fn update_job(&self, job: &Job) -> Result<Job>;

    /// Read-only snapshot of all known source ids, loaded once per run.
    async fn existing_source_ids(&self) -> Result<HashSet<String>>;

    /// Read-only snapshot of all known source URLs, loaded once per run.
    async fn existing_source_urls(&self) -> Result<HashSet<String>>;

    /// Annualized USD salary midpoints of stored postings for one market,
    /// for the empirical estimation tier. Only stated (non-estimated)
    /// salaries are comparable.
    async fn comparable_salaries(&self, normalized_title: &str, country: &str)
        -> Result<Vec<i64>>;

    /// Total persisted jobs.
    async fn count_jobs(&self) -> Result<usize>;
}

/// Store for employer records.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>>;

    /// Case-insensitive exact name match.
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>>;

    /// Insert a new company. Fails with `Conflict` when the slug is taken.
    async fn insert_company(&self, company: &Company) -> Result<Company>;

    async fn update_company(&self, company: &Company) -> Result<Company>;
}

/// Cache for salary benchmarks, keyed by (normalized title, country, region).
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    /// Fetch a benchmark. Expiry is the caller's concern: this returns
    /// whatever is stored, fresh or stale.
    async fn get_benchmark(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>>;

    /// Upsert a benchmark under its key.
    async fn store_benchmark(&self, benchmark: &SalaryBenchmark) -> Result<()>;
}

/// Store for registered feed sources.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn list_sources(&self) -> Result<Vec<IngestSource>>;

    async fn upsert_source(&self, source: &IngestSource) -> Result<()>;

    /// Stamp a successful (or at least attempted) run.
    async fn mark_source_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Increment the error counter after a failed run.
    async fn record_source_error(&self, id: Uuid) -> Result<()>;
}

/// Store for rejection audit records.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record_rejections(&self, rejected: &[RejectedPosting]) -> Result<()>;

    async fn rejection_count(&self) -> Result<usize>;
}

/// Composite storage trait combining all focused stores.
pub trait IngestStore:
    JobStore + CompanyStore + BenchmarkStore + SourceStore + AuditStore
{
}

// Blanket implementation: anything implementing all five is an IngestStore
impl<T: JobStore + CompanyStore + BenchmarkStore + SourceStore + AuditStore> IngestStore for T {}
