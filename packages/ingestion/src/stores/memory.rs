//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{IngestError, Result};
use crate::traits::store::{AuditStore, BenchmarkStore, CompanyStore, JobStore, SourceStore};
use crate::types::company::Company;
use crate::types::job::{Job, RejectedPosting};
use crate::types::salary::{normalize_title, to_usd, SalaryBenchmark};
use crate::types::source::IngestSource;

type BenchmarkKey = (String, String, Option<String>);

/// In-memory store backing all five storage traits.
///
/// Useful for testing and development. Not suitable for production as
/// data is lost on restart. Unique-constraint semantics (dedup identity,
/// company slug, benchmark key) are enforced the same way the real
/// backend enforces them, so conflict paths are exercisable in tests.
#[derive(Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    companies: RwLock<HashMap<Uuid, Company>>,
    benchmarks: RwLock<HashMap<BenchmarkKey, SalaryBenchmark>>,
    sources: RwLock<HashMap<Uuid, IngestSource>>,
    rejections: RwLock<Vec<RejectedPosting>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.jobs.write().unwrap().clear();
        self.companies.write().unwrap().clear();
        self.benchmarks.write().unwrap().clear();
        self.sources.write().unwrap().clear();
        self.rejections.write().unwrap().clear();
    }

    /// All stored jobs, unordered.
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.read().unwrap().values().cloned().collect()
    }

    /// All stored companies, unordered.
    pub fn companies(&self) -> Vec<Company> {
        self.companies.read().unwrap().values().cloned().collect()
    }

    /// All audit records, in insertion order.
    pub fn rejections(&self) -> Vec<RejectedPosting> {
        self.rejections.read().unwrap().clone()
    }

    fn benchmark_key(title: &str, country: &str, region: Option<&str>) -> BenchmarkKey {
        (
            title.to_string(),
            country.to_string(),
            region.map(String::from),
        )
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_job_by_source(
        &self,
        source_id: &str,
        source_url: &str,
    ) -> Result<Option<Job>> {
        Ok(self
            .jobs
            .read()
            .unwrap()
            .values()
            .find(|j| j.source_id == source_id || j.source_url == source_url)
            .cloned())
    }

    async fn insert_job(&self, job: &Job) -> Result<Job> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs
            .values()
            .any(|j| j.source_id == job.source_id || j.source_url == job.source_url)
        {
            return Err(IngestError::Conflict {
                entity: "job",
                key: job.source_id.clone(),
                attempts: 1,
            });
        }
        jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        let mut jobs = self.jobs.write().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(IngestError::NotFound {
                entity: "job",
                key: job.id.to_string(),
            });
        }
        jobs.insert(job.id, job.clone());
        Ok(job.clone())
    }

    async fn existing_source_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .jobs
            .read()
            .unwrap()
            .values()
            .map(|j| j.source_id.clone())
            .collect())
    }

    async fn existing_source_urls(&self) -> Result<HashSet<String>> {
        Ok(self
            .jobs
            .read()
            .unwrap()
            .values()
            .map(|j| j.source_url.clone())
            .collect())
    }

    async fn comparable_salaries(
        &self,
        normalized_title: &str,
        country: &str,
    ) -> Result<Vec<i64>> {
        Ok(self
            .jobs
            .read()
            .unwrap()
            .values()
            .filter(|j| j.country_code.as_deref() == Some(country))
            .filter(|j| normalize_title(&j.title) == normalized_title)
            .filter_map(|j| j.salary.as_ref())
            .filter(|s| !s.is_estimate)
            .filter_map(|s| to_usd(s.annual_midpoint(), &s.currency))
            .collect())
    }

    async fn count_jobs(&self) -> Result<usize> {
        Ok(self.jobs.read().unwrap().len())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn find_company_by_slug(&self, slug: &str) -> Result<Option<Company>> {
        Ok(self
            .companies
            .read()
            .unwrap()
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>> {
        let lowered = name.to_lowercase();
        Ok(self
            .companies
            .read()
            .unwrap()
            .values()
            .find(|c| c.name.to_lowercase() == lowered)
            .cloned())
    }

    async fn insert_company(&self, company: &Company) -> Result<Company> {
        let mut companies = self.companies.write().unwrap();
        if companies.values().any(|c| c.slug == company.slug) {
            return Err(IngestError::Conflict {
                entity: "company",
                key: company.slug.clone(),
                attempts: 1,
            });
        }
        companies.insert(company.id, company.clone());
        Ok(company.clone())
    }

    async fn update_company(&self, company: &Company) -> Result<Company> {
        let mut companies = self.companies.write().unwrap();
        if !companies.contains_key(&company.id) {
            return Err(IngestError::NotFound {
                entity: "company",
                key: company.id.to_string(),
            });
        }
        companies.insert(company.id, company.clone());
        Ok(company.clone())
    }
}

#[async_trait]
impl BenchmarkStore for MemoryStore {
    async fn get_benchmark(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>> {
        let key = Self::benchmark_key(normalized_title, country, region);
        Ok(self.benchmarks.read().unwrap().get(&key).cloned())
    }

    async fn store_benchmark(&self, benchmark: &SalaryBenchmark) -> Result<()> {
        let key = Self::benchmark_key(
            &benchmark.title,
            &benchmark.country,
            benchmark.region.as_deref(),
        );
        self.benchmarks.write().unwrap().insert(key, benchmark.clone());
        Ok(())
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn list_sources(&self) -> Result<Vec<IngestSource>> {
        let mut sources: Vec<_> = self.sources.read().unwrap().values().cloned().collect();
        sources.sort_by_key(|s| s.created_at);
        Ok(sources)
    }

    async fn upsert_source(&self, source: &IngestSource) -> Result<()> {
        self.sources
            .write()
            .unwrap()
            .insert(source.id, source.clone());
        Ok(())
    }

    async fn mark_source_run(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let mut sources = self.sources.write().unwrap();
        match sources.get_mut(&id) {
            Some(source) => {
                source.last_run_at = Some(at);
                Ok(())
            }
            None => Err(IngestError::NotFound {
                entity: "source",
                key: id.to_string(),
            }),
        }
    }

    async fn record_source_error(&self, id: Uuid) -> Result<()> {
        let mut sources = self.sources.write().unwrap();
        match sources.get_mut(&id) {
            Some(source) => {
                source.error_count += 1;
                Ok(())
            }
            None => Err(IngestError::NotFound {
                entity: "source",
                key: id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn record_rejections(&self, rejected: &[RejectedPosting]) -> Result<()> {
        self.rejections
            .write()
            .unwrap()
            .extend(rejected.iter().cloned());
        Ok(())
    }

    async fn rejection_count(&self) -> Result<usize> {
        Ok(self.rejections.read().unwrap().len())
    }
}
