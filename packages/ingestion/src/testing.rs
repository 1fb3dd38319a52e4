//! Testing utilities including mock implementations.
//!
//! Deterministic, scriptable stand-ins for every external seam: the AI
//! service, wage statistics sources, feed adapters, and the downstream
//! notifier. All of them track their calls so tests can assert on how
//! often (and whether) an external service was reached.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{FetchError, FetchResult, IngestError, Result};
use crate::traits::ai::{ExtractedPosting, ExtractionAi};
use crate::traits::notify::Notifier;
use crate::traits::source::SourceAdapter;
use crate::traits::stats::WageStatsSource;
use crate::types::job::{Job, RawPosting, SourceKind};
use crate::types::salary::SalaryBenchmark;

/// Record of a call made to [`MockAi`].
#[derive(Debug, Clone)]
pub enum MockAiCall {
    Extract { text_len: usize },
    Classify { title: String },
    Relevance { title: String },
    InferRemote { location: String },
}

/// A mock AI service with scriptable responses.
///
/// Unscripted inputs get permissive defaults: an empty extraction, an
/// empty (therefore invalid) category label, a positive relevance
/// verdict, and a negative remote verdict. `failing()` makes every
/// method error, for exercising the heuristic fallbacks.
#[derive(Default)]
pub struct MockAi {
    extractions: RwLock<HashMap<String, ExtractedPosting>>,
    categories: RwLock<HashMap<String, String>>,
    relevance: RwLock<HashMap<String, bool>>,
    remote_verdicts: RwLock<HashMap<String, bool>>,
    fail: bool,
    calls: RwLock<Vec<MockAiCall>>,
}

impl MockAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every method return an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Script the extraction returned for an exact posting text.
    pub fn with_extraction(self, text: impl Into<String>, extracted: ExtractedPosting) -> Self {
        self.extractions.write().unwrap().insert(text.into(), extracted);
        self
    }

    /// Script the category label returned for an exact title.
    ///
    /// The label is returned as-is, valid or not; enum validation is the
    /// caller's job and scripting an invalid label exercises it.
    pub fn with_category(self, title: impl Into<String>, slug: impl Into<String>) -> Self {
        self.categories.write().unwrap().insert(title.into(), slug.into());
        self
    }

    /// Script the relevance verdict for an exact title.
    pub fn with_relevance(self, title: impl Into<String>, relevant: bool) -> Self {
        self.relevance.write().unwrap().insert(title.into(), relevant);
        self
    }

    /// Script the remote verdict for an exact location string.
    pub fn with_remote_verdict(self, location: impl Into<String>, remote: bool) -> Self {
        self.remote_verdicts
            .write()
            .unwrap()
            .insert(location.into(), remote);
        self
    }

    /// All calls made to this mock, in order.
    pub fn calls(&self) -> Vec<MockAiCall> {
        self.calls.read().unwrap().clone()
    }

    /// Total calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    fn failure() -> IngestError {
        IngestError::Ai("mock AI configured to fail".into())
    }
}

#[async_trait]
impl ExtractionAi for MockAi {
    async fn extract_posting(&self, text: &str) -> Result<ExtractedPosting> {
        self.calls.write().unwrap().push(MockAiCall::Extract {
            text_len: text.len(),
        });
        if self.fail {
            return Err(Self::failure());
        }
        Ok(self
            .extractions
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_default())
    }

    async fn classify_category(&self, title: &str, _skills: &[String]) -> Result<String> {
        self.calls.write().unwrap().push(MockAiCall::Classify {
            title: title.to_string(),
        });
        if self.fail {
            return Err(Self::failure());
        }
        Ok(self
            .categories
            .read()
            .unwrap()
            .get(title)
            .cloned()
            .unwrap_or_default())
    }

    async fn is_relevant(&self, title: &str, _excerpt: &str) -> Result<bool> {
        self.calls.write().unwrap().push(MockAiCall::Relevance {
            title: title.to_string(),
        });
        if self.fail {
            return Err(Self::failure());
        }
        Ok(self
            .relevance
            .read()
            .unwrap()
            .get(title)
            .copied()
            .unwrap_or(true))
    }

    async fn infer_remote(&self, location: &str) -> Result<bool> {
        self.calls.write().unwrap().push(MockAiCall::InferRemote {
            location: location.to_string(),
        });
        if self.fail {
            return Err(Self::failure());
        }
        Ok(self
            .remote_verdicts
            .read()
            .unwrap()
            .get(location)
            .copied()
            .unwrap_or(false))
    }
}

/// A mock wage statistics source.
///
/// Scripted per `(normalized title, country)`: an average annual USD
/// figure is expanded into a full percentile benchmark tagged with this
/// source's name. Coverage defaults to exactly the scripted markets.
pub struct MockWageStats {
    name: String,
    benchmarks: RwLock<HashMap<(String, String), i64>>,
    cover_all: bool,
    fail: bool,
    calls: AtomicUsize,
}

impl MockWageStats {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            benchmarks: RwLock::new(HashMap::new()),
            cover_all: false,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Script a benchmark: the average is expanded into a plausible
    /// percentile spread.
    pub fn with_benchmark(
        self,
        normalized_title: impl Into<String>,
        country: impl Into<String>,
        avg_annual_usd: i64,
    ) -> Self {
        self.benchmarks
            .write()
            .unwrap()
            .insert((normalized_title.into(), country.into()), avg_annual_usd);
        self
    }

    /// Claim coverage of every country, not just the scripted ones.
    pub fn covering_everything(mut self) -> Self {
        self.cover_all = true;
        self
    }

    /// Make every fetch return an error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// How many times `fetch_benchmark` was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WageStatsSource for MockWageStats {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, country: &str) -> bool {
        self.cover_all
            || self
                .benchmarks
                .read()
                .unwrap()
                .keys()
                .any(|(_, c)| c == country)
    }

    async fn fetch_benchmark(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IngestError::Stats("mock statistics source down".into()));
        }

        let key = (normalized_title.to_string(), country.to_string());
        let avg = match self.benchmarks.read().unwrap().get(&key) {
            Some(avg) => *avg,
            None => return Ok(None),
        };

        Ok(Some(SalaryBenchmark {
            title: normalized_title.to_string(),
            country: country.to_string(),
            region: region.map(String::from),
            min: (avg as f64 * 0.75).round() as i64,
            max: (avg as f64 * 1.3).round() as i64,
            avg,
            median: avg,
            percentile25: (avg as f64 * 0.85).round() as i64,
            percentile75: (avg as f64 * 1.15).round() as i64,
            sample_size: 25,
            source: self.name.clone(),
            computed_at: chrono::Utc::now(),
        }))
    }
}

/// A feed adapter serving a fixed batch of postings without network I/O.
///
/// Postings can be swapped between runs (`set_postings`) to simulate a
/// feed changing across fetches, and the adapter can be made to fail to
/// exercise the per-source error path.
pub struct StaticAdapter {
    name: String,
    kind: SourceKind,
    company: Option<String>,
    postings: RwLock<Vec<RawPosting>>,
    fail: RwLock<bool>,
    fetches: AtomicUsize,
}

impl StaticAdapter {
    pub fn new(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            company: None,
            postings: RwLock::new(Vec::new()),
            fail: RwLock::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Set the employer hint.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Replace the served batch.
    pub fn with_postings(self, postings: Vec<RawPosting>) -> Self {
        *self.postings.write().unwrap() = postings;
        self
    }

    /// Append one posting to the served batch.
    pub fn with_posting(self, posting: RawPosting) -> Self {
        self.postings.write().unwrap().push(posting);
        self
    }

    /// Make every fetch fail.
    pub fn failing(self) -> Self {
        *self.fail.write().unwrap() = true;
        self
    }

    /// Swap the served batch between runs.
    pub fn set_postings(&self, postings: Vec<RawPosting>) {
        *self.postings.write().unwrap() = postings;
    }

    /// Toggle fetch failure between runs.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.write().unwrap() = fail;
    }

    /// How many times `fetch` was called.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for StaticAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn company_hint(&self) -> Option<&str> {
        self.company.as_deref()
    }

    async fn fetch(&self) -> FetchResult<Vec<RawPosting>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.fail.read().unwrap() {
            return Err(FetchError::Status {
                url: format!("static://{}", self.name),
                status: 503,
            });
        }
        Ok(self.postings.read().unwrap().clone())
    }
}

/// A notifier that records what it was told instead of delivering it.
#[derive(Default)]
pub struct MockNotifier {
    published: RwLock<Vec<String>>,
    updated: RwLock<Vec<String>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notification fail, for exercising the logged-and-ignored
    /// delivery path.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Titles of jobs announced as published, in order.
    pub fn published(&self) -> Vec<String> {
        self.published.read().unwrap().clone()
    }

    /// Titles of jobs announced as updated, in order.
    pub fn updated(&self) -> Vec<String> {
        self.updated.read().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn job_published(&self, job: &Job) -> Result<()> {
        self.published.write().unwrap().push(job.title.clone());
        if self.fail {
            return Err(IngestError::Notify("mock notifier down".into()));
        }
        Ok(())
    }

    async fn job_updated(&self, job: &Job) -> Result<()> {
        self.updated.write().unwrap().push(job.title.clone());
        if self.fail {
            return Err(IngestError::Notify("mock notifier down".into()));
        }
        Ok(())
    }
}
