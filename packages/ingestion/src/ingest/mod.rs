//! End-to-end source processing and the top-level scheduler.
//!
//! `Ingestor::process_source` drives one source's full run:
//! fetch → normalize → filter pipeline → per-survivor extraction,
//! classification, company resolution and salary fill → persistence →
//! best-effort notification. The `Scheduler` walks registered sources
//! strictly one at a time, honoring each source's minimum interval.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classify;
use crate::error::{IngestError, Result};
use crate::extract::{self, location};
use crate::pipeline::{FilterContext, FilterPipeline, RelevanceStage};
use crate::notify::notify_best_effort;
use crate::resolve;
use crate::salary::{estimate_range, SalaryEngine};
use crate::traits::ai::{ExtractedPosting, ExtractionAi};
use crate::traits::notify::Notifier;
use crate::traits::source::SourceAdapter;
use crate::traits::stats::WageStatsSource;
use crate::traits::store::IngestStore;
use crate::types::category::Category;
use crate::types::config::IngestionConfig;
use crate::types::job::{
    FilterReason, FilterableJob, Job, RawPosting, RejectedPosting, RemoteType, SourceKind,
};
use crate::types::salary::{SalaryPeriod, SalaryRange};
use crate::types::source::IngestSource;

/// Counters for one source run.
#[derive(Debug, Default)]
pub struct SourceRunReport {
    pub source: String,
    /// Raw postings the feed returned
    pub fetched: usize,
    /// New canonical jobs persisted
    pub created: usize,
    /// Known jobs whose content changed and was re-extracted
    pub updated: usize,
    /// Known jobs re-fetched without any content change
    pub unchanged: usize,
    /// Survivors that could not be persisted
    pub failed: usize,
    /// Pipeline rejections keyed by reason
    pub rejected_by_reason: HashMap<FilterReason, usize>,
    /// Whether the pipeline count invariant held
    pub verified: bool,
}

impl SourceRunReport {
    /// Total pipeline rejections.
    pub fn rejected(&self) -> usize {
        self.rejected_by_reason.values().sum()
    }
}

/// What persisting one survivor amounted to.
enum PersistOutcome {
    Created(Job),
    Updated(Job),
    Unchanged,
}

/// Everything the analysis passes decided about one posting.
struct Analysis {
    extracted: ExtractedPosting,
    title: String,
    category: Category,
    remote_type: RemoteType,
    country_code: Option<String>,
}

/// The end-to-end source processor.
///
/// Owns the filter pipeline configuration, the AI seam, the salary
/// engine and the downstream notifier. Generic over the store so runs
/// execute against `MemoryStore` in tests and the production backend
/// unchanged.
pub struct Ingestor<S, A> {
    store: Arc<S>,
    ai: Option<Arc<A>>,
    notifier: Option<Arc<dyn Notifier>>,
    salary: SalaryEngine<S>,
    config: IngestionConfig,
}

impl<S, A> Ingestor<S, A>
where
    S: IngestStore + 'static,
    A: ExtractionAi + 'static,
{
    pub fn new(store: Arc<S>, config: IngestionConfig) -> Self {
        let salary = SalaryEngine::new(store.clone(), config.salary.clone());
        Self {
            store,
            ai: None,
            notifier: None,
            salary,
            config,
        }
    }

    /// Attach the AI extraction service.
    pub fn with_ai(mut self, ai: Arc<A>) -> Self {
        self.ai = Some(ai);
        self
    }

    /// Attach the downstream notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Attach the domestic authoritative wage statistics source.
    pub fn with_domestic_stats(mut self, source: Arc<dyn WageStatsSource>) -> Self {
        self.salary = self.salary.with_domestic(source);
        self
    }

    /// Attach the secondary international wage statistics source.
    pub fn with_international_stats(mut self, source: Arc<dyn WageStatsSource>) -> Self {
        self.salary = self.salary.with_international(source);
        self
    }

    /// Run one source end to end.
    ///
    /// A fetch failure is fatal to this run only and surfaces as an
    /// error; everything after the fetch degrades per posting instead
    /// of failing the run.
    pub async fn process_source(&self, adapter: &dyn SourceAdapter) -> Result<SourceRunReport> {
        let raw = adapter.fetch().await?;

        let mut report = SourceRunReport {
            source: adapter.name().to_string(),
            fetched: raw.len(),
            ..Default::default()
        };

        let existing_ids = self.store.existing_source_ids().await?;
        let existing_urls = self.store.existing_source_urls().await?;
        let ctx = FilterContext::new(adapter.name())
            .with_company(adapter.company_hint().unwrap_or_default())
            .with_existing(existing_ids, existing_urls);

        let jobs: Vec<FilterableJob> = raw.into_iter().map(Into::into).collect();

        let mut pipeline = FilterPipeline::standard(&self.config.filter);
        if self.config.filter.ai_relevance_enabled {
            if let Some(ai) = &self.ai {
                pipeline = pipeline.with_stage(RelevanceStage::new(
                    ai.clone(),
                    self.config.filter.ai_calls_per_minute,
                ));
            }
        }

        let pipeline_report = pipeline.run(jobs, &ctx).await;
        report.verified = pipeline_report.verified;
        report.rejected_by_reason = pipeline_report.rejected_by_reason();
        self.store
            .record_rejections(&pipeline_report.audit_records(&ctx.company))
            .await?;

        // A rejected duplicate may still be a re-fetch whose content
        // changed; those are updated in place with re-extraction.
        for (job, reason) in &pipeline_report.rejected {
            if *reason != FilterReason::Duplicate {
                continue;
            }
            match self.refresh_known(job).await {
                Ok(true) => report.updated += 1,
                Ok(false) => report.unchanged += 1,
                Err(e) => {
                    warn!(
                        source = %ctx.source_name,
                        url = %job.source_url,
                        error = %e,
                        "failed to refresh known posting"
                    );
                    report.failed += 1;
                }
            }
        }

        for job in &pipeline_report.survivors {
            match self
                .persist_survivor(job, &ctx.company, adapter.kind())
                .await
            {
                Ok(PersistOutcome::Created(created)) => {
                    report.created += 1;
                    if let Some(notifier) = &self.notifier {
                        notify_best_effort(notifier, &created, false).await;
                    }
                }
                Ok(PersistOutcome::Updated(updated)) => {
                    report.updated += 1;
                    if let Some(notifier) = &self.notifier {
                        notify_best_effort(notifier, &updated, true).await;
                    }
                }
                Ok(PersistOutcome::Unchanged) => {
                    report.unchanged += 1;
                    *report
                        .rejected_by_reason
                        .entry(FilterReason::Duplicate)
                        .or_insert(0) += 1;
                    self.store
                        .record_rejections(&[RejectedPosting::from_job(
                            job,
                            &ctx.company,
                            FilterReason::Duplicate,
                        )])
                        .await?;
                }
                Err(e) => {
                    warn!(
                        source = %ctx.source_name,
                        url = %job.source_url,
                        error = %e,
                        "failed to persist survivor"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            source = %report.source,
            fetched = report.fetched,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            rejected = report.rejected(),
            failed = report.failed,
            "source run complete"
        );

        Ok(report)
    }

    /// Extraction, classification and remote inference for one posting.
    async fn analyze(&self, raw: &RawPosting) -> Analysis {
        let extracted = extract::extract_posting(self.ai.as_deref(), raw).await;
        let title = extracted
            .title
            .clone()
            .unwrap_or_else(|| raw.title.clone());
        let category = classify::classify(self.ai.as_deref(), &title, &extracted.skills).await;
        let remote_type = location::infer_remote_type(self.ai.as_deref(), raw).await;

        let country_code = raw
            .location
            .as_deref()
            .and_then(location::country_from_location)
            .or_else(|| matches!(remote_type, RemoteType::RemoteUs).then(|| "US".to_string()));

        Analysis {
            extracted,
            title,
            category,
            remote_type,
            country_code,
        }
    }

    /// The posting's stated salary range, or an estimate from the
    /// benchmark chain when it states none.
    async fn salary_for(&self, analysis: &Analysis) -> Result<SalaryRange> {
        let extracted = &analysis.extracted;
        if let (Some(min), Some(max)) = (extracted.salary_min, extracted.salary_max) {
            if extracted.has_salary() {
                return Ok(SalaryRange::stated(
                    min,
                    max,
                    extracted.salary_currency.as_deref().unwrap_or("USD"),
                    extracted.salary_period.unwrap_or(SalaryPeriod::Year),
                ));
            }
        }

        let country = analysis
            .country_code
            .as_deref()
            .unwrap_or(&self.config.salary.home_country);
        let benchmark = self
            .salary
            .estimate(
                &analysis.title,
                country,
                None,
                analysis.category,
                extracted.level.unwrap_or_default(),
            )
            .await?;
        Ok(estimate_range(&benchmark))
    }

    /// Persist one pipeline survivor, creating or refreshing as needed.
    async fn persist_survivor(
        &self,
        job: &FilterableJob,
        company_hint: &str,
        kind: SourceKind,
    ) -> Result<PersistOutcome> {
        // The dedup snapshot was loaded before the run; a same-batch
        // sibling or a concurrent writer may have beaten us here.
        if let Some(existing) = self
            .store
            .find_job_by_source(&job.id, &job.source_url)
            .await?
        {
            return self.refresh_existing(existing, &job.raw).await;
        }

        let analysis = self.analyze(&job.raw).await;
        let salary = self.salary_for(&analysis).await?;

        let company_name = analysis
            .extracted
            .company
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| {
                let hint = company_hint.trim();
                (!hint.is_empty()).then(|| hint.to_string())
            })
            .unwrap_or_else(|| "Unknown".to_string());
        let company = resolve::resolve_company(self.store.as_ref(), &company_name, None).await?;
        resolve::spawn_enrichment(self.store.clone(), company.clone());

        let now = Utc::now();
        let new_job = Job {
            id: Uuid::new_v4(),
            quality_score: quality_score(&analysis.extracted, &job.raw.body),
            content_hash: Job::content_hash_of(&job.raw.title, &job.raw.body),
            title: analysis.title,
            description: job.raw.body.clone(),
            company_id: company.id,
            category: analysis.category,
            location: job.raw.location.clone(),
            remote_type: analysis.remote_type,
            country_code: analysis.country_code,
            seniority: analysis.extracted.level.unwrap_or_default(),
            employment_type: analysis.extracted.employment_type.unwrap_or_default(),
            salary: Some(salary),
            skills: analysis.extracted.skills,
            benefits: analysis.extracted.benefits,
            source_kind: kind,
            source_id: job.id.clone(),
            source_url: job.source_url.clone(),
            posted_at: job.posted_at,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_job(&new_job).await {
            Ok(created) => {
                debug!(title = %created.title, url = %created.source_url, "job created");
                Ok(PersistOutcome::Created(created))
            }
            // Lost a race: the record exists now, which is what matters.
            Err(IngestError::Conflict { .. }) => Ok(PersistOutcome::Unchanged),
            Err(e) => Err(e),
        }
    }

    /// Refresh a posting the dedup stage recognized, updating the stored
    /// job in place when its content changed.
    async fn refresh_known(&self, job: &FilterableJob) -> Result<bool> {
        let Some(existing) = self
            .store
            .find_job_by_source(&job.id, &job.source_url)
            .await?
        else {
            // In the snapshot but gone from the store; housekeeping's
            // problem, not ours.
            return Ok(false);
        };

        match self.refresh_existing(existing, &job.raw).await? {
            PersistOutcome::Updated(updated) => {
                if let Some(notifier) = &self.notifier {
                    notify_best_effort(notifier, &updated, true).await;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Re-extract and update a stored job if the raw content changed.
    ///
    /// The change hash covers the raw title and body, not the extracted
    /// ones, so an AI title rewrite does not look like a feed change.
    async fn refresh_existing(&self, existing: Job, raw: &RawPosting) -> Result<PersistOutcome> {
        let content_hash = Job::content_hash_of(&raw.title, &raw.body);
        if content_hash == existing.content_hash {
            return Ok(PersistOutcome::Unchanged);
        }

        let analysis = self.analyze(raw).await;

        let mut updated = existing;
        updated.title = analysis.title.clone();
        updated.description = raw.body.clone();
        updated.category = analysis.category;
        updated.location = raw.location.clone();
        updated.remote_type = analysis.remote_type;
        updated.country_code = analysis.country_code.clone();
        updated.seniority = analysis.extracted.level.unwrap_or_default();
        updated.employment_type = analysis.extracted.employment_type.unwrap_or_default();
        if analysis.extracted.has_salary() {
            updated.salary = Some(self.salary_for(&analysis).await?);
        }
        updated.skills = analysis.extracted.skills.clone();
        updated.benefits = analysis.extracted.benefits.clone();
        updated.quality_score = quality_score(&analysis.extracted, &raw.body);
        updated.content_hash = content_hash;
        updated.updated_at = Utc::now();

        let stored = self.store.update_job(&updated).await?;
        debug!(title = %stored.title, url = %stored.source_url, "job updated");
        Ok(PersistOutcome::Updated(stored))
    }
}

/// How complete a posting's data is, 0 to 1.
///
/// Consumers sort listings by this; it is a ranking signal, not a gate.
fn quality_score(extracted: &ExtractedPosting, body: &str) -> f32 {
    let mut score: f32 = 0.2;
    if body.len() > 400 {
        score += 0.2;
    } else if body.len() > 100 {
        score += 0.1;
    }
    if extracted.has_salary() {
        score += 0.25;
    }
    if !extracted.skills.is_empty() {
        score += 0.15;
    }
    if !extracted.benefits.is_empty() {
        score += 0.1;
    }
    if extracted.contact_email.is_some() {
        score += 0.1;
    }
    score.min(1.0)
}

/// Outcome of one scheduler pass.
#[derive(Debug, Default)]
pub struct SchedulerOutcome {
    /// Reports from sources that ran, in registration order
    pub reports: Vec<SourceRunReport>,
    /// Sources skipped because they ran too recently
    pub skipped: usize,
    /// Sources whose run failed
    pub failed: usize,
}

/// Sequential source scheduler.
///
/// Sources run strictly one at a time. One source's failure increments
/// its error counter and never affects the others.
pub struct Scheduler<S, A> {
    store: Arc<S>,
    ingestor: Ingestor<S, A>,
    adapters: Vec<(Uuid, Arc<dyn SourceAdapter>)>,
}

impl<S, A> Scheduler<S, A>
where
    S: IngestStore + 'static,
    A: ExtractionAi + 'static,
{
    pub fn new(store: Arc<S>, ingestor: Ingestor<S, A>) -> Self {
        Self {
            store,
            ingestor,
            adapters: Vec::new(),
        }
    }

    /// Register a source and the adapter that serves it.
    pub async fn register(
        &mut self,
        source: IngestSource,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<()> {
        self.store.upsert_source(&source).await?;
        self.adapters.push((source.id, adapter));
        Ok(())
    }

    /// Walk every registered source once, skipping those not yet due.
    pub async fn run_once(&self) -> SchedulerOutcome {
        let now = Utc::now();
        let mut outcome = SchedulerOutcome::default();

        let sources = match self.store.list_sources().await {
            Ok(sources) => sources,
            Err(e) => {
                error!(error = %e, "could not load source records, skipping pass");
                return outcome;
            }
        };
        let by_id: HashMap<Uuid, &IngestSource> = sources.iter().map(|s| (s.id, s)).collect();

        for (id, adapter) in &self.adapters {
            let Some(source) = by_id.get(id) else {
                continue;
            };
            if !source.is_due_at(now) {
                debug!(source = %source.name, "ran too recently, skipping");
                outcome.skipped += 1;
                continue;
            }

            match self.ingestor.process_source(adapter.as_ref()).await {
                Ok(report) => {
                    if let Err(e) = self.store.mark_source_run(*id, now).await {
                        error!(source = %source.name, error = %e, "could not stamp source run");
                    }
                    outcome.reports.push(report);
                }
                Err(e) => {
                    error!(source = %source.name, error = %e, "source run failed");
                    if let Err(e) = self.store.record_source_error(*id).await {
                        error!(source = %source.name, error = %e, "could not record source error");
                    }
                    // A broken feed keeps its normal cadence instead of
                    // being retried in a tight loop.
                    if let Err(e) = self.store.mark_source_run(*id, now).await {
                        error!(source = %source.name, error = %e, "could not stamp source run");
                    }
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}
