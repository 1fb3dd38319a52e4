//! Filter pipeline engine: sequential stage runner + invariant verifier.

use std::collections::HashMap;
use tracing::{debug, error, info};

use crate::pipeline::stage::{FilterContext, FilterStage, StagePartition};
use crate::types::config::FilterConfig;
use crate::types::job::{FilterReason, FilterableJob, RejectedPosting};
use crate::pipeline::{AgeStage, DuplicateStage, WhitelistStage};

/// Per-stage counters for one run.
#[derive(Debug, Clone)]
pub struct StageStats {
    pub stage: &'static str,
    pub input: usize,
    pub passed: usize,
    pub rejected: usize,
    /// True when the stage errored and was failed open
    pub failed: bool,
}

/// The outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Jobs that survived every stage
    pub survivors: Vec<FilterableJob>,

    /// Every rejected job with its reason, in rejection order
    pub rejected: Vec<(FilterableJob, FilterReason)>,

    /// Counters per stage, in stage order
    pub stage_stats: Vec<StageStats>,

    /// Batch size the run started with
    pub total_input: usize,

    /// Whether the count invariant held for the run
    pub verified: bool,
}

impl PipelineReport {
    /// Rejection counts keyed by reason.
    pub fn rejected_by_reason(&self) -> HashMap<FilterReason, usize> {
        let mut counts = HashMap::new();
        for (_, reason) in &self.rejected {
            *counts.entry(*reason).or_insert(0) += 1;
        }
        counts
    }

    /// Audit records for every reject.
    pub fn audit_records(&self, company: &str) -> Vec<RejectedPosting> {
        self.rejected
            .iter()
            .map(|(job, reason)| RejectedPosting::from_job(job, company, *reason))
            .collect()
    }
}

/// Sequential stage runner.
///
/// A stage failure does not abort the batch: the engine logs an alarm and
/// treats every job offered to that stage as having passed unfiltered,
/// then proceeds. A bug in one filter must not block the entire source
/// from importing; a missed filter is recoverable, losing every job from
/// a working source is not.
#[derive(Default)]
pub struct FilterPipeline {
    stages: Vec<Box<dyn FilterStage>>,
}

impl FilterPipeline {
    /// An empty pipeline. Every batch passes until stages are added.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// The standard deterministic stage order: age, duplicate, whitelist.
    ///
    /// The AI relevance stage is appended separately by callers that have
    /// an AI service configured.
    pub fn standard(config: &FilterConfig) -> Self {
        Self::new()
            .with_stage(AgeStage::new(config.max_age_days))
            .with_stage(DuplicateStage::new())
            .with_stage(WhitelistStage::new(config.whitelist.clone()))
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: impl FilterStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Number of configured stages.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run every stage in order over one batch.
    pub async fn run(&self, jobs: Vec<FilterableJob>, ctx: &FilterContext) -> PipelineReport {
        let total_input = jobs.len();
        let mut remaining = jobs;
        let mut rejected: Vec<(FilterableJob, FilterReason)> = Vec::new();
        let mut stage_stats = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let input = remaining.len();
            // Kept aside so a failing stage can be failed open without
            // losing its input.
            let snapshot = remaining.clone();

            match stage.filter(remaining, ctx).await {
                Ok(partition) => {
                    if partition.total() != input {
                        error!(
                            source = %ctx.source_name,
                            stage = stage.name(),
                            input,
                            accounted = partition.total(),
                            "filter stage lost or invented jobs"
                        );
                    }

                    debug!(
                        source = %ctx.source_name,
                        stage = stage.name(),
                        input,
                        passed = partition.passed.len(),
                        rejected = partition.rejected.len(),
                        "stage complete"
                    );

                    stage_stats.push(StageStats {
                        stage: stage.name(),
                        input,
                        passed: partition.passed.len(),
                        rejected: partition.rejected.len(),
                        failed: false,
                    });

                    let StagePartition { passed, rejected: stage_rejected } = partition;
                    rejected.extend(stage_rejected);
                    remaining = passed;
                }
                Err(e) => {
                    error!(
                        source = %ctx.source_name,
                        stage = stage.name(),
                        error = %e,
                        "filter stage failed, passing batch through unfiltered"
                    );

                    stage_stats.push(StageStats {
                        stage: stage.name(),
                        input,
                        passed: input,
                        rejected: 0,
                        failed: true,
                    });

                    remaining = snapshot;
                }
            }
        }

        let verified = total_input == rejected.len() + remaining.len();
        if !verified {
            // Unreachable given fail-open semantics; a correctness alarm,
            // not a runtime abort.
            error!(
                source = %ctx.source_name,
                total_input,
                total_rejected = rejected.len(),
                total_passed = remaining.len(),
                "pipeline count invariant violated"
            );
        }

        info!(
            source = %ctx.source_name,
            total_input,
            passed = remaining.len(),
            rejected = rejected.len(),
            verified,
            "filter pipeline complete"
        );

        PipelineReport {
            survivors: remaining,
            rejected,
            stage_stats,
            total_input,
            verified,
        }
    }
}
