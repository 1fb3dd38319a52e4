//! Registered feed sources and their scheduling bookkeeping.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::job::SourceKind;

/// A registered feed the scheduler knows how to run.
///
/// Carries the per-source minimum interval and the error counter that
/// fetch failures increment. One source's failure never affects another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSource {
    pub id: Uuid,
    /// Human-readable name ("acme greenhouse board")
    pub name: String,
    pub kind: SourceKind,
    /// Feed endpoint URL
    pub endpoint: String,
    /// For single-employer feeds, the employer every posting belongs to
    pub company_name: Option<String>,
    /// Minimum minutes between runs
    pub min_interval_minutes: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub error_count: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl IngestSource {
    /// Register a new source with default scheduling (hourly).
    pub fn new(name: impl Into<String>, kind: SourceKind, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            endpoint: endpoint.into(),
            company_name: None,
            min_interval_minutes: 60,
            last_run_at: None,
            error_count: 0,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Set the employer hint for single-company feeds.
    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }

    /// Set the minimum interval between runs.
    pub fn with_min_interval_minutes(mut self, minutes: i64) -> Self {
        self.min_interval_minutes = minutes;
        self
    }

    /// Whether this source is due to run at `now`.
    ///
    /// A source that ran too recently is skipped, never queued.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        match self.last_run_at {
            None => true,
            Some(last) => now - last >= Duration::minutes(self.min_interval_minutes),
        }
    }
}
