//! Job records: the raw per-source shape, the in-pipeline projection,
//! the rejection audit record, and the canonical persisted job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::category::Category;
use crate::types::salary::SalaryRange;

/// Kind of external source a posting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Structured applicant-tracking-system API (JSON records)
    Ats,
    /// RSS/XML feed
    Rss,
    /// Free-text forum comment stream
    Forum,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Ats => "ats",
            SourceKind::Rss => "rss",
            SourceKind::Forum => "forum",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ats" => Some(SourceKind::Ats),
            "rss" => Some(SourceKind::Rss),
            "forum" => Some(SourceKind::Forum),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized raw posting as emitted by a source adapter.
///
/// Adapters parse their own wire shape (ATS JSON record, RSS item, forum
/// comment) into this unified form. Never persisted as-is; it lives only
/// for the duration of one source run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPosting {
    /// Source-assigned identifier (ATS posting id, RSS guid, comment id)
    pub external_id: String,

    /// Posting title as published
    pub title: String,

    /// Canonical URL of the posting
    pub url: String,

    /// Free-text location string if the source provides one
    pub location: Option<String>,

    /// Explicit structured workplace-type field ("remote", "hybrid",
    /// "on_site") when the source has one; most do not
    pub workplace_type: Option<String>,

    /// Publication timestamp if known
    pub posted_at: Option<DateTime<Utc>>,

    /// Full posting text (markup already reduced to plain text)
    pub body: String,

    /// Posting author, for forum-style sources
    pub author: Option<String>,

    /// Source-specific extras (department, feed category tags, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl RawPosting {
    /// Create a raw posting with the required identity fields.
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            url: url.into(),
            location: None,
            workplace_type: None,
            posted_at: None,
            body: String::new(),
            author: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the location string.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the structured workplace-type field.
    pub fn with_workplace_type(mut self, workplace_type: impl Into<String>) -> Self {
        self.workplace_type = Some(workplace_type.into());
        self
    }

    /// Set the publication timestamp.
    pub fn with_posted_at(mut self, posted_at: DateTime<Utc>) -> Self {
        self.posted_at = Some(posted_at);
        self
    }

    /// Set the posting body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Minimal projection of a posting used inside the filter pipeline.
///
/// Carries its originating [`RawPosting`] so survivors can go through
/// full extraction without a second fetch.
#[derive(Debug, Clone)]
pub struct FilterableJob {
    /// Source-assigned identifier
    pub id: String,

    /// Posting title
    pub title: String,

    /// Canonical posting URL
    pub source_url: String,

    /// Free-text location, if any
    pub location: Option<String>,

    /// Publication timestamp, if known
    pub posted_at: Option<DateTime<Utc>>,

    /// The originating raw posting
    pub raw: RawPosting,
}

impl From<RawPosting> for FilterableJob {
    fn from(raw: RawPosting) -> Self {
        Self {
            id: raw.external_id.clone(),
            title: raw.title.clone(),
            source_url: raw.url.clone(),
            location: raw.location.clone(),
            posted_at: raw.posted_at,
            raw,
        }
    }
}

/// Closed set of reasons a posting can be rejected by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    TooOld,
    Duplicate,
    NonTargetTitle,
    AiRejected,
    NoEmail,
    Spam,
    Other,
}

impl FilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterReason::TooOld => "too_old",
            FilterReason::Duplicate => "duplicate",
            FilterReason::NonTargetTitle => "non_target_title",
            FilterReason::AiRejected => "ai_rejected",
            FilterReason::NoEmail => "no_email",
            FilterReason::Spam => "spam",
            FilterReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "too_old" => Some(FilterReason::TooOld),
            "duplicate" => Some(FilterReason::Duplicate),
            "non_target_title" => Some(FilterReason::NonTargetTitle),
            "ai_rejected" => Some(FilterReason::AiRejected),
            "no_email" => Some(FilterReason::NoEmail),
            "spam" => Some(FilterReason::Spam),
            "other" => Some(FilterReason::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record written for every rejected posting, never for survivors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedPosting {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub source_url: String,
    pub reason: FilterReason,
    pub rejected_at: DateTime<Utc>,
}

impl RejectedPosting {
    /// Build an audit record from a filtered job and the company context.
    pub fn from_job(job: &FilterableJob, company: &str, reason: FilterReason) -> Self {
        Self {
            title: job.title.clone(),
            company: company.to_string(),
            location: job.location.clone(),
            source_url: job.source_url.clone(),
            reason,
            rejected_at: Utc::now(),
        }
    }
}

/// How a job relates to physical presence.
///
/// Region-restricted remote is modeled explicitly so a "US only" remote
/// posting is distinguishable from globally-remote work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteType {
    /// Remote with no stated region restriction
    Remote,
    /// Remote, restricted to the United States
    RemoteUs,
    /// Remote, restricted to Europe
    RemoteEurope,
    /// Split between office and remote
    Hybrid,
    /// On site
    Onsite,
}

impl RemoteType {
    /// Whether the job belongs in a remote-only catalog.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            RemoteType::Remote | RemoteType::RemoteUs | RemoteType::RemoteEurope
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteType::Remote => "remote",
            RemoteType::RemoteUs => "remote_us",
            RemoteType::RemoteEurope => "remote_europe",
            RemoteType::Hybrid => "hybrid",
            RemoteType::Onsite => "onsite",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "remote" => Some(RemoteType::Remote),
            "remote_us" => Some(RemoteType::RemoteUs),
            "remote_europe" => Some(RemoteType::RemoteEurope),
            "hybrid" => Some(RemoteType::Hybrid),
            "onsite" => Some(RemoteType::Onsite),
            _ => None,
        }
    }
}

/// Seniority ladder, orderable from intern to executive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Intern,
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Manager,
    Director,
    Executive,
}

impl Default for SeniorityLevel {
    fn default() -> Self {
        Self::Mid
    }
}

impl SeniorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeniorityLevel::Intern => "intern",
            SeniorityLevel::Entry => "entry",
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Mid => "mid",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Lead => "lead",
            SeniorityLevel::Manager => "manager",
            SeniorityLevel::Director => "director",
            SeniorityLevel::Executive => "executive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "intern" => Some(SeniorityLevel::Intern),
            "entry" => Some(SeniorityLevel::Entry),
            "junior" => Some(SeniorityLevel::Junior),
            "mid" => Some(SeniorityLevel::Mid),
            "senior" => Some(SeniorityLevel::Senior),
            "lead" => Some(SeniorityLevel::Lead),
            "manager" => Some(SeniorityLevel::Manager),
            "director" => Some(SeniorityLevel::Director),
            "executive" => Some(SeniorityLevel::Executive),
            _ => None,
        }
    }
}

/// Employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl Default for EmploymentType {
    fn default() -> Self {
        Self::FullTime
    }
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full_time" => Some(EmploymentType::FullTime),
            "part_time" => Some(EmploymentType::PartTime),
            "contract" => Some(EmploymentType::Contract),
            "internship" => Some(EmploymentType::Internship),
            _ => None,
        }
    }
}

/// The canonical, persisted job record.
///
/// Created once per unique source id or source URL; updated in place when
/// the title or description changes on a re-fetch; never hard-deleted by
/// this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_id: Uuid,
    pub category: Category,
    pub location: Option<String>,
    pub remote_type: RemoteType,
    pub country_code: Option<String>,
    pub seniority: SeniorityLevel,
    pub employment_type: EmploymentType,
    pub salary: Option<SalaryRange>,
    pub skills: Vec<String>,
    pub benefits: Vec<String>,
    pub source_kind: SourceKind,
    pub source_id: String,
    pub source_url: String,
    pub quality_score: f32,
    /// Hash of title + description, used to detect content changes on re-fetch
    pub content_hash: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Hash of the change-relevant content (title + description).
    pub fn content_hash_of(title: &str, description: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b"\n");
        hasher.update(description.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_posting_builder() {
        let raw = RawPosting::new("42", "Backend Engineer", "https://example.com/jobs/42")
            .with_location("Berlin, Germany")
            .with_workplace_type("remote")
            .with_body("We are hiring.")
            .with_metadata("department", "Engineering");

        assert_eq!(raw.external_id, "42");
        assert_eq!(raw.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(raw.workplace_type.as_deref(), Some("remote"));
        assert_eq!(raw.metadata.get("department").map(String::as_str), Some("Engineering"));
    }

    #[test]
    fn test_filterable_projection_keeps_raw() {
        let raw = RawPosting::new("7", "Data Engineer", "https://example.com/jobs/7")
            .with_body("Long body text");
        let job = FilterableJob::from(raw);

        assert_eq!(job.id, "7");
        assert_eq!(job.source_url, "https://example.com/jobs/7");
        assert_eq!(job.raw.body, "Long body text");
    }

    #[test]
    fn test_content_hash_changes_with_description() {
        let a = Job::content_hash_of("Engineer", "desc one");
        let b = Job::content_hash_of("Engineer", "desc two");
        let c = Job::content_hash_of("Engineer", "desc one");

        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_remote_catalog_membership() {
        assert!(RemoteType::Remote.is_remote());
        assert!(RemoteType::RemoteUs.is_remote());
        assert!(!RemoteType::Hybrid.is_remote());
        assert!(!RemoteType::Onsite.is_remote());
    }

    #[test]
    fn test_seniority_orders_by_ladder() {
        assert!(SeniorityLevel::Intern < SeniorityLevel::Junior);
        assert!(SeniorityLevel::Senior < SeniorityLevel::Lead);
        assert!(SeniorityLevel::Director < SeniorityLevel::Executive);
    }
}
