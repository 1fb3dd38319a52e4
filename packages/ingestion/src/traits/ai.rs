//! AI service trait for extraction, classification, and relevance checks.
//!
//! A null/invalid response from an implementation must never propagate as
//! a crash: every caller has a deterministic heuristic fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::job::{EmploymentType, SeniorityLevel};
use crate::types::salary::SalaryPeriod;

/// Structured fields extracted from free-form posting text.
///
/// This mirrors the fixed response schema of the extraction service.
/// Everything is optional; absent fields are filled by heuristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub is_remote: Option<bool>,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<SalaryPeriod>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub level: Option<SeniorityLevel>,
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub contact_email: Option<String>,
}

impl ExtractedPosting {
    /// Whether the response carries a usable salary range.
    pub fn has_salary(&self) -> bool {
        matches!((self.salary_min, self.salary_max), (Some(min), Some(max)) if min > 0 && max >= min)
    }
}

/// AI operations the ingestion pipeline depends on.
///
/// Implementations wrap a specific provider and handle prompting and
/// response parsing. All methods are called strictly sequentially.
#[async_trait]
pub trait ExtractionAi: Send + Sync {
    /// Extract structured posting fields from free-form text.
    async fn extract_posting(&self, text: &str) -> Result<ExtractedPosting>;

    /// Pick a category slug for a job title and skill list.
    ///
    /// The returned slug is validated against the closed category set by
    /// the caller; anything outside it triggers the keyword fallback.
    async fn classify_category(&self, title: &str, skills: &[String]) -> Result<String>;

    /// Confirm a posting is topically relevant to the board.
    async fn is_relevant(&self, title: &str, excerpt: &str) -> Result<bool>;

    /// Judge whether an ambiguous location string describes remote work.
    ///
    /// Only consulted when the deterministic location chain cannot decide.
    async fn infer_remote(&self, location: &str) -> Result<bool>;
}
