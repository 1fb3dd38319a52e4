//! Structured extraction for pipeline survivors.
//!
//! The AI extraction service is the primary path; deterministic
//! regex/keyword heuristics are the fallback so job creation never
//! blocks on a third-party outage. When the AI answers, its gaps are
//! still topped up from the heuristics, since the service routinely
//! leaves salary or seniority empty.

pub mod heuristics;
pub mod location;

use tracing::warn;

use crate::traits::ai::{ExtractedPosting, ExtractionAi};
use crate::types::job::RawPosting;

/// Extract structured fields from a survivor.
///
/// `ai = None` (no service configured) goes straight to heuristics.
pub async fn extract_posting<A: ExtractionAi>(
    ai: Option<&A>,
    raw: &RawPosting,
) -> ExtractedPosting {
    let heuristic = heuristics::extract(raw);

    if let Some(ai) = ai {
        match ai.extract_posting(&raw.body).await {
            Ok(extracted) => return merge(extracted, heuristic),
            Err(e) => {
                warn!(
                    url = %raw.url,
                    error = %e,
                    "extraction service unavailable, using heuristics"
                );
            }
        }
    }

    heuristic
}

/// Fill the AI response's gaps from the heuristic extraction.
fn merge(primary: ExtractedPosting, fallback: ExtractedPosting) -> ExtractedPosting {
    ExtractedPosting {
        title: primary.title.or(fallback.title),
        company: primary.company.or(fallback.company),
        is_remote: primary.is_remote,
        location: primary.location.or(fallback.location),
        salary_min: primary.salary_min.or(fallback.salary_min),
        salary_max: primary.salary_max.or(fallback.salary_max),
        salary_currency: primary.salary_currency.or(fallback.salary_currency),
        salary_period: primary.salary_period.or(fallback.salary_period),
        skills: if primary.skills.is_empty() {
            fallback.skills
        } else {
            primary.skills
        },
        level: primary.level.or(fallback.level),
        employment_type: primary.employment_type.or(fallback.employment_type),
        benefits: if primary.benefits.is_empty() {
            fallback.benefits
        } else {
            primary.benefits
        },
        contact_email: primary.contact_email.or(fallback.contact_email),
    }
}
