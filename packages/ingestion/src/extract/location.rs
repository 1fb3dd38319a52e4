//! Remote/location inference.
//!
//! A strict priority chain, evaluated in order, first match wins:
//!
//! 1. explicit structured workplace-type field from the source
//! 2. remote/hybrid keywords in the free-text location (narrowed to
//!    region-restricted remote when a qualifier like "US only" is present)
//! 3. physical-address pattern (city + region/country token) → onsite
//! 4. AI-inferred remote flag, only for ambiguous strings
//! 5. default onsite
//!
//! A remote-only catalog must be conservative: a false onsite only hides
//! a job, a false remote pollutes the catalog, so ambiguity defaults to
//! exclusion. The default-onsite policy is a documented heuristic, not a
//! validated classifier.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::traits::ai::ExtractionAi;
use crate::types::job::{RawPosting, RemoteType};

lazy_static! {
    /// "City, ST" / "City, Country" shapes: a capitalized token, a comma,
    /// and a region token (state abbreviation or capitalized word).
    static ref PHYSICAL_ADDRESS: Regex =
        Regex::new(r"^[A-Z][A-Za-zÀ-ž .'-]*,\s*(?:[A-Z]{2}|[A-Z][A-Za-zÀ-ž .'-]+)$").unwrap();
}

const US_QUALIFIERS: &[&str] = &[
    "us only",
    "usa only",
    "us-only",
    "united states only",
    "us-based",
    "us based",
    "us timezones",
    "us time zones",
];

const EUROPE_QUALIFIERS: &[&str] = &[
    "europe only",
    "eu only",
    "eu-only",
    "europe-based",
    "eu timezones",
    "cet timezones",
    "emea",
];

/// Run the inference chain for one posting.
///
/// The keyword tiers look at the location string and the title: forum
/// and RSS postings routinely carry "(Remote, US only)" as a title
/// suffix instead of a location field.
pub async fn infer_remote_type<A: ExtractionAi>(ai: Option<&A>, raw: &RawPosting) -> RemoteType {
    // 1. Structured workplace-type field
    if let Some(workplace) = raw.workplace_type.as_deref() {
        match workplace.to_lowercase().as_str() {
            "remote" => return narrow_remote(&free_text(raw)),
            "hybrid" => return RemoteType::Hybrid,
            "onsite" | "on_site" | "on-site" => return RemoteType::Onsite,
            other => debug!(workplace = other, "unrecognized workplace type, falling through"),
        }
    }

    let text = free_text(raw);

    // 2. Explicit keywords in the free text
    if text.contains("hybrid") {
        return RemoteType::Hybrid;
    }
    if text.contains("remote") || text.contains("work from home") || text.contains("anywhere") {
        return narrow_remote(&text);
    }

    // 3. A concrete physical address is onsite even without a flag
    if let Some(location) = raw.location.as_deref() {
        if PHYSICAL_ADDRESS.is_match(location.trim()) {
            return RemoteType::Onsite;
        }
    }

    // 4. AI verdict, only for genuinely ambiguous strings
    if let Some(ai) = ai {
        if let Some(location) = raw.location.as_deref().filter(|l| !l.trim().is_empty()) {
            match ai.infer_remote(location).await {
                Ok(true) => return narrow_remote(&text),
                Ok(false) => return RemoteType::Onsite,
                Err(e) => {
                    debug!(location = %location, error = %e, "remote inference unavailable");
                }
            }
        }
    }

    // 5. Ambiguity defaults to exclusion from the remote catalog
    RemoteType::Onsite
}

/// Location string and title suffix, lowercased for keyword tiers.
fn free_text(raw: &RawPosting) -> String {
    let mut text = raw.location.clone().unwrap_or_default();
    text.push(' ');
    text.push_str(&raw.title);
    text.to_lowercase()
}

/// Narrow a remote verdict to a region restriction when one is stated.
fn narrow_remote(text: &str) -> RemoteType {
    if US_QUALIFIERS.iter().any(|q| text.contains(q)) {
        RemoteType::RemoteUs
    } else if EUROPE_QUALIFIERS.iter().any(|q| text.contains(q)) {
        RemoteType::RemoteEurope
    } else {
        RemoteType::Remote
    }
}

/// Best-effort ISO country code from the location text.
///
/// Recognizes US state abbreviations and a table of country names;
/// everything else is unknown rather than guessed.
pub fn country_from_location(location: &str) -> Option<String> {
    let trimmed = location.trim();

    // "City, ST" with a US state abbreviation
    if let Some((_, region)) = trimmed.rsplit_once(',') {
        let region = region.trim();
        if region.len() == 2 && US_STATES.contains(&region) {
            return Some("US".to_string());
        }
    }

    let lowered = trimmed.to_lowercase();
    for (needle, code) in COUNTRY_NAMES {
        if lowered.contains(needle) {
            return Some(code.to_string());
        }
    }
    None
}

const US_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY", "DC",
];

const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("u.s.", "US"),
    ("united kingdom", "GB"),
    ("england", "GB"),
    ("london", "GB"),
    ("germany", "DE"),
    ("berlin", "DE"),
    ("netherlands", "NL"),
    ("amsterdam", "NL"),
    ("france", "FR"),
    ("paris", "FR"),
    ("spain", "ES"),
    ("poland", "PL"),
    ("czech", "CZ"),
    ("prague", "CZ"),
    ("canada", "CA"),
    ("toronto", "CA"),
    ("australia", "AU"),
    ("india", "IN"),
    ("brazil", "BR"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAi;

    fn raw(title: &str, location: Option<&str>) -> RawPosting {
        let mut posting = RawPosting::new("1", title, "https://x.test/1");
        if let Some(location) = location {
            posting = posting.with_location(location);
        }
        posting
    }

    #[tokio::test]
    async fn test_structured_field_wins() {
        let posting = raw("Engineer", Some("New York, NY")).with_workplace_type("remote");
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::Remote);
    }

    #[tokio::test]
    async fn test_title_qualifier_narrows_to_us_remote() {
        let posting = raw("Senior Backend Engineer (Remote, US only)", None);
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::RemoteUs);
    }

    #[tokio::test]
    async fn test_physical_address_is_onsite() {
        let posting = raw("Account Manager", Some("New York, NY"));
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::Onsite);
        assert!(!remote.is_remote());
    }

    #[tokio::test]
    async fn test_hybrid_keyword() {
        let posting = raw("Engineer", Some("Hybrid - Berlin"));
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::Hybrid);
    }

    #[tokio::test]
    async fn test_europe_restriction() {
        let posting = raw("Engineer", Some("Remote (Europe only)"));
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::RemoteEurope);
    }

    #[tokio::test]
    async fn test_ambiguous_defaults_to_onsite() {
        let posting = raw("Engineer", Some("flexible"));
        let remote = infer_remote_type::<MockAi>(None, &posting).await;
        assert_eq!(remote, RemoteType::Onsite);
    }

    #[tokio::test]
    async fn test_ai_consulted_for_ambiguous_location() {
        let ai = MockAi::new().with_remote_verdict("distributed team", true);
        let posting = raw("Engineer", Some("distributed team"));
        let remote = infer_remote_type(Some(&ai), &posting).await;
        assert_eq!(remote, RemoteType::Remote);
    }

    #[tokio::test]
    async fn test_ai_error_defaults_to_onsite() {
        let ai = MockAi::new().failing();
        let posting = raw("Engineer", Some("distributed team"));
        let remote = infer_remote_type(Some(&ai), &posting).await;
        assert_eq!(remote, RemoteType::Onsite);
    }

    #[test]
    fn test_country_from_location() {
        assert_eq!(country_from_location("New York, NY").as_deref(), Some("US"));
        assert_eq!(country_from_location("Berlin, Germany").as_deref(), Some("DE"));
        assert_eq!(country_from_location("Prague").as_deref(), Some("CZ"));
        assert_eq!(country_from_location("somewhere nice"), None);
    }
}
