//! Canonical company records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A canonical employer record.
///
/// Created on first sighting of a new employer; subsequently only updated
/// (website/logo backfill). Once a slug or case-insensitive name matches,
/// the same record is reused, never duplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    /// Unique URL-safe identifier
    pub slug: String,
    /// Display name as published
    pub name: String,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    /// ATS provider this company is known to post through, if any
    pub ats_provider: Option<String>,
    /// Board token on that provider
    pub ats_board_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Create a new company with a freshly derived slug.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            slug: slugify(&name),
            name,
            id: Uuid::new_v4(),
            website: None,
            logo_url: None,
            ats_provider: None,
            ats_board_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the website.
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Set the ATS linkage.
    pub fn with_ats(mut self, provider: impl Into<String>, board_token: impl Into<String>) -> Self {
        self.ats_provider = Some(provider.into());
        self.ats_board_token = Some(board_token.into());
        self
    }
}

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, maps runs of non-alphanumeric characters to single hyphens,
/// and trims leading/trailing hyphens. An all-symbol name yields "company"
/// so the result is never empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "company".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("Röntgen & Söhne GmbH"), "r-ntgen-s-hne-gmbh");
        assert_eq!(slugify("  Spaced  Out  "), "spaced-out");
    }

    #[test]
    fn test_slugify_never_empty() {
        assert_eq!(slugify("***"), "company");
        assert_eq!(slugify(""), "company");
    }

    #[test]
    fn test_new_company_derives_slug() {
        let company = Company::new("Initech LLC");
        assert_eq!(company.slug, "initech-llc");
        assert_eq!(company.name, "Initech LLC");
    }

    #[test]
    fn test_builders_fill_linkage() {
        let company = Company::new("Acme")
            .with_website("https://acme.test")
            .with_ats("greenhouse", "acme");

        assert_eq!(company.website.as_deref(), Some("https://acme.test"));
        assert_eq!(company.ats_provider.as_deref(), Some("greenhouse"));
        assert_eq!(company.ats_board_token.as_deref(), Some("acme"));
    }
}
