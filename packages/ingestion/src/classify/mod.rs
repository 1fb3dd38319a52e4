//! Category classification: AI primary, keyword ladder fallback.
//!
//! Classification is total. Whatever happens (AI down, AI inventing
//! labels, a title in Klingon) the result is a member of the closed
//! [`Category`] set, with `Unclassified` as the explicit terminal default.

use tracing::warn;

use crate::traits::ai::ExtractionAi;
use crate::types::category::Category;

/// Keyword ladder for the fallback path, checked in order; the first
/// bucket with a matching keyword wins. Specific buckets come before
/// generic ones (fullstack before backend, devops before backend).
const CATEGORY_LADDER: &[(Category, &[&str])] = &[
    (Category::Devops, &["devops", "sre", "site reliability", "platform engineer", "infrastructure"]),
    (Category::Data, &["data scientist", "data engineer", "data analyst", "machine learning", "ml engineer", "analytics"]),
    (Category::Security, &["security", "appsec", "penetration"]),
    (Category::Qa, &["qa", "quality assurance", "test engineer", "tester", "sdet"]),
    (Category::Mobile, &["mobile", "ios", "android", "flutter", "react native"]),
    (Category::Fullstack, &["fullstack", "full-stack", "full stack"]),
    (Category::Frontend, &["frontend", "front-end", "front end", "react", "vue", "angular"]),
    (Category::Backend, &["backend", "back-end", "back end", "api engineer", "software engineer", "developer"]),
    (Category::Design, &["designer", "ux", "ui design", "product design"]),
    (Category::Product, &["product manager", "product owner"]),
    (Category::Marketing, &["marketing", "growth", "seo", "content"]),
    (Category::Management, &["engineering manager", "head of engineering", "director of engineering", "cto"]),
    (Category::CustomerSupport, &["support", "customer success", "helpdesk", "help desk"]),
];

/// Classify a job into the fixed category set.
///
/// The AI label is accepted only after validating enum membership; an
/// invalid, empty, or erroring response drops to the keyword ladder.
pub async fn classify<A: ExtractionAi>(
    ai: Option<&A>,
    title: &str,
    skills: &[String],
) -> Category {
    if let Some(ai) = ai {
        match ai.classify_category(title, skills).await {
            Ok(slug) => match Category::from_slug(&slug) {
                Some(category) => return category,
                None => {
                    warn!(title = %title, slug = %slug, "AI returned a label outside the category set");
                }
            },
            Err(e) => {
                warn!(title = %title, error = %e, "AI classification unavailable");
            }
        }
    }

    classify_by_keywords(title)
}

/// Deterministic keyword-ladder classification over the title.
pub fn classify_by_keywords(title: &str) -> Category {
    let title = title.to_lowercase();
    for (category, keywords) in CATEGORY_LADDER {
        if keywords.iter().any(|k| title.contains(k)) {
            return *category;
        }
    }
    Category::Unclassified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAi;

    #[test]
    fn test_keyword_ladder() {
        assert_eq!(classify_by_keywords("Senior Backend Engineer"), Category::Backend);
        assert_eq!(classify_by_keywords("DevOps Engineer"), Category::Devops);
        assert_eq!(classify_by_keywords("Fullstack Developer"), Category::Fullstack);
        assert_eq!(classify_by_keywords("iOS Developer"), Category::Mobile);
        assert_eq!(classify_by_keywords("Product Manager"), Category::Product);
    }

    #[test]
    fn test_no_match_is_unclassified() {
        assert_eq!(classify_by_keywords("Shepherd"), Category::Unclassified);
        assert_eq!(classify_by_keywords(""), Category::Unclassified);
    }

    #[tokio::test]
    async fn test_valid_ai_label_accepted() {
        let ai = MockAi::new().with_category("Rust Wrangler", "backend");
        let category = classify(Some(&ai), "Rust Wrangler", &[]).await;
        assert_eq!(category, Category::Backend);
    }

    #[tokio::test]
    async fn test_invented_ai_label_falls_back() {
        let ai = MockAi::new().with_category("Frontend Developer", "wizardry");
        let category = classify(Some(&ai), "Frontend Developer", &[]).await;
        assert_eq!(category, Category::Frontend);
    }

    #[tokio::test]
    async fn test_ai_failure_still_total() {
        let ai = MockAi::new().failing();
        let category = classify(Some(&ai), "Security Analyst", &[]).await;
        assert_eq!(category, Category::Security);

        let category = classify(Some(&ai), "Sous Chef", &[]).await;
        assert_eq!(category, Category::Unclassified);
    }
}
