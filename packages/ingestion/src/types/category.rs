//! Fixed job category taxonomy.
//!
//! The category set is a closed enum. Classification must always land on a
//! member of this set; "no confident match" is its own explicit member
//! (`Unclassified`) rather than an alias to an unrelated bucket.

use serde::{Deserialize, Serialize};

/// Closed category taxonomy, keyed by slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Backend,
    Frontend,
    Fullstack,
    Mobile,
    Devops,
    Data,
    Qa,
    Security,
    Design,
    Product,
    Marketing,
    Management,
    CustomerSupport,
    /// No confident match; distinguishable from every real category
    Unclassified,
}

impl Category {
    /// All members, in display order.
    pub const ALL: [Category; 14] = [
        Category::Backend,
        Category::Frontend,
        Category::Fullstack,
        Category::Mobile,
        Category::Devops,
        Category::Data,
        Category::Qa,
        Category::Security,
        Category::Design,
        Category::Product,
        Category::Marketing,
        Category::Management,
        Category::CustomerSupport,
        Category::Unclassified,
    ];

    /// Stable slug used as the persistence key.
    pub fn as_slug(&self) -> &'static str {
        match self {
            Category::Backend => "backend",
            Category::Frontend => "frontend",
            Category::Fullstack => "fullstack",
            Category::Mobile => "mobile",
            Category::Devops => "devops",
            Category::Data => "data",
            Category::Qa => "qa",
            Category::Security => "security",
            Category::Design => "design",
            Category::Product => "product",
            Category::Marketing => "marketing",
            Category::Management => "management",
            Category::CustomerSupport => "customer-support",
            Category::Unclassified => "unclassified",
        }
    }

    /// Parse a slug, returning None for anything outside the closed set.
    pub fn from_slug(slug: &str) -> Option<Category> {
        let slug = slug.trim().to_lowercase();
        Category::ALL.iter().copied().find(|c| c.as_slug() == slug)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_slug())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_slug(category.as_slug()), Some(category));
        }
    }

    #[test]
    fn test_unknown_slug_rejected() {
        assert_eq!(Category::from_slug("astrology"), None);
        assert_eq!(Category::from_slug(""), None);
    }

    #[test]
    fn test_slug_parse_is_case_insensitive() {
        assert_eq!(Category::from_slug(" Backend "), Some(Category::Backend));
        assert_eq!(
            Category::from_slug("CUSTOMER-SUPPORT"),
            Some(Category::CustomerSupport)
        );
    }
}
