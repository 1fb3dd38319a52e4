//! Configuration for ingestion runs.

use crate::types::job::SeniorityLevel;

/// Configuration for the filter pipeline.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Postings older than this are rejected as too old
    pub max_age_days: i64,

    /// Curated allow-list of target professions; a title matching none of
    /// these keywords is rejected
    pub whitelist: Vec<String>,

    /// Whether to run the AI relevance stage
    pub ai_relevance_enabled: bool,

    /// Ceiling on AI relevance calls per minute
    pub ai_calls_per_minute: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_age_days: 30,
            whitelist: default_whitelist(),
            ai_relevance_enabled: false,
            ai_calls_per_minute: 20,
        }
    }
}

impl FilterConfig {
    /// Set the maximum posting age.
    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = days;
        self
    }

    /// Replace the profession allow-list.
    pub fn with_whitelist(mut self, keywords: Vec<String>) -> Self {
        self.whitelist = keywords;
        self
    }

    /// Enable the AI relevance stage.
    pub fn with_ai_relevance(mut self) -> Self {
        self.ai_relevance_enabled = true;
        self
    }
}

/// Target professions matched against posting titles.
fn default_whitelist() -> Vec<String> {
    [
        "developer",
        "engineer",
        "programmer",
        "architect",
        "devops",
        "sre",
        "data scientist",
        "data analyst",
        "machine learning",
        "qa",
        "tester",
        "designer",
        "product manager",
        "project manager",
        "scrum master",
        "security",
        "administrator",
        "support",
        "consultant",
        "analyst",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Configuration for the salary estimation chain.
#[derive(Debug, Clone)]
pub struct SalaryConfig {
    /// Home country served by the domestic statistics source
    pub home_country: String,

    /// Countries the international statistics source covers
    pub supported_countries: Vec<String>,

    /// Annual USD floor below which a stored posting salary is treated as
    /// implausible (usually an hourly rate mis-stored as annual)
    pub min_annual_salary: i64,

    /// Floor below which a statistics-source average is rejected as invalid
    pub min_plausible_average: i64,

    /// Minimum comparable postings for the empirical tier
    pub min_sample_size: usize,
}

impl Default for SalaryConfig {
    fn default() -> Self {
        Self {
            home_country: "US".to_string(),
            supported_countries: ["GB", "DE", "NL", "FR", "ES", "PL", "CZ", "CA", "AU"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_annual_salary: 12_000,
            min_plausible_average: 8_000,
            min_sample_size: 3,
        }
    }
}

impl SalaryConfig {
    /// Set the home country.
    pub fn with_home_country(mut self, country: impl Into<String>) -> Self {
        self.home_country = country.into();
        self
    }
}

/// Top-level ingestion configuration.
#[derive(Debug, Clone, Default)]
pub struct IngestionConfig {
    pub filter: FilterConfig,
    pub salary: SalaryConfig,
}

impl IngestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter configuration.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the salary configuration.
    pub fn with_salary(mut self, salary: SalaryConfig) -> Self {
        self.salary = salary;
        self
    }
}

/// Base annual USD salary per category for the formula estimate tier.
pub fn category_base_salary(slug: &str) -> i64 {
    match slug {
        "backend" | "fullstack" | "devops" | "security" => 95_000,
        "frontend" | "mobile" => 85_000,
        "data" => 100_000,
        "qa" => 70_000,
        "design" => 75_000,
        "product" | "management" => 90_000,
        "marketing" => 65_000,
        "customer-support" => 50_000,
        _ => 60_000,
    }
}

/// Seniority multiplier for the formula estimate tier.
pub fn seniority_multiplier(level: SeniorityLevel) -> f64 {
    match level {
        SeniorityLevel::Intern => 0.4,
        SeniorityLevel::Entry => 0.6,
        SeniorityLevel::Junior => 0.75,
        SeniorityLevel::Mid => 1.0,
        SeniorityLevel::Senior => 1.3,
        SeniorityLevel::Lead => 1.5,
        SeniorityLevel::Manager => 1.6,
        SeniorityLevel::Director => 1.9,
        SeniorityLevel::Executive => 2.3,
    }
}

/// Purchasing-power coefficient relative to the US market.
///
/// Countries not in the table get a conservative default.
pub fn country_power_coefficient(country: &str) -> f64 {
    match country {
        "US" => 1.0,
        "CH" => 1.1,
        "AU" | "CA" => 0.85,
        "GB" | "DE" | "NL" | "SE" | "DK" | "NO" | "IE" => 0.8,
        "FR" | "AT" | "BE" | "FI" => 0.72,
        "ES" | "IT" | "PT" => 0.55,
        "CZ" | "PL" | "EE" | "LT" | "LV" | "SK" | "HU" => 0.45,
        "RO" | "BG" | "RS" | "UA" => 0.35,
        "IN" | "PH" | "ID" => 0.25,
        "BR" | "MX" | "AR" | "CO" => 0.3,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = IngestionConfig::default();
        assert_eq!(config.filter.max_age_days, 30);
        assert!(!config.filter.whitelist.is_empty());
        assert_eq!(config.salary.min_sample_size, 3);
        assert_eq!(config.salary.home_country, "US");
    }

    #[test]
    fn test_formula_tables_cover_everything() {
        use crate::types::category::Category;

        for category in Category::ALL {
            assert!(category_base_salary(category.as_slug()) > 0);
        }
        assert!(country_power_coefficient("XX") > 0.0);
        assert!(seniority_multiplier(SeniorityLevel::Intern) > 0.0);
    }
}
