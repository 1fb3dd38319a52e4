//! Deterministic extraction heuristics.
//!
//! Regex and keyword tables that stand in for the AI extraction service
//! when it is down, and top up its answers when it is vague. Lower
//! confidence than the service, never unavailable.

use lazy_static::lazy_static;
use regex::Regex;

use crate::traits::ai::ExtractedPosting;
use crate::types::job::{EmploymentType, RawPosting, SeniorityLevel};
use crate::types::salary::SalaryPeriod;

lazy_static! {
    static ref SALARY_RANGE: Regex = Regex::new(
        r"(?i)([$€£])\s?(\d+(?:,\d{3})*(?:\.\d+)?)\s?(k)?\s*(?:-|–|—|to)\s*(?:[$€£]\s?)?(\d+(?:,\d{3})*(?:\.\d+)?)\s?(k)?"
    )
    .unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();
}

/// The seniority keyword ladder. First matching entry wins; titles that
/// match nothing are mid-level.
const SENIORITY_LADDER: &[(SeniorityLevel, &[&str])] = &[
    (SeniorityLevel::Intern, &["intern", "internship", "working student"]),
    (SeniorityLevel::Entry, &["entry level", "entry-level", "graduate"]),
    (SeniorityLevel::Junior, &["junior", "jr."]),
    (SeniorityLevel::Senior, &["senior", "sr."]),
    (SeniorityLevel::Lead, &["lead", "staff", "principal"]),
    (SeniorityLevel::Manager, &["manager", "head of"]),
    (SeniorityLevel::Director, &["director"]),
    (
        SeniorityLevel::Executive,
        &["vp ", "vice president", "chief", "cto", "ceo", "coo", "executive"],
    ),
];

/// Technologies recognized as skills, in canonical spelling.
const SKILL_KEYWORDS: &[&str] = &[
    "rust", "go", "python", "java", "kotlin", "swift", "typescript", "javascript", "ruby", "php",
    "c++", "c#", "scala", "elixir", "react", "vue", "angular", "node", "django", "rails",
    "kubernetes", "docker", "terraform", "aws", "gcp", "azure", "postgresql", "postgres", "mysql",
    "mongodb", "redis", "kafka", "graphql", "grpc", "linux", "ansible", "spark", "airflow",
];

/// Benefit phrases worth surfacing, mapped to canonical labels.
const BENEFIT_KEYWORDS: &[(&str, &str)] = &[
    ("health insurance", "Health insurance"),
    ("dental", "Dental insurance"),
    ("401k", "401(k)"),
    ("401(k)", "401(k)"),
    ("pension", "Pension"),
    ("equity", "Equity"),
    ("stock options", "Equity"),
    ("unlimited pto", "Unlimited PTO"),
    ("paid time off", "Paid time off"),
    ("parental leave", "Parental leave"),
    ("flexible hours", "Flexible hours"),
    ("four-day", "Four-day week"),
    ("4-day", "Four-day week"),
    ("conference budget", "Conference budget"),
    ("learning budget", "Learning budget"),
    ("home office", "Home office budget"),
];

/// Extract everything the heuristics can see in one posting.
pub fn extract(raw: &RawPosting) -> ExtractedPosting {
    let haystack = format!("{}\n{}", raw.title, raw.body);
    let salary = parse_salary(&haystack);

    ExtractedPosting {
        title: Some(raw.title.clone()),
        company: raw
            .metadata
            .get("company")
            .cloned()
            .or_else(|| raw.author.clone()),
        is_remote: None,
        location: raw.location.clone(),
        salary_min: salary.as_ref().map(|s| s.min),
        salary_max: salary.as_ref().map(|s| s.max),
        salary_currency: salary.as_ref().map(|s| s.currency.clone()),
        salary_period: salary.as_ref().map(|s| s.period),
        skills: extract_skills(&haystack),
        level: Some(seniority_from_title(&raw.title)),
        employment_type: Some(employment_from_text(&haystack)),
        benefits: extract_benefits(&haystack),
        contact_email: EMAIL.find(&raw.body).map(|m| m.as_str().to_string()),
    }
}

/// Parsed salary fields, pre-`SalaryRange` (no estimate flag yet).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSalary {
    pub min: i64,
    pub max: i64,
    pub currency: String,
    pub period: SalaryPeriod,
}

/// Find a salary range like `$120k–$150k` or `€60,000 - €80,000`.
pub fn parse_salary(text: &str) -> Option<ParsedSalary> {
    let caps = SALARY_RANGE.captures(text)?;

    let currency = match &caps[1] {
        "$" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        _ => return None,
    };

    let min = parse_amount(&caps[2], caps.get(3).is_some())?;
    let max = parse_amount(&caps[4], caps.get(5).is_some())?;
    if min <= 0 || max < min {
        return None;
    }

    Some(ParsedSalary {
        min,
        max,
        currency: currency.to_string(),
        period: infer_period(text, max),
    })
}

fn parse_amount(digits: &str, has_k: bool) -> Option<i64> {
    let cleaned = digits.replace(',', "");
    let value: f64 = cleaned.parse().ok()?;
    let value = if has_k { value * 1_000.0 } else { value };
    Some(value.round() as i64)
}

/// Decide the quote period from surrounding words, falling back to the
/// magnitude of the figure itself.
fn infer_period(text: &str, max: i64) -> SalaryPeriod {
    let lowered = text.to_lowercase();
    if lowered.contains("per hour") || lowered.contains("/hr") || lowered.contains("hourly") {
        SalaryPeriod::Hour
    } else if lowered.contains("per month") || lowered.contains("/month") || lowered.contains("monthly") {
        SalaryPeriod::Month
    } else if lowered.contains("per day") || lowered.contains("daily rate") {
        SalaryPeriod::Day
    } else if max < 500 {
        // Nobody quotes an annual salary under 500; that is an hourly rate.
        SalaryPeriod::Hour
    } else {
        SalaryPeriod::Year
    }
}

/// Title-based seniority: first matching ladder keyword wins.
pub fn seniority_from_title(title: &str) -> SeniorityLevel {
    let title = title.to_lowercase();
    for (level, keywords) in SENIORITY_LADDER {
        if keywords.iter().any(|k| title.contains(k)) {
            return *level;
        }
    }
    SeniorityLevel::Mid
}

/// Employment type from keywords; full-time unless stated otherwise.
pub fn employment_from_text(text: &str) -> EmploymentType {
    let lowered = text.to_lowercase();
    if lowered.contains("intern") {
        EmploymentType::Internship
    } else if lowered.contains("part-time") || lowered.contains("part time") {
        EmploymentType::PartTime
    } else if lowered.contains("contract") || lowered.contains("freelance") {
        EmploymentType::Contract
    } else {
        EmploymentType::FullTime
    }
}

/// Known technologies mentioned in the text, canonical spelling, in
/// table order.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|skill| contains_word(&lowered, skill))
        .map(|s| s.to_string())
        .collect()
}

/// Benefit labels mentioned in the text, deduplicated.
pub fn extract_benefits(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut benefits = Vec::new();
    for (keyword, label) in BENEFIT_KEYWORDS {
        if lowered.contains(keyword) && !benefits.iter().any(|b| b == label) {
            benefits.push(label.to_string());
        }
    }
    benefits
}

/// Word-boundary containment check that tolerates symbol-bearing names
/// like "c++" and "c#".
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
        let before_ok = begin == 0
            || !haystack[..begin]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric());
        let after_ok = end >= haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '+' || c == '#');
        if before_ok && after_ok {
            return true;
        }
        start = end;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salary_range_with_k_suffix() {
        let parsed = parse_salary("We pay $120k - $150k plus equity").unwrap();
        assert_eq!(parsed.min, 120_000);
        assert_eq!(parsed.max, 150_000);
        assert_eq!(parsed.currency, "USD");
        assert_eq!(parsed.period, SalaryPeriod::Year);
    }

    #[test]
    fn test_salary_range_with_thousands_separators() {
        let parsed = parse_salary("Salary: €60,000 – €80,000 per year").unwrap();
        assert_eq!(parsed.min, 60_000);
        assert_eq!(parsed.max, 80_000);
        assert_eq!(parsed.currency, "EUR");
    }

    #[test]
    fn test_hourly_rate_detected() {
        let parsed = parse_salary("£40 - £60 per hour").unwrap();
        assert_eq!(parsed.period, SalaryPeriod::Hour);

        // No period words, but the magnitude gives it away.
        let parsed = parse_salary("$45 - $70, DOE").unwrap();
        assert_eq!(parsed.period, SalaryPeriod::Hour);
    }

    #[test]
    fn test_no_salary_in_text() {
        assert!(parse_salary("Competitive compensation").is_none());
    }

    #[test]
    fn test_seniority_ladder() {
        assert_eq!(seniority_from_title("Engineering Intern"), SeniorityLevel::Intern);
        assert_eq!(seniority_from_title("Junior Developer"), SeniorityLevel::Junior);
        assert_eq!(seniority_from_title("Backend Engineer"), SeniorityLevel::Mid);
        assert_eq!(
            seniority_from_title("Senior Backend Engineer"),
            SeniorityLevel::Senior
        );
        assert_eq!(seniority_from_title("Staff Engineer"), SeniorityLevel::Lead);
        assert_eq!(
            seniority_from_title("Director of Engineering"),
            SeniorityLevel::Director
        );
        assert_eq!(seniority_from_title("CTO"), SeniorityLevel::Executive);
    }

    #[test]
    fn test_first_ladder_match_wins() {
        // "Senior" appears before "Manager" in the ladder.
        assert_eq!(
            seniority_from_title("Senior Engineering Manager"),
            SeniorityLevel::Senior
        );
    }

    #[test]
    fn test_skills_respect_word_boundaries() {
        let skills = extract_skills("We use Rust, PostgreSQL and C++ daily; trust matters");
        assert!(skills.contains(&"rust".to_string()));
        assert!(skills.contains(&"postgresql".to_string()));
        assert!(skills.contains(&"c++".to_string()));
        // "go" must not match inside other words
        assert!(!extract_skills("We are an agile organization").contains(&"go".to_string()));
    }

    #[test]
    fn test_benefits_deduplicated() {
        let benefits = extract_benefits("equity and stock options, plus health insurance");
        assert_eq!(
            benefits,
            vec!["Health insurance".to_string(), "Equity".to_string()]
        );
    }

    #[test]
    fn test_full_extraction() {
        let raw = RawPosting::new("1", "Senior Rust Engineer", "https://x.test/1")
            .with_location("Remote")
            .with_body("Salary $130k to $160k. Rust, Kafka. Contact hiring@x.test. Unlimited PTO.")
            .with_metadata("company", "Initech");

        let extracted = extract(&raw);

        assert_eq!(extracted.company.as_deref(), Some("Initech"));
        assert_eq!(extracted.level, Some(SeniorityLevel::Senior));
        assert_eq!(extracted.salary_min, Some(130_000));
        assert_eq!(extracted.contact_email.as_deref(), Some("hiring@x.test"));
        assert_eq!(extracted.benefits, vec!["Unlimited PTO".to_string()]);
    }
}
