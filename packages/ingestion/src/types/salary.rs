//! Salary ranges and the benchmark cache record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Period a salary figure is quoted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryPeriod {
    Year,
    Month,
    Day,
    Hour,
}

impl Default for SalaryPeriod {
    fn default() -> Self {
        Self::Year
    }
}

impl SalaryPeriod {
    /// Approximate multiplier converting one unit of this period to a year.
    ///
    /// 160 working hours a month, 21 working days.
    pub fn per_year(&self) -> f64 {
        match self {
            SalaryPeriod::Year => 1.0,
            SalaryPeriod::Month => 12.0,
            SalaryPeriod::Day => 252.0,
            SalaryPeriod::Hour => 1920.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryPeriod::Year => "year",
            SalaryPeriod::Month => "month",
            SalaryPeriod::Day => "day",
            SalaryPeriod::Hour => "hour",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "year" => Some(SalaryPeriod::Year),
            "month" => Some(SalaryPeriod::Month),
            "day" => Some(SalaryPeriod::Day),
            "hour" => Some(SalaryPeriod::Hour),
            _ => None,
        }
    }
}

/// A salary range attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
    /// ISO 4217 currency code
    pub currency: String,
    pub period: SalaryPeriod,
    /// True when the figures came from the estimation chain rather than
    /// the posting itself; consumers render a disclaimer on this
    pub is_estimate: bool,
}

impl SalaryRange {
    /// A stated (non-estimated) range.
    pub fn stated(min: i64, max: i64, currency: impl Into<String>, period: SalaryPeriod) -> Self {
        Self {
            min,
            max,
            currency: currency.into(),
            period,
            is_estimate: false,
        }
    }

    /// Annualized midpoint in the quoted currency.
    pub fn annual_midpoint(&self) -> i64 {
        let mid = (self.min + self.max) as f64 / 2.0;
        (mid * self.period.per_year()).round() as i64
    }
}

/// Cached wage benchmark for one market.
///
/// Keyed uniquely by `(normalized title, country, region)`. A lookup after
/// the TTL has elapsed is treated as a miss and recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryBenchmark {
    /// Normalized job title (see [`normalize_title`])
    pub title: String,
    /// ISO country code
    pub country: String,
    /// Optional sub-national region
    pub region: Option<String>,
    /// All figures are annual USD
    pub min: i64,
    pub max: i64,
    pub avg: i64,
    pub median: i64,
    pub percentile25: i64,
    pub percentile75: i64,
    /// Number of observations behind the figures
    pub sample_size: u32,
    /// Which tier produced this ("domestic-stats", "intl-stats",
    /// "empirical", "formula")
    pub source: String,
    pub computed_at: DateTime<Utc>,
}

impl SalaryBenchmark {
    /// Cache time-to-live.
    pub const TTL_DAYS: i64 = 30;

    /// Whether this benchmark has outlived its TTL as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now - self.computed_at > Duration::days(Self::TTL_DAYS)
    }

    /// Whether this benchmark has outlived its TTL.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether the figures came from the estimation formula rather than
    /// observed data.
    pub fn is_estimate(&self) -> bool {
        self.source == "formula"
    }
}

/// USD exchange rate for a currency code.
///
/// Fixed table, refreshed manually with the rest of the market constants.
/// Unknown currencies return None and the amount is treated as unusable
/// rather than silently mis-converted.
pub fn usd_rate(currency: &str) -> Option<f64> {
    match currency.to_uppercase().as_str() {
        "USD" => Some(1.0),
        "EUR" => Some(1.08),
        "GBP" => Some(1.27),
        "CHF" => Some(1.12),
        "CAD" => Some(0.73),
        "AUD" => Some(0.66),
        "PLN" => Some(0.25),
        "CZK" => Some(0.043),
        "SEK" => Some(0.095),
        "DKK" => Some(0.14),
        "NOK" => Some(0.093),
        "INR" => Some(0.012),
        "BRL" => Some(0.18),
        _ => None,
    }
}

/// Convert an amount to USD for cross-market comparison.
pub fn to_usd(amount: i64, currency: &str) -> Option<i64> {
    usd_rate(currency).map(|rate| (amount as f64 * rate).round() as i64)
}

/// Normalize a job title into a benchmark cache key.
///
/// Strips parenthesized qualifiers, anything after a dash separator
/// (usually a location or team suffix), and decorative whitespace. Keeps
/// seniority words: a senior benchmark is a different market than a junior
/// one.
pub fn normalize_title(title: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());
    let mut depth = 0usize;

    for ch in title.chars() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => cleaned.push(ch),
            _ => {}
        }
    }

    // A separator dash usually introduces a location or team suffix.
    let cleaned = cleaned
        .split(|c| c == '—' || c == '–' || c == '|')
        .next()
        .unwrap_or("");
    let cleaned = match cleaned.split(" - ").next() {
        Some(head) => head,
        None => cleaned,
    };

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_qualifiers() {
        assert_eq!(
            normalize_title("Senior Backend Engineer (Remote, US only)"),
            "senior backend engineer"
        );
        assert_eq!(
            normalize_title("Account Manager — New York, NY"),
            "account manager"
        );
        assert_eq!(
            normalize_title("Data Scientist - Growth Team"),
            "data scientist"
        );
    }

    #[test]
    fn test_normalize_keeps_seniority() {
        assert_eq!(normalize_title("Junior QA Tester"), "junior qa tester");
    }

    #[test]
    fn test_ttl_expiry() {
        let now = Utc::now();
        let fresh = SalaryBenchmark {
            title: "backend engineer".into(),
            country: "US".into(),
            region: None,
            min: 90_000,
            max: 150_000,
            avg: 120_000,
            median: 118_000,
            percentile25: 105_000,
            percentile75: 135_000,
            sample_size: 40,
            source: "empirical".into(),
            computed_at: now - Duration::days(29),
        };
        assert!(!fresh.is_expired_at(now));

        let stale = SalaryBenchmark {
            computed_at: now - Duration::days(31),
            ..fresh
        };
        assert!(stale.is_expired_at(now));
    }

    #[test]
    fn test_annual_midpoint() {
        let monthly = SalaryRange::stated(4_000, 6_000, "USD", SalaryPeriod::Month);
        assert_eq!(monthly.annual_midpoint(), 60_000);

        let yearly = SalaryRange::stated(100_000, 140_000, "USD", SalaryPeriod::Year);
        assert_eq!(yearly.annual_midpoint(), 120_000);
    }
}
