//! Salary normalization and estimation.
//!
//! A strictly ordered fallback chain, each tier attempted only if the
//! previous produced no usable result, each writing its result to the
//! benchmark cache before returning:
//!
//! 1. cache lookup (30-day TTL; a hit short-circuits everything)
//! 2. domestic authoritative statistics source (home country only)
//! 3. secondary international statistics source (fixed country list)
//! 4. empirical calculation from comparable stored postings
//! 5. formula estimate (terminal, never fails)
//!
//! All monetary values are normalized to annual USD for comparison. The
//! estimate/authoritative distinction survives on the benchmark's source
//! tag and on the `is_estimate` flag of ranges derived from it.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::stats::WageStatsSource;
use crate::traits::store::{BenchmarkStore, JobStore};
use crate::types::category::Category;
use crate::types::config::{
    category_base_salary, country_power_coefficient, seniority_multiplier, SalaryConfig,
};
use crate::types::job::SeniorityLevel;
use crate::types::salary::{normalize_title, SalaryBenchmark, SalaryPeriod, SalaryRange};

/// The estimation engine.
///
/// Generic over the store so it runs against `MemoryStore` in tests and
/// the production backend unchanged.
pub struct SalaryEngine<S> {
    store: Arc<S>,
    domestic: Option<Arc<dyn WageStatsSource>>,
    international: Option<Arc<dyn WageStatsSource>>,
    config: SalaryConfig,
}

impl<S> SalaryEngine<S>
where
    S: JobStore + BenchmarkStore,
{
    pub fn new(store: Arc<S>, config: SalaryConfig) -> Self {
        Self {
            store,
            domestic: None,
            international: None,
            config,
        }
    }

    /// Attach the domestic authoritative statistics source.
    pub fn with_domestic(mut self, source: Arc<dyn WageStatsSource>) -> Self {
        self.domestic = Some(source);
        self
    }

    /// Attach the secondary international statistics source.
    pub fn with_international(mut self, source: Arc<dyn WageStatsSource>) -> Self {
        self.international = Some(source);
        self
    }

    /// Produce a benchmark for one market, walking the fallback chain.
    pub async fn estimate(
        &self,
        title: &str,
        country: &str,
        region: Option<&str>,
        category: Category,
        seniority: SeniorityLevel,
    ) -> Result<SalaryBenchmark> {
        let normalized = normalize_title(title);

        // Tier 1: cache. Expired entries are misses.
        if let Some(cached) = self
            .store
            .get_benchmark(&normalized, country, region)
            .await?
        {
            if !cached.is_expired() {
                debug!(title = %normalized, country, "benchmark cache hit");
                return Ok(cached);
            }
            debug!(title = %normalized, country, "benchmark expired, recomputing");
        }

        // Tier 2: domestic authoritative source, home country only.
        if country == self.config.home_country {
            if let Some(benchmark) = self.try_stats_source(&self.domestic, &normalized, country, region).await {
                self.store.store_benchmark(&benchmark).await?;
                return Ok(benchmark);
            }
        }

        // Tier 3: international source for supported countries; results
        // below the plausibility floor or without a sample are invalid.
        if self.config.supported_countries.iter().any(|c| c == country) {
            if let Some(benchmark) = self.try_stats_source(&self.international, &normalized, country, region).await {
                if benchmark.avg >= self.config.min_plausible_average && benchmark.sample_size >= 1 {
                    self.store.store_benchmark(&benchmark).await?;
                    return Ok(benchmark);
                }
                debug!(
                    title = %normalized,
                    country,
                    avg = benchmark.avg,
                    sample_size = benchmark.sample_size,
                    "international result implausible, falling through"
                );
            }
        }

        // Tier 4: empirical, from comparable stored postings.
        if let Some(benchmark) = self.empirical(&normalized, country, region).await? {
            self.store.store_benchmark(&benchmark).await?;
            return Ok(benchmark);
        }

        // Tier 5: formula. Terminal, never fails.
        let benchmark = formula_benchmark(&normalized, country, region, category, seniority);
        self.store.store_benchmark(&benchmark).await?;
        Ok(benchmark)
    }

    async fn try_stats_source(
        &self,
        source: &Option<Arc<dyn WageStatsSource>>,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Option<SalaryBenchmark> {
        let source = source.as_ref()?;
        if !source.supports(country) {
            return None;
        }

        match source.fetch_benchmark(normalized_title, country, region).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    source = source.name(),
                    title = %normalized_title,
                    country,
                    error = %e,
                    "statistics source unavailable, falling through"
                );
                None
            }
        }
    }

    /// Compute a benchmark from comparable postings already stored for
    /// this market, when there are enough plausible samples.
    async fn empirical(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>> {
        let mut samples = self
            .store
            .comparable_salaries(normalized_title, country)
            .await?;

        // Below the annual floor it is almost always an hourly rate
        // mis-stored as an annual figure.
        samples.retain(|&s| s >= self.config.min_annual_salary);

        if samples.len() < self.config.min_sample_size {
            return Ok(None);
        }

        samples.sort_unstable();
        let benchmark = SalaryBenchmark {
            title: normalized_title.to_string(),
            country: country.to_string(),
            region: region.map(String::from),
            min: samples[0],
            max: samples[samples.len() - 1],
            avg: (samples.iter().sum::<i64>() as f64 / samples.len() as f64).round() as i64,
            median: percentile(&samples, 0.5),
            percentile25: percentile(&samples, 0.25),
            percentile75: percentile(&samples, 0.75),
            sample_size: samples.len() as u32,
            source: "empirical".to_string(),
            computed_at: chrono::Utc::now(),
        };
        Ok(Some(benchmark))
    }
}

/// Nearest-rank percentile over a sorted sample.
fn percentile(sorted: &[i64], p: f64) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

/// The terminal formula estimate:
/// category base × seniority multiplier × purchasing-power coefficient,
/// with a symmetric ±20% min/max band and an inner ±12% quartile band.
pub fn formula_benchmark(
    normalized_title: &str,
    country: &str,
    region: Option<&str>,
    category: Category,
    seniority: SeniorityLevel,
) -> SalaryBenchmark {
    let base = category_base_salary(category.as_slug()) as f64
        * seniority_multiplier(seniority)
        * country_power_coefficient(country);
    let base = base.round() as i64;

    SalaryBenchmark {
        title: normalized_title.to_string(),
        country: country.to_string(),
        region: region.map(String::from),
        min: (base as f64 * 0.8).round() as i64,
        max: (base as f64 * 1.2).round() as i64,
        avg: base,
        median: base,
        percentile25: (base as f64 * 0.88).round() as i64,
        percentile75: (base as f64 * 1.12).round() as i64,
        sample_size: 0,
        source: "formula".to_string(),
        computed_at: chrono::Utc::now(),
    }
}

/// The salary range advertised for a job whose posting stated none:
/// the benchmark's interquartile band, flagged as an estimate.
pub fn estimate_range(benchmark: &SalaryBenchmark) -> SalaryRange {
    SalaryRange {
        min: benchmark.percentile25,
        max: benchmark.percentile75,
        currency: "USD".to_string(),
        period: SalaryPeriod::Year,
        is_estimate: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::MockWageStats;
    use crate::types::job::{EmploymentType, RemoteType, SourceKind};
    use crate::types::job::Job;
    use uuid::Uuid;

    fn engine(store: Arc<MemoryStore>) -> SalaryEngine<MemoryStore> {
        SalaryEngine::new(store, SalaryConfig::default())
    }

    fn stored_job(n: u32, title: &str, annual_usd: i64) -> Job {
        let now = chrono::Utc::now();
        Job {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "d".into(),
            company_id: Uuid::new_v4(),
            category: Category::Backend,
            location: None,
            remote_type: RemoteType::Remote,
            country_code: Some("US".into()),
            seniority: SeniorityLevel::Mid,
            employment_type: EmploymentType::FullTime,
            salary: Some(SalaryRange::stated(
                annual_usd - 10_000,
                annual_usd + 10_000,
                "USD",
                SalaryPeriod::Year,
            )),
            skills: vec![],
            benefits: vec![],
            source_kind: SourceKind::Ats,
            source_id: format!("s{n}"),
            source_url: format!("https://x.test/{n}"),
            quality_score: 0.5,
            content_hash: "h".into(),
            posted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_formula_tier_is_terminal() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(store)
            .estimate("Backend Engineer", "XX", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        assert_eq!(result.source, "formula");
        assert!(result.is_estimate());
        assert!(result.min < result.avg && result.avg < result.max);
        assert!(result.percentile25 > result.min && result.percentile75 < result.max);
    }

    #[tokio::test]
    async fn test_formula_scales_with_inputs() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store);

        let mid_us = engine
            .estimate("Backend Engineer", "XX", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();
        let senior_us = engine
            .estimate("Senior Backend Engineer", "XX", None, Category::Backend, SeniorityLevel::Senior)
            .await
            .unwrap();

        assert!(senior_us.avg > mid_us.avg);
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits() {
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(MockWageStats::new("domestic-stats").with_benchmark(
            "backend engineer",
            "US",
            120_000,
        ));
        let engine = SalaryEngine::new(store, SalaryConfig::default())
            .with_domestic(stats.clone());

        let first = engine
            .estimate("Backend Engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();
        let second = engine
            .estimate("Backend Engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        assert_eq!(first, second);
        // The second lookup never reached the statistics source.
        assert_eq!(stats.call_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_recomputed() {
        let store = Arc::new(MemoryStore::new());
        let stale = SalaryBenchmark {
            computed_at: chrono::Utc::now() - chrono::Duration::days(31),
            ..formula_benchmark("backend engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
        };
        store.store_benchmark(&stale).await.unwrap();

        let stats = Arc::new(MockWageStats::new("domestic-stats").with_benchmark(
            "backend engineer",
            "US",
            130_000,
        ));
        let engine = SalaryEngine::new(store, SalaryConfig::default())
            .with_domestic(stats.clone());

        let result = engine
            .estimate("Backend Engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        assert_eq!(result.source, "domestic-stats");
        assert_eq!(stats.call_count(), 1);
    }

    #[tokio::test]
    async fn test_implausible_international_result_falls_through() {
        let store = Arc::new(MemoryStore::new());
        let intl = Arc::new(MockWageStats::new("intl-stats").with_benchmark("backend engineer", "DE", 500));
        let engine = SalaryEngine::new(store, SalaryConfig::default())
            .with_international(intl);

        let result = engine
            .estimate("Backend Engineer", "DE", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        // Average of 500 is below the plausibility floor.
        assert_eq!(result.source, "formula");
    }

    #[tokio::test]
    async fn test_empirical_tier_filters_and_computes() {
        let store = Arc::new(MemoryStore::new());
        for (i, mid) in [100_000, 120_000, 140_000].iter().enumerate() {
            store
                .insert_job(&stored_job(i as u32, "Backend Engineer", *mid))
                .await
                .unwrap();
        }
        // An implausible figure (hourly rate stored as annual) that must
        // not drag the sample down; with it gone there are still 3.
        store
            .insert_job(&stored_job(9, "Backend Engineer", 10_050))
            .await
            .unwrap();

        let result = engine(store)
            .estimate("Backend Engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        assert_eq!(result.source, "empirical");
        assert_eq!(result.sample_size, 3);
        assert_eq!(result.min, 100_000);
        assert_eq!(result.max, 140_000);
        assert_eq!(result.median, 120_000);
    }

    #[tokio::test]
    async fn test_too_small_sample_falls_to_formula() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_job(&stored_job(0, "Backend Engineer", 120_000))
            .await
            .unwrap();

        let result = engine(store)
            .estimate("Backend Engineer", "US", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        assert_eq!(result.source, "formula");
    }

    #[tokio::test]
    async fn test_domestic_source_only_for_home_country() {
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(
            MockWageStats::new("domestic-stats")
                .with_benchmark("backend engineer", "DE", 90_000)
                .covering_everything(),
        );
        let engine = SalaryEngine::new(store, SalaryConfig::default())
            .with_domestic(stats.clone());

        let result = engine
            .estimate("Backend Engineer", "DE", None, Category::Backend, SeniorityLevel::Mid)
            .await
            .unwrap();

        // DE is not the home country, so the domestic source was skipped.
        assert_ne!(result.source, "domestic-stats");
        assert_eq!(stats.call_count(), 0);
    }

    #[test]
    fn test_estimate_range_uses_quartile_band() {
        let benchmark =
            formula_benchmark("backend engineer", "US", None, Category::Backend, SeniorityLevel::Mid);
        let range = estimate_range(&benchmark);

        assert!(range.is_estimate);
        assert_eq!(range.min, benchmark.percentile25);
        assert_eq!(range.max, benchmark.percentile75);
        assert_eq!(range.currency, "USD");
    }
}
