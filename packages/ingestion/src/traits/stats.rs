//! Wage statistics source trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::salary::SalaryBenchmark;

/// An external statistics service returning percentile wage data.
///
/// Two instances sit in the estimation chain: a domestic authoritative
/// source that only covers the home country, and a secondary international
/// source covering a fixed country list. `supports` gates whether the
/// chain consults a source at all for a given market.
#[async_trait]
pub trait WageStatsSource: Send + Sync {
    /// Source tag recorded on benchmarks it produces.
    fn name(&self) -> &str;

    /// Whether this source covers the given country.
    fn supports(&self, country: &str) -> bool;

    /// Fetch percentile wage data for one market.
    ///
    /// `Ok(None)` means the source has no data for this market, which is
    /// a normal fallthrough, not an error.
    async fn fetch_benchmark(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>>;
}
