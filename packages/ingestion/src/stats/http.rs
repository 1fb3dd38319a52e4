//! HTTP wage statistics client.
//!
//! One client type serves both slots in the estimation chain: the
//! domestic authoritative source (coverage = the home country) and the
//! secondary international source (coverage = a fixed country list).
//! The wire shape is percentile wage JSON per market; figures arrive in
//! the source's currency and are normalized to annual USD here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{IngestError, Result};
use crate::traits::stats::WageStatsSource;
use crate::types::salary::{to_usd, SalaryBenchmark};

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Percentile wage data as the statistics API publishes it.
#[derive(Debug, Deserialize)]
struct WageResponse {
    min: i64,
    max: i64,
    average: i64,
    median: i64,
    percentile25: i64,
    percentile75: i64,
    sample_size: u32,
    /// ISO 4217; absent means the figures are already USD
    currency: Option<String>,
}

/// A wage statistics API spoken to over HTTP.
pub struct HttpWageStats {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    countries: Vec<String>,
    client: Client,
}

impl HttpWageStats {
    /// Create a client covering the given countries.
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        countries: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: None,
            countries,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Attach a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Convert a wire response into a benchmark, normalizing to USD.
    ///
    /// An unconvertible currency makes the whole result unusable: better
    /// a fallthrough to the next tier than silently mis-scaled figures.
    fn to_benchmark(
        &self,
        response: WageResponse,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Option<SalaryBenchmark> {
        let currency = response.currency.as_deref().unwrap_or("USD");
        let convert = |amount: i64| to_usd(amount, currency);

        Some(SalaryBenchmark {
            title: normalized_title.to_string(),
            country: country.to_string(),
            region: region.map(String::from),
            min: convert(response.min)?,
            max: convert(response.max)?,
            avg: convert(response.average)?,
            median: convert(response.median)?,
            percentile25: convert(response.percentile25)?,
            percentile75: convert(response.percentile75)?,
            sample_size: response.sample_size,
            source: self.name.clone(),
            computed_at: chrono::Utc::now(),
        })
    }
}

#[async_trait]
impl WageStatsSource for HttpWageStats {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c == country)
    }

    async fn fetch_benchmark(
        &self,
        normalized_title: &str,
        country: &str,
        region: Option<&str>,
    ) -> Result<Option<SalaryBenchmark>> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("title", normalized_title),
            ("country", country),
        ]);
        if let Some(region) = region {
            request = request.query(&[("region", region)]);
        }
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::Stats(Box::new(e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // No data for this market is a normal fallthrough.
            debug!(source = %self.name, title = %normalized_title, country, "no wage data");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IngestError::Stats(
                format!("{} returned HTTP {status}", self.name).into(),
            ));
        }

        let wage: WageResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Stats(Box::new(e)))?;

        match self.to_benchmark(wage, normalized_title, country, region) {
            Some(benchmark) => Ok(Some(benchmark)),
            None => {
                warn!(
                    source = %self.name,
                    title = %normalized_title,
                    country,
                    "wage data in an unconvertible currency, discarding"
                );
                Ok(None)
            }
        }
    }
}
