use anyhow::{Context, Result};
use tracing::debug;

use sunshine_core::models::ForecastQuery;
use sunshine_core::openweather::query_pairs;
use sunshine_core::sync::ForecastFetcher;

pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    rt: tokio::runtime::Handle,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "sunshine-cli/{} (weather forecast)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            rt: tokio::runtime::Handle::current(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the body even for error statuses: the payload carries its own
    /// `cod` field, which the parser interprets.
    pub async fn fetch_async(&self, query: &ForecastQuery) -> Result<String> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&query_pairs(query))
            .send()
            .await
            .context("Failed to reach forecast API")?;

        debug!(status = %resp.status(), "forecast response");
        resp.text()
            .await
            .context("Failed to read forecast response")
    }
}

impl ForecastFetcher for OpenWeatherClient {
    fn fetch(&self, query: &ForecastQuery) -> Result<String> {
        self.rt.block_on(self.fetch_async(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunshine_core::dates::{SystemClock, normalized_today};
    use sunshine_core::models::{Location, Units};
    use sunshine_core::openweather::{DEFAULT_API_URL, FORECAST_DAYS, ParsedForecast, parse_forecast};

    #[tokio::test]
    #[ignore = "hits the forecast API"]
    async fn test_fetch_default_location() {
        let client = OpenWeatherClient::new(DEFAULT_API_URL).unwrap();
        let query = ForecastQuery {
            location: Location::Query {
                query: "94043,USA".to_string(),
            },
            days: FORECAST_DAYS,
            units: Units::Metric,
        };
        let body = client.fetch_async(&query).await.unwrap();
        let parsed = parse_forecast(&body, normalized_today(&SystemClock)).unwrap();
        let ParsedForecast::Forecast { days, .. } = parsed else {
            panic!("expected a forecast");
        };
        assert!(!days.is_empty());
    }
}
