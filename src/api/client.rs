use anyhow::Context;
use reqwest::Url;
use std::time::Duration;

/// Upper bound on a single rate-table request.
pub const RATE_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct ScavengerClient {
    base: Url,
    http: reqwest::Client,
}

impl ScavengerClient {
    pub fn new(base: String) -> anyhow::Result<Self> {
        Self::with_timeout(base, RATE_FETCH_TIMEOUT)
    }

    pub fn with_timeout(base: String, timeout: Duration) -> anyhow::Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base = if base.ends_with('/') { base } else { format!("{base}/") };
        let base = Url::parse(&base).with_context(|| format!("invalid api base {base}"))?;
        let http = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                h
            })
            .timeout(timeout)
            .build()?;
        Ok(Self { base, http })
    }

    /// Fetch STAR-per-receipt array for each day.
    /// Endpoint: GET {base}/work_to_star_rate
    /// - Example: [10882519, 7692307, 12487254]
    /// - 1 NIGHT = 1_000_000 STAR
    pub async fn get_work_to_star_rate(&self) -> anyhow::Result<Vec<f64>> {
        let url = self.base.join("work_to_star_rate")?;
        let resp = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()
            .context("work_to_star_rate request failed")?;
        // Server returns a plain JSON array of numbers
        let v: Vec<f64> = resp.json().await.context("decoding work_to_star_rate")?;
        Ok(v)
    }

    /// Rate table, or an empty one if it cannot be fetched. Missing rates
    /// price receipts at zero, so stats stay available while the API is down.
    pub async fn fetch_rates(&self) -> Vec<f64> {
        match self.get_work_to_star_rate().await {
            Ok(rates) => {
                tracing::debug!(rates = rates.len(), "fetched STAR rates");
                rates
            }
            Err(e) => {
                tracing::warn!("STAR rates unavailable, using empty table: {e:#}");
                Vec::new()
            }
        }
    }
}
