pub mod error;
pub mod types;

pub use error::{ArcgisError, Result};
pub use types::{CountryStats, Feature, QueryResponse};

use std::time::Duration;

const BASE_URL: &str =
    "https://services1.arcgis.com/0MSEUqKaxRlEPj5g/arcgis/rest/services/ncov_cases/FeatureServer/1";

/// Per-metric sum aggregates plus the max observation stamp, grouped by
/// country. The service takes this as a literal JSON-ish string parameter.
const OUT_STATISTICS: &str = "[\
{'statisticType':'sum','onStatisticField':'Confirmed','outStatisticFieldName':'Confirmed'},\
{'statisticType':'sum','onStatisticField':'Active','outStatisticFieldName':'Active'},\
{'statisticType':'sum','onStatisticField':'Recovered','outStatisticFieldName':'Recovered'},\
{'statisticType':'sum','onStatisticField':'Deaths','outStatisticFieldName':'Deaths'},\
{'statisticType':'max','onStatisticField':'Last_Update','outStatisticFieldName':'Last_Update'}]";

pub struct ArcgisClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArcgisClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different feature service (tests, mirrors).
    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the aggregated statistics row for one country.
    pub async fn country_stats(&self, country: &str) -> Result<QueryResponse> {
        let url = format!("{}/query", self.base_url);
        let where_clause = format!("Country_Region='{}'", country);

        tracing::debug!(country, "Querying statistics feature service");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("f", "json"),
                ("where", where_clause.as_str()),
                ("returnGeometry", "false"),
                ("outStatistics", OUT_STATISTICS),
                ("groupByFieldsForStatistics", "Country_Region"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ArcgisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: QueryResponse = resp.json().await?;
        if let Some(error) = body.error {
            return Err(ArcgisError::Api {
                status: error.code as u16,
                message: error.message,
            });
        }

        Ok(body)
    }
}

impl Default for ArcgisClient {
    fn default() -> Self {
        Self::new()
    }
}
