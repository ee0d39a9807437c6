use serde::Deserialize;

/// Top-level feature-service query response. ArcGIS reports failures inside
/// an HTTP 200 body, so `error` has to be checked before `features` is used.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub features: Vec<Feature>,
    pub error: Option<ApiErrorBody>,
}

/// Error object embedded in an otherwise successful response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub attributes: CountryStats,
}

/// Aggregated statistics row for one country. Counts may be absent or null
/// when the upstream dataset has gaps; callers validate before use.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryStats {
    #[serde(rename = "Country_Region")]
    pub country_region: Option<String>,
    #[serde(rename = "Confirmed")]
    pub confirmed: Option<i64>,
    #[serde(rename = "Active")]
    pub active: Option<i64>,
    #[serde(rename = "Recovered")]
    pub recovered: Option<i64>,
    #[serde(rename = "Deaths")]
    pub deaths: Option<i64>,
    /// Epoch milliseconds, UTC.
    #[serde(rename = "Last_Update")]
    pub last_update: Option<i64>,
}
