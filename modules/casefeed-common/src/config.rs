use std::env;

use chrono_tz::Tz;
use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database_path: String,

    /// Tracked-country override; `None` falls back to the built-in registry.
    pub countries: Option<Vec<String>>,

    /// Canonical timezone all observed stamps are normalized into.
    pub timezone: Tz,

    /// Broker HTTP publish endpoint. Unset selects the noop backend.
    pub broker_url: Option<String>,
    pub broker_token: Option<String>,

    /// Per-entity topic prefix, e.g. `COVID19` -> `COVID19/Slovakia`.
    pub topic_prefix: String,
    pub publish_qos: u8,
    pub publish_retain: bool,

    /// Override for the statistics endpoint (tests, self-hosted mirrors).
    pub source_base_url: Option<String>,

    /// Max entities processed concurrently within one cycle.
    pub entity_fanout: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if a value fails to parse.
    pub fn from_env() -> Self {
        let publish_qos: u8 = env::var("CASEFEED_PUBLISH_QOS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .expect("CASEFEED_PUBLISH_QOS must be a number");
        if publish_qos > 2 {
            panic!("CASEFEED_PUBLISH_QOS must be 0, 1, or 2");
        }

        let entity_fanout: usize = env::var("CASEFEED_FANOUT")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .expect("CASEFEED_FANOUT must be a number");
        if entity_fanout == 0 {
            panic!("CASEFEED_FANOUT must be at least 1");
        }

        Self {
            database_path: env::var("CASEFEED_DB_PATH")
                .unwrap_or_else(|_| "casefeed.db".to_string()),
            countries: env::var("CASEFEED_COUNTRIES")
                .ok()
                .map(|raw| parse_list(&raw)),
            timezone: env::var("CASEFEED_TIMEZONE")
                .unwrap_or_else(|_| "Europe/Bratislava".to_string())
                .parse()
                .expect("CASEFEED_TIMEZONE must be a valid IANA timezone"),
            broker_url: env::var("BROKER_URL").ok(),
            broker_token: env::var("BROKER_TOKEN").ok(),
            topic_prefix: env::var("CASEFEED_TOPIC_PREFIX")
                .unwrap_or_else(|_| "COVID19".to_string()),
            publish_qos,
            publish_retain: env::var("CASEFEED_PUBLISH_RETAIN")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .expect("CASEFEED_PUBLISH_RETAIN must be true or false"),
            source_base_url: env::var("ARCGIS_BASE_URL").ok(),
            entity_fanout,
        }
    }

    /// Log the effective configuration. The broker token is never printed.
    pub fn log_summary(&self) {
        info!(
            db = self.database_path.as_str(),
            timezone = %self.timezone,
            topic_prefix = self.topic_prefix.as_str(),
            qos = self.publish_qos,
            retain = self.publish_retain,
            fanout = self.entity_fanout,
            "Config loaded"
        );
        match &self.broker_url {
            Some(url) => info!(
                broker = url.as_str(),
                token_set = self.broker_token.is_some(),
                "Publishing via HTTP bridge"
            ),
            None => info!("BROKER_URL not set, events will be discarded"),
        }
        if let Some(countries) = &self.countries {
            info!(countries = %countries.join(", "), "Tracked countries overridden");
        }
        if let Some(base_url) = &self.source_base_url {
            info!(base_url = base_url.as_str(), "Statistics source overridden");
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
