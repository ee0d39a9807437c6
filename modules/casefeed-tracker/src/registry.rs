use casefeed_common::Config;

/// Default tracked countries. The config may override the set via a
/// comma-separated list; the identifiers here are also the store keys, so a
/// renamed entry starts a fresh history.
pub const DEFAULT_COUNTRIES: [&str; 6] = [
    "Slovakia", "Austria", "Czechia", "Hungary", "Poland", "Ukraine",
];

/// The entities this deployment tracks.
pub fn registered_entities(config: &Config) -> Vec<String> {
    match &config.countries {
        Some(countries) => countries.clone(),
        None => DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
    }
}
