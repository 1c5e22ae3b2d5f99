use serde::Deserialize;

/// Process-wide configuration of the rates subsystem.
///
/// Read once at startup (the app deserializes it from the `[currency]`
/// section of the settings file) and immutable afterwards.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Driver used when no explicit name is given (`xml`, `json`, `csv` or
    /// `average`).
    pub default_driver: String,
    /// Cache validity window for fetched rate maps, in seconds.
    pub cache_ttl_secs: u64,
    /// Base url of the server exposing the `/rates/{xml,json,csv}` feeds.
    pub feed_base_url: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            default_driver: "average".to_string(),
            cache_ttl_secs: 300,
            feed_base_url: "http://127.0.0.1:3000".to_string(),
        }
    }
}
