//! Name→driver resolution.

use crate::{
    DriverConfig, RateCache, RateError, RateMap, RateSource, SourceFormat, average, pair_key,
};

const AVERAGE_DRIVER: &str = "average";
const AVERAGE_CACHE_KEY: &str = "rates_average";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DriverKind {
    Source(SourceFormat),
    Average,
}

/// Resolves named drivers (`xml`, `json`, `csv`, `average`) to configured
/// instances and owns the shared TTL cache.
pub struct RateDriverRegistry {
    sources: Vec<RateSource>,
    cache: RateCache,
    default_driver: String,
}

impl RateDriverRegistry {
    pub fn new(config: &DriverConfig) -> Result<Self, RateError> {
        let sources = SourceFormat::ALL
            .iter()
            .map(|format| RateSource::new(*format, &config.feed_base_url))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            sources,
            cache: RateCache::new(config.cache_ttl_secs),
            default_driver: config.default_driver.clone(),
        })
    }

    /// Resolves a driver by name; `None` falls back to the configured
    /// default driver.
    pub fn driver(&self, name: Option<&str>) -> Result<RateDriver<'_>, RateError> {
        let name = name.unwrap_or(&self.default_driver);
        let kind = if name == AVERAGE_DRIVER {
            DriverKind::Average
        } else {
            DriverKind::Source(SourceFormat::try_from(name)?)
        };

        Ok(RateDriver {
            registry: self,
            kind,
        })
    }

    /// Evicts all cached rate maps; the next lookup refetches.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn rates_for(&self, kind: DriverKind) -> RateMap {
        match kind {
            DriverKind::Source(format) => {
                // One source per format is constructed in `new`.
                match self.sources.iter().find(|s| s.format() == format) {
                    Some(source) => self.cache.get_rates(source).await,
                    None => RateMap::new(),
                }
            }
            DriverKind::Average => {
                self.cache
                    .remember(AVERAGE_CACHE_KEY, average::fetch_average(&self.sources))
                    .await
            }
        }
    }
}

impl std::fmt::Debug for RateDriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateDriverRegistry")
            .field("default_driver", &self.default_driver)
            .finish_non_exhaustive()
    }
}

/// A resolved driver, bound to the registry's sources and cache.
#[derive(Debug)]
pub struct RateDriver<'a> {
    registry: &'a RateDriverRegistry,
    kind: DriverKind,
}

impl RateDriver<'_> {
    /// Looks up the rate for `(from, to)` in this driver's mapping.
    ///
    /// Unknown pairs are zero-rated rather than an error; the policy is
    /// applied consistently across all drivers.
    pub async fn get_rate(&self, from: &str, to: &str) -> f64 {
        self.rates()
            .await
            .get(&pair_key(from, to))
            .copied()
            .unwrap_or(0.0)
    }

    /// The driver's full (possibly cached) pair→rate mapping.
    pub async fn rates(&self) -> RateMap {
        self.registry.rates_for(self.kind).await
    }

    /// Drops only this driver's cached mapping; the other drivers keep
    /// serving their cached maps.
    pub fn clear_cache(&self) {
        let key = match self.kind {
            DriverKind::Source(format) => format.cache_key(),
            DriverKind::Average => AVERAGE_CACHE_KEY,
        };
        self.registry.cache.clear_key(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> DriverConfig {
        DriverConfig {
            default_driver: AVERAGE_DRIVER.to_string(),
            cache_ttl_secs: 300,
            // Discard port: connections are refused, sources fall back.
            feed_base_url: "http://127.0.0.1:9".to_string(),
        }
    }

    #[test]
    fn unknown_driver_name_is_rejected() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        assert!(matches!(
            registry.driver(Some("yaml")),
            Err(RateError::UnsupportedDriver(name)) if name == "yaml"
        ));
    }

    #[test]
    fn omitted_name_uses_configured_default() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        assert!(registry.driver(None).is_ok());
    }

    #[tokio::test]
    async fn named_source_driver_serves_its_fallback_when_offline() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        let driver = registry.driver(Some("xml")).unwrap();
        assert!((driver.get_rate("USD", "EUR").await - 0.92).abs() < 1e-9);
    }

    #[tokio::test]
    async fn average_driver_means_the_three_fallbacks() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        let driver = registry.driver(Some(AVERAGE_DRIVER)).unwrap();
        // (0.92 + 0.91 + 0.93) / 3
        assert!((driver.get_rate("USD", "EUR").await - 0.92).abs() < 1e-9);
    }

    #[tokio::test]
    async fn driver_cache_clear_still_resolves_rates() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        let driver = registry.driver(Some("csv")).unwrap();
        assert!((driver.get_rate("USD", "EUR").await - 0.93).abs() < 1e-9);

        driver.clear_cache();
        assert!((driver.get_rate("USD", "EUR").await - 0.93).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_pair_is_zero_rated() {
        let registry = RateDriverRegistry::new(&offline_config()).unwrap();
        let driver = registry.driver(Some("json")).unwrap();
        assert_eq!(driver.get_rate("GBP", "JPY").await, 0.0);
    }
}
