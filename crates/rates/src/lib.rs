//! Exchange-rate driver subsystem.
//!
//! Rates come from three illustrative upstream feeds (xml/json/csv shaped)
//! that all normalize to the same pair→rate mapping. A TTL cache sits in
//! front of the sources, and an `average` driver combines all three. Drivers
//! are resolved by name through [`RateDriverRegistry`].

use std::collections::HashMap;

use thiserror::Error;

pub use average::average_of;
pub use cache::{Clock, RateCache, SystemClock};
pub use config::DriverConfig;
pub use registry::{RateDriver, RateDriverRegistry};
pub use source::{RateSource, SourceFormat};

mod average;
mod cache;
mod config;
mod registry;
mod source;

/// Normalized pair→rate mapping shared by every source and driver.
///
/// Keys follow `"{FROM}_{TO}"` semantics. Symmetric pairs are independent
/// entries: `USD_EUR` and `EUR_USD` must each be present in the source data,
/// they are never derived as inverses of each other.
pub type RateMap = HashMap<String, f64>;

/// Builds the canonical `"{FROM}_{TO}"` key for a currency pair.
pub fn pair_key(from: &str, to: &str) -> String {
    format!("{from}_{to}")
}

/// Errors of the rates subsystem.
#[derive(Error, Debug)]
pub enum RateError {
    /// The remote feed errored, timed out, or returned malformed data.
    ///
    /// Sources recover from this by serving their hardcoded fallback table,
    /// so it only surfaces to callers that fetch upstream directly.
    #[error("upstream rate source unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The requested driver name is not part of the closed driver set.
    #[error("\"{0}\" rate driver not supported")]
    UnsupportedDriver(String),
    /// The configured feed base url cannot be turned into an endpoint.
    #[error("invalid feed url: {0}")]
    InvalidFeedUrl(String),
}
