//! Upstream rate sources.
//!
//! The three variants differ only in wire parsing; all normalize to the same
//! [`RateMap`]. When the upstream call fails a source degrades to its
//! hardcoded fallback table instead of propagating the error. The fallback
//! values are configuration, distinct per variant, never computed.

use std::time::Duration;

use serde::Deserialize;

use crate::{RateError, RateMap, pair_key};

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Last-resort rates served when a feed is unreachable or malformed.
const XML_FALLBACK: &[(&str, &str, f64)] = &[("USD", "EUR", 0.92), ("EUR", "USD", 1.09)];
const JSON_FALLBACK: &[(&str, &str, f64)] = &[("USD", "EUR", 0.91), ("EUR", "USD", 1.10)];
const CSV_FALLBACK: &[(&str, &str, f64)] = &[("USD", "EUR", 0.93), ("EUR", "USD", 1.08)];

/// Wire format of an upstream feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Xml,
    Json,
    Csv,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [SourceFormat::Xml, SourceFormat::Json, SourceFormat::Csv];

    pub fn name(self) -> &'static str {
        match self {
            Self::Xml => "xml",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// Cache key of this source; one key per concrete variant.
    pub fn cache_key(self) -> &'static str {
        match self {
            Self::Xml => "rates_xml",
            Self::Json => "rates_json",
            Self::Csv => "rates_csv",
        }
    }

    fn feed_path(self) -> &'static str {
        match self {
            Self::Xml => "rates/xml",
            Self::Json => "rates/json",
            Self::Csv => "rates/csv",
        }
    }

    /// Hardcoded last-resort mapping for this variant.
    pub fn fallback_rates(self) -> RateMap {
        let table = match self {
            Self::Xml => XML_FALLBACK,
            Self::Json => JSON_FALLBACK,
            Self::Csv => CSV_FALLBACK,
        };
        table
            .iter()
            .map(|(from, to, rate)| (pair_key(from, to), *rate))
            .collect()
    }

    fn parse(self, body: &str) -> Result<RateMap, RateError> {
        match self {
            Self::Xml => parse_xml(body),
            Self::Json => parse_json(body),
            Self::Csv => parse_csv(body),
        }
    }
}

impl TryFrom<&str> for SourceFormat {
    type Error = RateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(RateError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// One upstream rate feed.
#[derive(Clone, Debug)]
pub struct RateSource {
    format: SourceFormat,
    endpoint: reqwest::Url,
    http: reqwest::Client,
}

impl RateSource {
    pub fn new(format: SourceFormat, feed_base_url: &str) -> Result<Self, RateError> {
        let base = reqwest::Url::parse(feed_base_url)
            .map_err(|err| RateError::InvalidFeedUrl(format!("{feed_base_url}: {err}")))?;
        let endpoint = base
            .join(format.feed_path())
            .map_err(|err| RateError::InvalidFeedUrl(format!("{feed_base_url}: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|err| RateError::UpstreamUnavailable(err.to_string()))?;

        Ok(Self {
            format,
            endpoint,
            http,
        })
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Fetches the feed, degrading to the fallback table on any upstream
    /// failure.
    pub async fn fetch_rates(&self) -> RateMap {
        match self.fetch_upstream().await {
            Ok(rates) => rates,
            Err(err) => {
                tracing::warn!(
                    source = self.format.name(),
                    endpoint = %self.endpoint,
                    "rate fetch failed, serving fallback rates: {err}"
                );
                self.format.fallback_rates()
            }
        }
    }

    /// Fetches and parses the feed without the fallback safety net.
    pub async fn fetch_upstream(&self) -> Result<RateMap, RateError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|err| RateError::UpstreamUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RateError::UpstreamUnavailable(format!(
                "{} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| RateError::UpstreamUnavailable(err.to_string()))?;

        self.format.parse(&body)
    }
}

fn malformed(format: SourceFormat) -> RateError {
    RateError::UpstreamUnavailable(format!("malformed {} feed", format.name()))
}

/// Extracts the text content of `<tag>…</tag>` inside a chunk.
fn extract_tag<'a>(chunk: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = chunk.find(&open)? + open.len();
    let end = chunk[start..].find(&close)? + start;
    Some(chunk[start..end].trim())
}

// The feed is flat enough (`<rate><from>..</from><to>..</to><value>..</value>`)
// that tag scanning beats pulling in an XML parser.
fn parse_xml(body: &str) -> Result<RateMap, RateError> {
    let mut rates = RateMap::new();
    let mut rest = body;

    while let Some(start) = rest.find("<rate>") {
        let after = &rest[start + "<rate>".len()..];
        let Some(end) = after.find("</rate>") else {
            return Err(malformed(SourceFormat::Xml));
        };
        let chunk = &after[..end];

        let (Some(from), Some(to), Some(value)) = (
            extract_tag(chunk, "from"),
            extract_tag(chunk, "to"),
            extract_tag(chunk, "value"),
        ) else {
            return Err(malformed(SourceFormat::Xml));
        };
        let value: f64 = value.parse().map_err(|_| malformed(SourceFormat::Xml))?;
        rates.insert(pair_key(from, to), value);

        rest = &after[end + "</rate>".len()..];
    }

    if rates.is_empty() {
        return Err(RateError::UpstreamUnavailable(
            "no rates found in xml feed".to_string(),
        ));
    }
    Ok(rates)
}

#[derive(Debug, Deserialize)]
struct JsonFeed {
    rates: Vec<JsonFeedRate>,
}

#[derive(Debug, Deserialize)]
struct JsonFeedRate {
    from: String,
    to: String,
    value: f64,
}

fn parse_json(body: &str) -> Result<RateMap, RateError> {
    let feed: JsonFeed = serde_json::from_str(body).map_err(|_| malformed(SourceFormat::Json))?;
    if feed.rates.is_empty() {
        return Err(RateError::UpstreamUnavailable(
            "no rates found in json feed".to_string(),
        ));
    }
    Ok(feed
        .rates
        .into_iter()
        .map(|rate| (pair_key(&rate.from, &rate.to), rate.value))
        .collect())
}

fn parse_csv(body: &str) -> Result<RateMap, RateError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rates = RateMap::new();
    for record in reader.records() {
        let record = record.map_err(|_| malformed(SourceFormat::Csv))?;
        // Rows that are not `FROM,TO,RATE` are skipped, not fatal.
        if record.len() != 3 {
            continue;
        }
        let value: f64 = record[2]
            .trim()
            .parse()
            .map_err(|_| malformed(SourceFormat::Csv))?;
        rates.insert(pair_key(record[0].trim(), record[1].trim()), value);
    }

    if rates.is_empty() {
        return Err(RateError::UpstreamUnavailable(
            "no rates found in csv feed".to_string(),
        ));
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_feed_parses_to_pair_map() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><rates>\
             <rate><from>USD</from><to>EUR</to><value>0.92</value></rate>\
             <rate><from>EUR</from><to>USD</to><value>1.09</value></rate></rates>";
        let rates = parse_xml(body).unwrap();
        assert_eq!(rates.get("USD_EUR"), Some(&0.92));
        assert_eq!(rates.get("EUR_USD"), Some(&1.09));
    }

    #[test]
    fn xml_feed_without_rates_is_malformed() {
        assert!(parse_xml("<rates></rates>").is_err());
        assert!(parse_xml("not xml at all").is_err());
    }

    #[test]
    fn json_feed_parses_to_pair_map() {
        let body = r#"{"rates":[{"from":"USD","to":"EUR","value":0.92}]}"#;
        let rates = parse_json(body).unwrap();
        assert_eq!(rates.get("USD_EUR"), Some(&0.92));
    }

    #[test]
    fn json_feed_with_wrong_shape_is_malformed() {
        assert!(parse_json(r#"{"quotes":[]}"#).is_err());
        assert!(parse_json(r#"{"rates":[]}"#).is_err());
    }

    #[test]
    fn csv_feed_parses_and_skips_short_rows() {
        let body = "USD,EUR,0.92\nnoise\nEUR,USD,1.09\n";
        let rates = parse_csv(body).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("EUR_USD"), Some(&1.09));
    }

    #[test]
    fn csv_feed_with_bad_rate_is_malformed() {
        assert!(parse_csv("USD,EUR,not-a-number\n").is_err());
    }

    #[test]
    fn fallback_tables_differ_per_variant() {
        let xml = SourceFormat::Xml.fallback_rates();
        let json = SourceFormat::Json.fallback_rates();
        let csv = SourceFormat::Csv.fallback_rates();
        assert_eq!(xml.get("USD_EUR"), Some(&0.92));
        assert_eq!(json.get("USD_EUR"), Some(&0.91));
        assert_eq!(csv.get("USD_EUR"), Some(&0.93));
    }

    #[test]
    fn symmetric_pairs_are_not_inverses() {
        // Each direction is an independent feed entry; 0.92 * 1.09 != 1.
        let rates = SourceFormat::Xml.fallback_rates();
        let product = rates["USD_EUR"] * rates["EUR_USD"];
        assert!((product - 1.0).abs() > 1e-6);
    }

    #[tokio::test]
    async fn unreachable_feed_degrades_to_fallback() {
        // Port 9 (discard) refuses connections immediately.
        let source = RateSource::new(SourceFormat::Json, "http://127.0.0.1:9").unwrap();
        assert!(source.fetch_upstream().await.is_err());
        assert_eq!(source.fetch_rates().await, SourceFormat::Json.fallback_rates());
    }
}
