//! Arithmetic-mean combination of several rate sources.

use std::collections::HashMap;

use crate::{RateMap, RateSource};

/// Averages a set of already-fetched rate maps per pair key.
///
/// A pair is averaged over the maps that actually report it; maps missing
/// the pair are excluded from the mean, not treated as zero.
pub fn average_of<I>(maps: I) -> RateMap
where
    I: IntoIterator<Item = RateMap>,
{
    let mut samples: HashMap<String, Vec<f64>> = HashMap::new();
    for map in maps {
        for (pair, rate) in map {
            samples.entry(pair).or_default().push(rate);
        }
    }

    samples
        .into_iter()
        .map(|(pair, rates)| {
            let mean = rates.iter().sum::<f64>() / rates.len() as f64;
            (pair, mean)
        })
        .collect()
}

/// Fetches every source's raw rates and averages them.
///
/// Deliberately bypasses any cache: the sources are asked directly so the
/// averaged figures never mix cache entries of different ages. Callers that
/// want memoization wrap the result in the cache under the `average` key.
pub async fn fetch_average(sources: &[RateSource]) -> RateMap {
    let mut maps = Vec::with_capacity(sources.len());
    for source in sources {
        maps.push(source.fetch_rates().await);
    }
    average_of(maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair_key;

    #[test]
    fn averages_per_pair_over_reporting_sources() {
        let maps = vec![
            RateMap::from([(pair_key("USD", "EUR"), 0.90)]),
            RateMap::from([(pair_key("USD", "EUR"), 0.92)]),
            RateMap::from([(pair_key("USD", "EUR"), 0.94)]),
        ];

        let avg = average_of(maps);
        assert!((avg["USD_EUR"] - 0.92).abs() < 1e-9);
    }

    #[test]
    fn missing_pairs_do_not_drag_the_mean_down() {
        let maps = vec![
            RateMap::from([(pair_key("USD", "EUR"), 0.90), (pair_key("EUR", "USD"), 1.10)]),
            RateMap::from([(pair_key("USD", "EUR"), 0.94)]),
        ];

        let avg = average_of(maps);
        // EUR_USD is only reported by one source, so its value passes through.
        assert!((avg["EUR_USD"] - 1.10).abs() < 1e-9);
        assert!((avg["USD_EUR"] - 0.92).abs() < 1e-9);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(average_of(Vec::<RateMap>::new()).is_empty());
    }
}
