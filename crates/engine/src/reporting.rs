//! Currency-converted reporting on top of the transaction store.
//!
//! Amounts stay exact integer EUR cents throughout the store; conversion to
//! USD happens here, at the presentation boundary, through the configured
//! default rate driver.

use std::sync::Arc;

use rates::RateDriverRegistry;

use crate::ops::transactions::{DateRange, Summary};
use crate::{Currency, Engine, MoneyCents, ResultEngine};

/// Convert an exact cent amount with a unit rate, rounding to the nearest
/// minor unit.
fn convert_cents(amount: MoneyCents, rate: f64) -> MoneyCents {
    MoneyCents::new((amount.cents() as f64 * rate).round() as i64)
}

/// One figure in both supported currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertedAmount {
    pub eur: MoneyCents,
    pub usd: MoneyCents,
}

impl ConvertedAmount {
    fn from_eur(eur: MoneyCents, rate: f64) -> ConvertedAmount {
        ConvertedAmount {
            eur,
            usd: convert_cents(eur, rate),
        }
    }
}

/// [`Summary`] with every figure converted to USD as well.
#[derive(Clone, Copy, Debug)]
pub struct ConvertedSummary {
    pub total_income: ConvertedAmount,
    pub total_expense: ConvertedAmount,
    /// Signed net, `total_income - total_expense`.
    pub total: ConvertedAmount,
    pub count: u64,
    pub period: DateRange,
}

/// All-time signed balance of an owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Balance {
    pub eur: MoneyCents,
    pub usd: MoneyCents,
}

/// Combines store summaries with the EUR→USD rate of the default driver.
#[derive(Clone, Debug)]
pub struct TransactionAggregator {
    engine: Arc<Engine>,
    registry: Arc<RateDriverRegistry>,
}

impl TransactionAggregator {
    pub fn new(engine: Arc<Engine>, registry: Arc<RateDriverRegistry>) -> TransactionAggregator {
        TransactionAggregator { engine, registry }
    }

    async fn eur_usd_rate(&self) -> ResultEngine<f64> {
        let driver = self.registry.driver(None)?;
        Ok(driver
            .get_rate(Currency::Eur.code(), Currency::Usd.code())
            .await)
    }

    /// Income/expense totals over `range`, in EUR and USD.
    pub async fn summary_with_conversion(
        &self,
        owner_id: &str,
        range: DateRange,
    ) -> ResultEngine<ConvertedSummary> {
        let summary: Summary = self.engine.summarize_transactions(owner_id, range).await?;
        let rate = self.eur_usd_rate().await?;

        let net = MoneyCents::new(summary.total_income.cents() - summary.total_expense.cents());
        Ok(ConvertedSummary {
            total_income: ConvertedAmount::from_eur(summary.total_income, rate),
            total_expense: ConvertedAmount::from_eur(summary.total_expense, rate),
            total: ConvertedAmount::from_eur(net, rate),
            count: summary.count,
            period: range,
        })
    }

    /// All-time net balance of `owner_id`, in EUR and USD.
    pub async fn balance(&self, owner_id: &str) -> ResultEngine<Balance> {
        let summary = self
            .engine
            .summarize_transactions(owner_id, DateRange::default())
            .await?;
        let rate = self.eur_usd_rate().await?;

        let eur = MoneyCents::new(summary.total_income.cents() - summary.total_expense.cents());
        Ok(Balance {
            eur,
            usd: convert_cents(eur, rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_rounds_to_nearest_cent() {
        assert_eq!(convert_cents(MoneyCents::new(3000), 1.09).cents(), 3270);
        assert_eq!(convert_cents(MoneyCents::new(1635), 1.0).cents(), 1635);
        // 15 * 1.09 = 16.35 -> 16
        assert_eq!(convert_cents(MoneyCents::new(15), 1.09).cents(), 16);
        assert_eq!(convert_cents(MoneyCents::new(-1050), 0.92).cents(), -966);
    }
}
