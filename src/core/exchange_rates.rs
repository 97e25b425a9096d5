//! Exchange rate table and rate generation
//!
//! `ExchangeRates` holds the current rate per currency code. The whole table
//! is replaced in one step on every refresh, so a reader always sees rates
//! from a single refresh and never a mix of two.

use crate::core::traits::RateSource;
use parking_lot::RwLock;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// Immutable table of rates keyed by currency code
pub type RateTable = HashMap<String, Decimal>;

/// Shared, atomically swapped exchange rate table
#[derive(Debug, Default)]
pub struct ExchangeRates {
    table: RwLock<Arc<RateTable>>,
}

impl ExchangeRates {
    /// Create an empty table; every lookup answers "not found"
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table seeded with fixed rates
    pub fn with_rates<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<String>,
    {
        let table = rates.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Replace the whole table
    pub fn replace(&self, table: RateTable) {
        *self.table.write() = Arc::new(table);
    }

    /// The table as of now
    pub fn snapshot(&self) -> Arc<RateTable> {
        Arc::clone(&*self.table.read())
    }
}

impl RateSource for ExchangeRates {
    fn rate(&self, currency: &str) -> Option<Decimal> {
        self.table.read().get(currency).copied()
    }

    fn quote(&self, from: &str, to: &str) -> Option<(Decimal, Decimal)> {
        let table = self.snapshot();
        Some((*table.get(from)?, *table.get(to)?))
    }
}

/// Draws a fresh random rate for each configured currency
///
/// Rates are drawn uniformly from a half-open range and carry four decimal
/// places.
#[derive(Debug, Clone)]
pub struct RandomRateGenerator {
    ranges: Vec<(String, Range<Decimal>)>,
}

const RATE_SCALE: u32 = 4;

impl Default for RandomRateGenerator {
    fn default() -> Self {
        Self::new([
            ("USD", Decimal::new(90, 0)..Decimal::new(110, 0)),
            ("EUR", Decimal::new(105, 0)..Decimal::new(130, 0)),
            ("GBP", Decimal::new(150, 0)..Decimal::new(160, 0)),
        ])
    }
}

impl RandomRateGenerator {
    /// Create a generator for the given currency ranges
    pub fn new<I, K>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (K, Range<Decimal>)>,
        K: Into<String>,
    {
        Self {
            ranges: ranges.into_iter().map(|(k, r)| (k.into(), r)).collect(),
        }
    }

    /// Currencies this generator produces rates for
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.ranges.iter().map(|(currency, _)| currency.as_str())
    }

    /// Draw a complete new table
    pub fn generate(&self) -> RateTable {
        let mut rng = rand::thread_rng();
        self.ranges
            .iter()
            .map(|(currency, range)| (currency.clone(), draw(&mut rng, range)))
            .collect()
    }
}

fn draw<R: Rng>(rng: &mut R, range: &Range<Decimal>) -> Decimal {
    let factor = Decimal::from(10_i64.pow(RATE_SCALE));
    let low = (range.start * factor).trunc();
    let high = (range.end * factor).trunc();
    let (Ok(low), Ok(high)) = (i64::try_from(low), i64::try_from(high)) else {
        return range.start;
    };
    if low >= high {
        return range.start;
    }
    Decimal::new(rng.gen_range(low..high), RATE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_missing_currency_is_not_found() {
        let rates = ExchangeRates::with_rates([("USD", Decimal::new(100, 0))]);

        assert_eq!(rates.rate("USD"), Some(Decimal::new(100, 0)));
        assert_eq!(rates.rate("JPY"), None);
        assert_eq!(ExchangeRates::new().rate("USD"), None);
    }

    #[test]
    fn test_replace_swaps_whole_table() {
        let rates = ExchangeRates::with_rates([("USD", Decimal::ONE), ("EUR", Decimal::TWO)]);
        let before = rates.snapshot();

        rates.replace(RateTable::from([("GBP".to_string(), Decimal::TEN)]));

        assert_eq!(rates.rate("USD"), None);
        assert_eq!(rates.rate("GBP"), Some(Decimal::TEN));
        // Earlier snapshots are unaffected by the swap
        assert_eq!(before.get("USD"), Some(&Decimal::ONE));
    }

    #[rstest]
    #[case::both_known("USD", "EUR", Some((Decimal::ONE, Decimal::TWO)))]
    #[case::unknown_from("JPY", "EUR", None)]
    #[case::unknown_to("USD", "JPY", None)]
    fn test_quote(
        #[case] from: &str,
        #[case] to: &str,
        #[case] expected: Option<(Decimal, Decimal)>,
    ) {
        let rates = ExchangeRates::with_rates([("USD", Decimal::ONE), ("EUR", Decimal::TWO)]);
        assert_eq!(rates.quote(from, to), expected);
    }

    #[test]
    fn test_default_generator_stays_in_range() {
        let generator = RandomRateGenerator::default();

        for _ in 0..100 {
            let table = generator.generate();
            assert_eq!(table.len(), 3);

            let usd = table["USD"];
            assert!(usd >= Decimal::new(90, 0) && usd < Decimal::new(110, 0));
            let eur = table["EUR"];
            assert!(eur >= Decimal::new(105, 0) && eur < Decimal::new(130, 0));
            let gbp = table["GBP"];
            assert!(gbp >= Decimal::new(150, 0) && gbp < Decimal::new(160, 0));
            assert!(usd.scale() <= RATE_SCALE);
        }
    }

    #[test]
    fn test_empty_range_yields_start() {
        let generator = RandomRateGenerator::new([("USD", Decimal::TEN..Decimal::TEN)]);
        assert_eq!(generator.generate()["USD"], Decimal::TEN);
    }
}
