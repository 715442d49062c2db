use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::currency::normalize_currency_code;
use super::fx_model::ExchangeRate;

/// Outcome of looking up a currency on a given day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateLookup {
    /// The currency is the base currency; the rate is exactly one.
    Base,
    /// The most recent rate on or before the requested day.
    Found { rate: Decimal, as_of: NaiveDate },
    /// No rate on or before the requested day.
    Missing,
}

/// Per-currency rate history against a single base currency.
///
/// Each currency keeps its own time series and lookups take the latest entry
/// on or before the requested day, so a rate stays in force until the next
/// one is recorded.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    base_currency: String,
    rates: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl RateTable {
    pub fn new(base_currency: &str, exchange_rates: Vec<ExchangeRate>) -> Self {
        let mut table = RateTable {
            base_currency: normalize_currency_code(base_currency),
            rates: HashMap::new(),
        };
        table.add_rates(exchange_rates);
        table
    }

    /// Adds rates, replacing any existing entry for the same (currency, date).
    /// Rates for the base currency and non-positive rates are ignored.
    pub fn add_rates(&mut self, exchange_rates: Vec<ExchangeRate>) {
        for rate in exchange_rates {
            let currency = normalize_currency_code(&rate.currency);
            if currency == self.base_currency {
                continue;
            }
            if rate.rate <= Decimal::ZERO {
                warn!(
                    "Ignoring non-positive exchange rate {} for {} on {}",
                    rate.rate, currency, rate.date
                );
                continue;
            }
            self.rates
                .entry(currency)
                .or_default()
                .insert(rate.date, rate.rate);
        }
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn lookup(&self, currency: &str, date: NaiveDate) -> RateLookup {
        let currency = normalize_currency_code(currency);
        if currency == self.base_currency {
            return RateLookup::Base;
        }
        self.rates
            .get(&currency)
            .and_then(|history| history.range(..=date).next_back())
            .map(|(as_of, rate)| RateLookup::Found {
                rate: *rate,
                as_of: *as_of,
            })
            .unwrap_or(RateLookup::Missing)
    }

    /// Rate to apply on `date`, plus whether it had to fall back to 1.0.
    pub fn rate_or_identity(&self, currency: &str, date: NaiveDate) -> (Decimal, bool) {
        match self.lookup(currency, date) {
            RateLookup::Base => (Decimal::ONE, false),
            RateLookup::Found { rate, .. } => (rate, false),
            RateLookup::Missing => (Decimal::ONE, true),
        }
    }

    /// Most recent rate recorded for the currency, irrespective of date.
    pub fn latest_rate(&self, currency: &str) -> Option<Decimal> {
        let currency = normalize_currency_code(currency);
        if currency == self.base_currency {
            return Some(Decimal::ONE);
        }
        self.rates
            .get(&currency)
            .and_then(|history| history.values().next_back().copied())
    }

    /// Latest rate per currency, base currency included at 1.0.
    pub fn latest_rates(&self) -> BTreeMap<String, Decimal> {
        let mut latest: BTreeMap<String, Decimal> = self
            .rates
            .iter()
            .filter_map(|(currency, history)| {
                history
                    .values()
                    .next_back()
                    .map(|rate| (currency.clone(), *rate))
            })
            .collect();
        latest.insert(self.base_currency.clone(), Decimal::ONE);
        latest
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
