use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::currency::normalize_currency_code;
use super::fx_model::{ExchangeRate, NewExchangeRate};
use super::fx_traits::{FxRepositoryTrait, FxServiceTrait};
use super::rate_table::RateTable;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

/// Rate maintenance does not rebuild any fund series on its own; callers that
/// back-fill rates follow up with a recompute for the owners they care about.
pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl FxService {
    pub fn new(
        repository: Arc<dyn FxRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            repository,
            event_sink,
        }
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    fn get_exchange_rates(&self) -> Result<Vec<ExchangeRate>> {
        self.repository.get_all_rates()
    }

    fn build_rate_table(&self, base_currency: &str) -> Result<RateTable> {
        let rates = self.repository.get_all_rates()?;
        debug!(
            "Building rate table against {} from {} rate(s)",
            base_currency,
            rates.len()
        );
        Ok(RateTable::new(base_currency, rates))
    }

    fn get_latest_rates(&self, base_currency: &str) -> Result<BTreeMap<String, Decimal>> {
        Ok(self.build_rate_table(base_currency)?.latest_rates())
    }

    async fn save_exchange_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate> {
        let rate = new_rate.into_validated()?;
        self.repository.upsert_rates(vec![rate.clone()]).await?;
        self.event_sink
            .emit(DomainEvent::exchange_rates_changed(vec![rate.currency.clone()]));
        Ok(rate)
    }

    async fn save_exchange_rates(&self, new_rates: Vec<NewExchangeRate>) -> Result<usize> {
        let rates = new_rates
            .into_iter()
            .map(NewExchangeRate::into_validated)
            .collect::<Result<Vec<_>>>()?;
        if rates.is_empty() {
            return Ok(0);
        }
        let currencies: BTreeSet<String> = rates.iter().map(|r| r.currency.clone()).collect();
        let saved = self.repository.upsert_rates(rates).await?;
        self.event_sink.emit(DomainEvent::exchange_rates_changed(
            currencies.into_iter().collect(),
        ));
        Ok(saved)
    }

    async fn delete_exchange_rate(&self, date: NaiveDate, currency: &str) -> Result<()> {
        let currency = normalize_currency_code(currency);
        let deleted = self.repository.delete_rate(date, &currency).await?;
        if deleted > 0 {
            self.event_sink
                .emit(DomainEvent::exchange_rates_changed(vec![currency]));
        }
        Ok(())
    }
}
