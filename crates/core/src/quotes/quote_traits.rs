use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Duration;

use super::errors::QuoteError;
use super::quote_refresh_service::QuoteRefreshReport;
use crate::assets::AssetKind;
use crate::errors::Result;

/// Source of unit prices. No network implementation ships with this crate.
#[async_trait]
pub trait QuoteProviderTrait: Send + Sync {
    /// Unit price of `code` for `date`: a fund's NAV on or before the day, a
    /// stock's latest price. `Ok(None)` when the provider has nothing.
    async fn get_unit_price(
        &self,
        code: &str,
        kind: AssetKind,
        date: NaiveDate,
    ) -> Result<Option<Decimal>>;
}

/// Asks the provider for a unit price, giving up after `timeout`.
pub async fn fetch_unit_price(
    provider: &dyn QuoteProviderTrait,
    code: &str,
    kind: AssetKind,
    date: NaiveDate,
    timeout: Duration,
) -> Result<Option<Decimal>> {
    match tokio::time::timeout(timeout, provider.get_unit_price(code, kind, date)).await {
        Ok(result) => result,
        Err(_) => Err(QuoteError::Timeout {
            code: code.to_string(),
            timeout_secs: timeout.as_secs(),
        }
        .into()),
    }
}

#[async_trait]
pub trait QuoteRefreshServiceTrait: Send + Sync {
    /// Re-prices the selected assets for `date`. Per-asset failures are
    /// collected in the report and never abort the batch.
    async fn refresh_unit_navs(
        &self,
        owner_id: &str,
        date: NaiveDate,
        asset_ids: &[String],
    ) -> Result<QuoteRefreshReport>;
}
