//! Repository and service traits for the fund series.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::fund_model::{FundHistoryPoint, FundSummary, RecomputeOutcome};
use crate::errors::Result;

/// Persistence for derived fund rows, keyed by (owner, date).
#[async_trait]
pub trait FundHistoryRepositoryTrait: Send + Sync {
    /// Rows for an owner in date order, optionally bounded on either side.
    fn get_history(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<FundHistoryPoint>>;

    /// Deletes every row of the owner and inserts `points` in one transaction.
    ///
    /// Either all of the new rows are visible afterwards or none of the
    /// previous rows were touched.
    async fn replace_history(&self, owner_id: &str, points: Vec<FundHistoryPoint>)
        -> Result<usize>;
}

/// Rebuilds an owner's fund series from scratch.
///
/// Every write that can change a daily total or an external flow calls this
/// after committing. Failures are reported in the outcome, never by panicking,
/// and leave the previously stored series intact.
#[async_trait]
pub trait RecomputeTrigger: Send + Sync {
    async fn recompute(&self, owner_id: &str) -> RecomputeOutcome;
}

#[async_trait]
pub trait FundServiceTrait: RecomputeTrigger {
    fn get_fund_history(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<FundHistoryPoint>>;

    fn get_latest_point(&self, owner_id: &str) -> Result<Option<FundHistoryPoint>>;

    /// Dashboard figures; `None` when the owner has no history.
    fn get_fund_summary(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Option<FundSummary>>;

    /// Drops the cached series of the owner.
    fn invalidate_cache(&self, owner_id: &str);
}
