//! Domain event types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Facts about data changes, emitted after the write has committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Assets were created, updated, or deleted.
    AssetsChanged {
        owner_id: String,
        asset_ids: Vec<String>,
    },

    /// Snapshots were written or removed for the given dates.
    SnapshotsChanged {
        owner_id: String,
        asset_ids: Vec<String>,
        dates: Vec<NaiveDate>,
    },

    /// Cash-flow events were created, updated, or deleted.
    CashflowsChanged {
        owner_id: String,
        cashflow_ids: Vec<String>,
    },

    /// Exchange rates were upserted or removed.
    ExchangeRatesChanged { currencies: Vec<String> },

    /// The derived fund series of an owner was rebuilt.
    FundHistoryRecomputed {
        owner_id: String,
        row_count: usize,
        degraded_rate_count: usize,
    },

    /// Auto-invest plans were executed for a day.
    PlansExecuted {
        owner_id: String,
        plan_ids: Vec<String>,
        date: NaiveDate,
    },
}

impl DomainEvent {
    pub fn assets_changed(owner_id: impl Into<String>, asset_ids: Vec<String>) -> Self {
        Self::AssetsChanged {
            owner_id: owner_id.into(),
            asset_ids,
        }
    }

    pub fn snapshots_changed(
        owner_id: impl Into<String>,
        asset_ids: Vec<String>,
        dates: Vec<NaiveDate>,
    ) -> Self {
        Self::SnapshotsChanged {
            owner_id: owner_id.into(),
            asset_ids,
            dates,
        }
    }

    pub fn cashflows_changed(owner_id: impl Into<String>, cashflow_ids: Vec<String>) -> Self {
        Self::CashflowsChanged {
            owner_id: owner_id.into(),
            cashflow_ids,
        }
    }

    pub fn exchange_rates_changed(currencies: Vec<String>) -> Self {
        Self::ExchangeRatesChanged { currencies }
    }

    pub fn fund_history_recomputed(
        owner_id: impl Into<String>,
        row_count: usize,
        degraded_rate_count: usize,
    ) -> Self {
        Self::FundHistoryRecomputed {
            owner_id: owner_id.into(),
            row_count,
            degraded_rate_count,
        }
    }

    pub fn plans_executed(
        owner_id: impl Into<String>,
        plan_ids: Vec<String>,
        date: NaiveDate,
    ) -> Self {
        Self::PlansExecuted {
            owner_id: owner_id.into(),
            plan_ids,
            date,
        }
    }

    /// Owner the event belongs to, if it is owner-scoped.
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Self::AssetsChanged { owner_id, .. }
            | Self::SnapshotsChanged { owner_id, .. }
            | Self::CashflowsChanged { owner_id, .. }
            | Self::FundHistoryRecomputed { owner_id, .. }
            | Self::PlansExecuted { owner_id, .. } => Some(owner_id),
            Self::ExchangeRatesChanged { .. } => None,
        }
    }
}
