//! Quote refresh.
//!
//! Live prices come from an external provider behind [`QuoteProviderTrait`];
//! this module bounds every lookup with a timeout and turns fresh unit prices
//! into snapshots of the day.

pub mod errors;
mod quote_refresh_service;
mod quote_traits;


pub use errors::QuoteError;
pub use quote_refresh_service::{
    FailedRefresh, QuoteRefreshReport, QuoteRefreshService, RefreshedAsset,
};
pub use quote_traits::{fetch_unit_price, QuoteProviderTrait, QuoteRefreshServiceTrait};
