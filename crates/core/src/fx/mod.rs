//! FX module - exchange-rate models, the per-day rate table, and the
//! normalizer that converts asset valuations into the base currency.

pub mod currency;
mod currency_normalizer;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;
mod rate_table;


pub use currency::{is_valid_currency_code, normalize_currency_code};
pub use currency_normalizer::{
    normalize_valuations, DegradedRate, NormalizationResult, NormalizedValuation,
};
pub use fx_errors::FxError;
pub use fx_model::{ExchangeRate, NewExchangeRate};
pub use fx_service::FxService;
pub use fx_traits::{FxRepositoryTrait, FxServiceTrait};
pub use rate_table::{RateLookup, RateTable};
