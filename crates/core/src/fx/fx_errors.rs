use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrencyCode(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Exchange rate not found: {0}")]
    RateNotFound(String),
}
