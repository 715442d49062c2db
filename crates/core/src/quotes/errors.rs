//! Quote-related error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Quote for {code} timed out after {timeout_secs}s")]
    Timeout { code: String, timeout_secs: u64 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("No price available for {0}")]
    NotAvailable(String),
}
