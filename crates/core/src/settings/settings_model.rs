use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_CURRENCY, DEFAULT_QUOTE_TIMEOUT_SECS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Currency every fund series is expressed in.
    pub base_currency: String,
    /// Upper bound on a single quote lookup.
    pub quote_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub base_currency: Option<String>,
    pub quote_timeout_secs: Option<u64>,
}
