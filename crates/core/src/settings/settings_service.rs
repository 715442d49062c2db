use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::settings_model::{Settings, SettingsUpdate};
use super::SettingsRepositoryTrait;
use crate::constants::{setting_keys, DEFAULT_BASE_CURRENCY, DEFAULT_QUOTE_TIMEOUT_SECS};
use crate::errors::{DatabaseError, Error, Result};
use crate::fx::{is_valid_currency_code, normalize_currency_code};

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<Settings>;

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()>;

    /// Stored base currency, or the default when none was stored.
    fn get_base_currency(&self) -> Result<String>;

    fn get_quote_timeout(&self) -> Result<Duration>;

    fn get_setting_value(&self, key: &str) -> Result<Option<String>>;

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()>;
}

/// Changing the base currency does not convert stored rates or rebuild any
/// fund series; the next recompute of each owner uses the new currency.
pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(settings_repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        SettingsService {
            settings_repository,
        }
    }
}

fn validate_update(update: &SettingsUpdate) -> Result<SettingsUpdate> {
    let base_currency = match &update.base_currency {
        Some(code) if !is_valid_currency_code(code) => {
            return Err(Error::InvalidConfigValue(format!(
                "base currency '{}' is not a three-letter code",
                code
            )))
        }
        Some(code) => Some(normalize_currency_code(code)),
        None => None,
    };
    if update.quote_timeout_secs == Some(0) {
        return Err(Error::InvalidConfigValue(
            "quote timeout must be at least one second".to_string(),
        ));
    }
    Ok(SettingsUpdate {
        base_currency,
        quote_timeout_secs: update.quote_timeout_secs,
    })
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<Settings> {
        self.settings_repository.get_settings()
    }

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()> {
        let validated = validate_update(new_settings)?;
        debug!("Updating settings: {:?}", validated);
        self.settings_repository.update_settings(&validated).await
    }

    fn get_base_currency(&self) -> Result<String> {
        match self.get_setting_value(setting_keys::BASE_CURRENCY)? {
            Some(code) if is_valid_currency_code(&code) => Ok(normalize_currency_code(&code)),
            Some(code) => {
                warn!(
                    "Stored base currency '{}' is invalid; using {}",
                    code, DEFAULT_BASE_CURRENCY
                );
                Ok(DEFAULT_BASE_CURRENCY.to_string())
            }
            None => Ok(DEFAULT_BASE_CURRENCY.to_string()),
        }
    }

    fn get_quote_timeout(&self) -> Result<Duration> {
        let secs = match self.get_setting_value(setting_keys::QUOTE_TIMEOUT_SECS)? {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_QUOTE_TIMEOUT_SECS),
            None => DEFAULT_QUOTE_TIMEOUT_SECS,
        };
        Ok(Duration::from_secs(secs))
    }

    fn get_setting_value(&self, key: &str) -> Result<Option<String>> {
        match self.settings_repository.get_setting(key) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Database(DatabaseError::NotFound(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_setting_value(&self, key: &str, value: &str) -> Result<()> {
        self.settings_repository.update_setting(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>) -> SettingsService {
        SettingsService::new(store.clone())
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        assert_eq!(service.get_base_currency().unwrap(), "CNY");
        assert_eq!(service.get_quote_timeout().unwrap(), Duration::from_secs(8));
        assert_eq!(service.get_settings().unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_update_normalizes_and_persists() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        service
            .update_settings(&SettingsUpdate {
                base_currency: Some(" usd".to_string()),
                quote_timeout_secs: Some(3),
            })
            .await
            .unwrap();
        assert_eq!(service.get_base_currency().unwrap(), "USD");
        assert_eq!(service.get_quote_timeout().unwrap(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_rejects_invalid_values() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        assert!(service
            .update_settings(&SettingsUpdate {
                base_currency: Some("dollars".to_string()),
                quote_timeout_secs: None,
            })
            .await
            .is_err());
        assert!(service
            .update_settings(&SettingsUpdate {
                base_currency: None,
                quote_timeout_secs: Some(0),
            })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unparseable_timeout_falls_back() {
        let store = Arc::new(InMemoryStore::default());
        let service = service(&store);
        service
            .set_setting_value(setting_keys::QUOTE_TIMEOUT_SECS, "soon")
            .await
            .unwrap();
        assert_eq!(service.get_quote_timeout().unwrap(), Duration::from_secs(8));
    }
}
