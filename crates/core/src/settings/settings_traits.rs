//! Repository traits for settings.

use async_trait::async_trait;

use super::settings_model::{Settings, SettingsUpdate};
use crate::errors::Result;

#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// All settings, with defaults for keys that were never stored.
    fn get_settings(&self) -> Result<Settings>;

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()>;

    /// A single stored value; `DatabaseError::NotFound` when absent.
    fn get_setting(&self, setting_key: &str) -> Result<String>;

    async fn update_setting(&self, setting_key: &str, setting_value: &str) -> Result<()>;
}
