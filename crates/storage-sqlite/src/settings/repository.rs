use async_trait::async_trait;
use diesel::prelude::*;
use log::warn;
use std::sync::Arc;

use super::model::AppSettingDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_settings::dsl::*;
use navfolio_core::constants::setting_keys;
use navfolio_core::errors::{DatabaseError, Result};
use navfolio_core::settings::{Settings, SettingsRepositoryTrait, SettingsUpdate};

pub struct SettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SettingsRepository { pool, writer }
    }
}

fn upsert(conn: &mut SqliteConnection, key: &str, value: String) -> Result<()> {
    diesel::replace_into(app_settings)
        .values(&AppSettingDB {
            setting_key: key.to_string(),
            setting_value: value,
        })
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_settings(&self) -> Result<Settings> {
        let mut conn = get_connection(&self.pool)?;
        let all_settings: Vec<(String, String)> = app_settings
            .select((setting_key, setting_value))
            .load::<(String, String)>(&mut conn)
            .map_err(StorageError::from)?;

        let mut settings = Settings::default();

        for (key, value) in all_settings {
            match key.as_str() {
                setting_keys::BASE_CURRENCY => settings.base_currency = value,
                setting_keys::QUOTE_TIMEOUT_SECS => match value.parse() {
                    Ok(secs) => settings.quote_timeout_secs = secs,
                    Err(_) => warn!("Ignoring malformed quote timeout setting '{}'", value),
                },
                _ => {} // Ignore unknown settings
            }
        }

        Ok(settings)
    }

    async fn update_settings(&self, new_settings: &SettingsUpdate) -> Result<()> {
        let settings = new_settings.clone();
        self.writer
            .exec(move |conn| {
                if let Some(base_currency) = settings.base_currency {
                    upsert(conn, setting_keys::BASE_CURRENCY, base_currency)?;
                }
                if let Some(timeout) = settings.quote_timeout_secs {
                    upsert(conn, setting_keys::QUOTE_TIMEOUT_SECS, timeout.to_string())?;
                }
                Ok(())
            })
            .await
    }

    fn get_setting(&self, setting_key_param: &str) -> Result<String> {
        let mut conn = get_connection(&self.pool)?;
        let value = app_settings
            .filter(setting_key.eq(setting_key_param))
            .select(setting_value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;

        value.ok_or_else(|| {
            DatabaseError::NotFound(format!("Setting '{}' not found", setting_key_param)).into()
        })
    }

    async fn update_setting(&self, setting_key_param: &str, setting_value_param: &str) -> Result<()> {
        let key = setting_key_param.to_string();
        let value = setting_value_param.to_string();
        self.writer.exec(move |conn| upsert(conn, &key, value)).await
    }
}
