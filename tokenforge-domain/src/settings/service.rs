use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::errors::SettingsError;
use super::persistence::ClientStorage;
use super::types::UiSettings;
use crate::messages::{HostMessage, MessageChannel};

pub const UI_SETTINGS_KEY: &str = "uiSettings";

/// Reads and writes [`UiSettings`] through a [`ClientStorage`].
///
/// Storage failures never reach the caller: they are logged, reported to the
/// host as a notify message, and the defaults (or the unchanged record) win.
pub struct UiSettingsService {
    storage: Arc<dyn ClientStorage>,
    channel: Arc<dyn MessageChannel>,
}

impl UiSettingsService {
    pub fn new(storage: Arc<dyn ClientStorage>, channel: Arc<dyn MessageChannel>) -> Self {
        Self { storage, channel }
    }

    async fn stored_record(&self) -> Result<Map<String, Value>, SettingsError> {
        match self.storage.get(UI_SETTINGS_KEY).await? {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(record)) => Ok(record),
            Some(_) => Err(SettingsError::NotAnObject {
                key: UI_SETTINGS_KEY.to_string(),
            }),
        }
    }

    /// Current settings with defaults for missing fields. Also sends them to
    /// the host.
    pub async fn read(&self) -> UiSettings {
        let settings = match self.stored_record().await.and_then(|record| {
            serde_json::from_value::<UiSettings>(Value::Object(record)).map_err(|source| {
                SettingsError::DeserializationError {
                    key: UI_SETTINGS_KEY.to_string(),
                    source,
                }
            })
        }) {
            Ok(settings) => settings.clamped(),
            Err(e) => {
                warn!("Falling back to default UI settings: {}", e);
                self.channel.notify_error(&format!("Reading settings failed: {}", e));
                UiSettings::default()
            }
        };
        self.channel.send(HostMessage::UiSettings(settings.clone()));
        settings
    }

    /// Merges `patch` (a JSON object of changed fields) over the stored
    /// record. Returns the effective settings, or `None` if nothing was
    /// written.
    pub async fn write(&self, patch: Value) -> Option<UiSettings> {
        match self.try_write(patch).await {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Writing UI settings failed: {}", e);
                self.channel.notify_error(&format!("Saving settings failed: {}", e));
                None
            }
        }
    }

    pub async fn save(&self, settings: &UiSettings) -> Option<UiSettings> {
        match serde_json::to_value(settings) {
            Ok(patch) => self.write(patch).await,
            Err(source) => {
                let e = SettingsError::SerializationError {
                    key: UI_SETTINGS_KEY.to_string(),
                    source,
                };
                self.channel.notify_error(&format!("Saving settings failed: {}", e));
                None
            }
        }
    }

    async fn try_write(&self, patch: Value) -> Result<UiSettings, SettingsError> {
        let patch = match patch {
            Value::Object(patch) => patch,
            _ => {
                return Err(SettingsError::NotAnObject {
                    key: UI_SETTINGS_KEY.to_string(),
                })
            }
        };
        let mut record = self.stored_record().await.unwrap_or_else(|e| {
            debug!("Replacing unreadable settings record: {}", e);
            Map::new()
        });
        record.extend(patch);

        let record = Value::Object(record);
        let settings = serde_json::from_value::<UiSettings>(record.clone())
            .map_err(|source| SettingsError::DeserializationError {
                key: UI_SETTINGS_KEY.to_string(),
                source,
            })?
            .clamped();
        self.storage.set(UI_SETTINGS_KEY, record).await?;
        debug!("Stored UI settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{drain, NotifyLevel, QueuedMessageChannel};
    use crate::settings::persistence::{FileClientStorage, InMemoryClientStorage};
    use crate::settings::types::{UpdateMode, MIN_WIDTH};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::tempdir;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn service(storage: Arc<dyn ClientStorage>) -> (UiSettingsService, UnboundedReceiver<HostMessage>) {
        let (channel, receiver) = QueuedMessageChannel::unbounded();
        (UiSettingsService::new(storage, Arc::new(channel)), receiver)
    }

    #[tokio::test]
    async fn test_read_defaults_and_emits_settings() {
        let (service, mut receiver) = service(Arc::new(InMemoryClientStorage::new()));
        let settings = service.read().await;
        assert_eq!(settings, UiSettings::default());

        let messages = drain(&mut receiver);
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], HostMessage::UiSettings(s) if *s == UiSettings::default()));
    }

    #[tokio::test]
    async fn test_write_merges_patch_over_previous_record() {
        let storage = Arc::new(InMemoryClientStorage::new());
        storage
            .set(UI_SETTINGS_KEY, json!({"width": 800, "legacyFlag": true}))
            .await
            .unwrap();
        let (service, _receiver) = service(storage.clone());

        let settings = service
            .write(json!({"updateMode": "selection", "height": 100}))
            .await
            .unwrap();
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, 200);
        assert_eq!(settings.update_mode, UpdateMode::Selection);

        let stored = storage.get(UI_SETTINGS_KEY).await.unwrap().unwrap();
        assert_eq!(stored["legacyFlag"], json!(true));
        assert_eq!(stored["updateMode"], json!("selection"));
    }

    #[tokio::test]
    async fn test_read_clamps_small_window() {
        let storage = Arc::new(InMemoryClientStorage::new());
        storage.set(UI_SETTINGS_KEY, json!({"width": 10})).await.unwrap();
        let (service, _receiver) = service(storage);
        assert_eq!(service.read().await.width, MIN_WIDTH);
    }

    #[tokio::test]
    async fn test_unreadable_storage_notifies_instead_of_failing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("client-storage.json");
        std::fs::write(&path, "{broken").unwrap();
        let (service, mut receiver) = service(Arc::new(FileClientStorage::new(path)));

        assert_eq!(service.read().await, UiSettings::default());
        let messages = drain(&mut receiver);
        assert!(matches!(&messages[0], HostMessage::Notify { level: NotifyLevel::Error, .. }));
        assert!(matches!(&messages[1], HostMessage::UiSettings(_)));

        assert_eq!(service.write(json!({"width": 500})).await, None);
        assert!(matches!(
            drain(&mut receiver).as_slice(),
            [HostMessage::Notify { level: NotifyLevel::Error, .. }]
        ));
    }

    #[tokio::test]
    async fn test_save_round_trips_through_file() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileClientStorage::new(dir.path().join("client-storage.json")));
        let (service, _receiver) = service(storage);
        let wanted = UiSettings {
            inspect_deep: true,
            update_mode: UpdateMode::Document,
            ..UiSettings::default()
        };
        assert_eq!(service.save(&wanted).await, Some(wanted.clone()));
        assert_eq!(service.read().await, wanted);
    }
}
