//! JSONBin (v3 API) storage backend.
//!
//! Reads `GET {base}/b/{id}/latest`, writes `PUT {base}/b/{id}` and
//! provisions new bins with `POST {base}/b`. Responses wrap the stored
//! document in a `record` field.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokenforge_core::config::RemoteConfig;
use tracing::{debug, error, info};

use super::document::NormalizedDocument;
use super::errors::StorageError;
use super::provider::{StorageProvider, StorageProviderType};

const MASTER_KEY_HEADER: &str = "X-Master-Key";
const BIN_NAME_HEADER: &str = "X-Bin-Name";
const BIN_PRIVATE_HEADER: &str = "X-Bin-Private";

#[derive(Debug, Deserialize)]
struct BinEnvelope {
    #[serde(default)]
    record: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CreatedBin {
    metadata: CreatedBinMetadata,
}

#[derive(Debug, Deserialize)]
struct CreatedBinMetadata {
    id: String,
}

#[derive(Clone, Debug)]
pub struct JsonBinStorage {
    client: Client,
    base_url: String,
    id: String,
    secret: String,
    plugin_version: String,
}

impl JsonBinStorage {
    pub fn new(config: &RemoteConfig, id: &str, secret: &str) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.jsonbin_base_url.trim_end_matches('/').to_string(),
            id: id.trim().to_string(),
            secret: secret.to_string(),
            plugin_version: config.plugin_version.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Public page of a bin, shown as the project URL.
    pub fn project_url(id: &str) -> String {
        format!("https://jsonbin.io/{}", id)
    }

    fn bin_url(&self) -> Result<String, StorageError> {
        if self.id.is_empty() {
            return Err(StorageError::MissingCredentials("JSONBin id is not set".to_string()));
        }
        Ok(format!("{}/b/{}", self.base_url, self.id))
    }

    fn resource(&self) -> String {
        format!("JSONBin {}", self.id)
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, StorageError> {
        let response = request.send().await.map_err(|e| {
            error!("JSONBin request for {} failed: {}", resource, e);
            StorageError::from(e)
        })?;
        let status = response.status();
        if !status.is_success() {
            error!("JSONBin responded with {} for {}", status, resource);
            return Err(StorageError::from_status(status, resource));
        }
        Ok(response)
    }
}

#[async_trait]
impl StorageProvider for JsonBinStorage {
    fn provider_type(&self) -> StorageProviderType {
        StorageProviderType::JsonBin
    }

    async fn retrieve(&self) -> Result<Option<NormalizedDocument>, StorageError> {
        let url = format!("{}/latest", self.bin_url()?);
        debug!("Retrieving tokens from {}", url);
        let resource = self.resource();
        let response = self
            .send(self.client.get(&url).header(MASTER_KEY_HEADER, &self.secret), &resource)
            .await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedRemote(e.to_string()))?;
        let record = match serde_json::from_value::<BinEnvelope>(body.clone()) {
            Ok(BinEnvelope { record: Some(record) }) => record,
            _ => body,
        };
        match record {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            record => NormalizedDocument::from_json(record)
                .map(Some)
                .map_err(StorageError::MalformedRemote),
        }
    }

    async fn save(&self, document: &NormalizedDocument) -> Result<(), StorageError> {
        let url = self.bin_url()?;
        let resource = self.resource();
        self.send(
            self.client
                .put(&url)
                .header(MASTER_KEY_HEADER, &self.secret)
                .json(document),
            &resource,
        )
        .await?;
        info!("Saved {} token sets to {}", document.tokens.len(), resource);
        Ok(())
    }

    async fn create(&self, name: &str, updated_at: DateTime<Utc>, secret: &str) -> Result<Option<String>, StorageError> {
        if secret.trim().is_empty() {
            return Err(StorageError::MissingCredentials("JSONBin requires a secret".to_string()));
        }
        let url = format!("{}/b", self.base_url);
        let body = json!({
            "tokens": {},
            "themes": [],
            "metadata": {
                "updatedAt": updated_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "version": self.plugin_version,
            }
        });
        let response = self
            .send(
                self.client
                    .post(&url)
                    .header(MASTER_KEY_HEADER, secret)
                    .header(BIN_NAME_HEADER, name)
                    .header(BIN_PRIVATE_HEADER, "true")
                    .json(&body),
                "new JSONBin",
            )
            .await?;

        let created: CreatedBin = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedRemote(format!("create response: {}", e)))?;
        info!("Created JSONBin '{}' with id {}", name, created.metadata.id);
        Ok(Some(created.metadata.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenSetStatus;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> RemoteConfig {
        RemoteConfig {
            jsonbin_base_url: server.uri(),
            request_timeout_secs: 5,
            plugin_version: "test".to_string(),
        }
    }

    fn sample_document() -> NormalizedDocument {
        NormalizedDocument::from_json(json!({
            "tokens": {"global": {"sizing.xs": {"type": "sizing", "value": 4}}},
            "themes": [{"id": "light", "name": "Light", "selectedTokenSets": {"global": "enabled"}}],
            "metadata": {"updatedAt": "2024-03-01T10:00:00Z", "version": "test"}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_unwraps_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/abc/latest"))
            .and(header("X-Master-Key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "record": serde_json::to_value(sample_document()).unwrap(),
                "metadata": {"id": "abc", "private": true}
            })))
            .mount(&server)
            .await;

        let storage = JsonBinStorage::new(&config_for(&server), "abc", "secret").unwrap();
        let doc = storage.retrieve().await.unwrap().unwrap();
        assert_eq!(doc, sample_document());
        assert_eq!(doc.themes[0].status_of("global"), TokenSetStatus::Enabled);
    }

    #[tokio::test]
    async fn test_save_then_retrieve_round_trip() {
        let server = MockServer::start().await;
        let document = sample_document();
        Mock::given(method("PUT"))
            .and(path("/b/abc"))
            .and(body_partial_json(json!({"metadata": {"version": "test"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {}})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/abc/latest"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"record": serde_json::to_value(&document).unwrap()})),
            )
            .mount(&server)
            .await;

        let storage = JsonBinStorage::new(&config_for(&server), "abc", "secret").unwrap();
        storage.save(&document).await.unwrap();
        assert_eq!(storage.retrieve().await.unwrap(), Some(document));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/missing/latest"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/locked/latest"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/garbage/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {"tokens": "nope"}})))
            .mount(&server)
            .await;

        let config = config_for(&server);
        let missing = JsonBinStorage::new(&config, "missing", "secret").unwrap();
        assert!(matches!(missing.retrieve().await, Err(StorageError::NotFound { .. })));
        let locked = JsonBinStorage::new(&config, "locked", "secret").unwrap();
        assert_eq!(locked.retrieve().await, Err(StorageError::Auth { status: 401 }));
        let garbage = JsonBinStorage::new(&config, "garbage", "secret").unwrap();
        assert!(matches!(garbage.retrieve().await, Err(StorageError::MalformedRemote(_))));
    }

    #[tokio::test]
    async fn test_empty_record_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/fresh/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {}})))
            .mount(&server)
            .await;

        let storage = JsonBinStorage::new(&config_for(&server), "fresh", "secret").unwrap();
        assert_eq!(storage.retrieve().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_sends_bin_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/b"))
            .and(header("X-Master-Key", "secret"))
            .and(header("X-Bin-Name", "Design system"))
            .and(header("X-Bin-Private", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "record": {},
                "metadata": {"id": "new-bin", "private": true}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = JsonBinStorage::new(&config_for(&server), "", "secret").unwrap();
        let id = storage.create("Design system", Utc::now(), "secret").await.unwrap();
        assert_eq!(id.as_deref(), Some("new-bin"));
    }

    #[tokio::test]
    async fn test_missing_id_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        let storage = JsonBinStorage::new(&config_for(&server), "", "secret").unwrap();
        assert!(matches!(storage.retrieve().await, Err(StorageError::MissingCredentials(_))));
    }
}
