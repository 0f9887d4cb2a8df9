//! Read-only storage backed by a static JSON endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokenforge_core::config::RemoteConfig;
use tracing::{debug, error, warn};

use super::document::{DocumentFile, NormalizedDocument};
use super::errors::StorageError;
use super::provider::{StorageProvider, StorageProviderType};

#[derive(Clone, Debug)]
pub struct UrlStorage {
    client: Client,
    url: String,
    headers: HeaderMap,
}

/// The secret is either a JSON object of request headers or a bearer token.
fn parse_secret_headers(secret: &str) -> Result<HeaderMap, StorageError> {
    let mut headers = HeaderMap::new();
    let secret = secret.trim();
    if secret.is_empty() {
        return Ok(headers);
    }
    let invalid = |e: &dyn std::fmt::Display| StorageError::MissingCredentials(format!("invalid header in secret: {}", e));

    match serde_json::from_str::<Value>(secret) {
        Ok(Value::Object(map)) => {
            for (name, value) in map {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(&e))?;
                let value = HeaderValue::from_str(&value).map_err(|e| invalid(&e))?;
                headers.insert(name, value);
            }
        }
        _ => {
            let value = HeaderValue::from_str(&format!("Bearer {}", secret)).map_err(|e| invalid(&e))?;
            headers.insert(AUTHORIZATION, value);
        }
    }
    Ok(headers)
}

impl UrlStorage {
    pub fn new(config: &RemoteConfig, url: &str, secret: &str) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.trim().to_string(),
            headers: parse_secret_headers(secret)?,
        })
    }

    async fn fetch(&self) -> Result<Value, StorageError> {
        debug!("Fetching tokens from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", self.url, e);
                StorageError::from(e)
            })?;
        let status = response.status();
        if !status.is_success() {
            error!("{} responded with {}", self.url, status);
            return Err(StorageError::from_status(status, &self.url));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| StorageError::MalformedRemote(e.to_string()))
    }

    /// The remote document as a file list: `$themes.json` followed by one
    /// `<set>.json` per token set. Unreadable content yields an empty list.
    pub async fn read(&self) -> Result<Vec<DocumentFile>, StorageError> {
        match self.retrieve().await {
            Ok(Some(document)) => Ok(document.files()),
            Ok(None) => Ok(Vec::new()),
            Err(StorageError::MalformedRemote(reason)) => {
                warn!("Ignoring unreadable content at {}: {}", self.url, reason);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StorageProvider for UrlStorage {
    fn provider_type(&self) -> StorageProviderType {
        StorageProviderType::Url
    }

    fn is_read_only(&self) -> bool {
        true
    }

    async fn retrieve(&self) -> Result<Option<NormalizedDocument>, StorageError> {
        match self.fetch().await? {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            payload => NormalizedDocument::from_json(payload)
                .map(Some)
                .map_err(StorageError::MalformedRemote),
        }
    }

    async fn save(&self, _document: &NormalizedDocument) -> Result<(), StorageError> {
        Err(StorageError::Unsupported {
            provider: StorageProviderType::Url,
            operation: "save",
        })
    }
}
