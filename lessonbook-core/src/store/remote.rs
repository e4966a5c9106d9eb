//! Optional remote mirror for the lessonbook collections.
//!
//! The remote store is feature-detected from configuration: without a
//! base URL every caller simply skips it. Reads treat a 404 as
//! absence; writes are plain JSON upserts. The store is never the
//! source of truth for writes, so callers mirror best-effort and log
//! failures instead of propagating them.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Activity, LessonPlan, TagStatements};
use crate::registry::LessonRegistry;

/// Remote connection settings, usually deserialized from the app
/// config. Presence of `base_url` switches the remote store on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}

/// Errors from remote store requests.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(StatusCode),
}

/// HTTP client for the remote collections.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteStore {
    /// Builds a store when the config carries a base URL.
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        let base_url = config.base_url.clone()?;
        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        builder
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, RemoteError> {
        let response = self.request(Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(Some(response.json().await?))
    }

    async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(), RemoteError> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), RemoteError> {
        let response = self.request(Method::DELETE, path).send().await?;
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(RemoteError::Status(response.status()));
        }
        Ok(())
    }

    /// Fetches the class bundle; `None` when the class is unknown
    /// remotely.
    pub async fn fetch_lessons(&self, class: &str) -> Result<Option<LessonRegistry>, RemoteError> {
        self.get_json(&format!("/classes/{}/lessons", class)).await
    }

    /// Upserts the class bundle, keyed by class name.
    pub async fn put_lessons(
        &self,
        class: &str,
        bundle: &LessonRegistry,
    ) -> Result<(), RemoteError> {
        self.put_json(&format!("/classes/{}/lessons", class), bundle)
            .await
    }

    /// Fetches the global activity catalogue.
    pub async fn fetch_activities(&self) -> Result<Vec<Activity>, RemoteError> {
        Ok(self.get_json("/activities").await?.unwrap_or_default())
    }

    /// Batch upsert keyed by (name, category, lesson_number).
    pub async fn upsert_activities(&self, activities: &[Activity]) -> Result<(), RemoteError> {
        self.put_json("/activities", activities).await
    }

    pub async fn delete_activity(&self, id: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/activities/{}", id)).await
    }

    /// Fetches all lesson plans.
    pub async fn fetch_plans(&self) -> Result<Option<Vec<LessonPlan>>, RemoteError> {
        self.get_json("/plans").await
    }

    /// Batch upsert keyed by plan id.
    pub async fn upsert_plans(&self, plans: &[LessonPlan]) -> Result<(), RemoteError> {
        self.put_json("/plans", plans).await
    }

    pub async fn delete_plan(&self, id: &str) -> Result<(), RemoteError> {
        self.delete(&format!("/plans/{}", id)).await
    }

    /// Fetches the tag statements for a class.
    pub async fn fetch_tags(&self, class: &str) -> Result<Option<TagStatements>, RemoteError> {
        self.get_json(&format!("/classes/{}/tags", class)).await
    }

    /// Upserts the tag statements, keyed by class name.
    pub async fn put_tags(&self, class: &str, tags: &TagStatements) -> Result<(), RemoteError> {
        self.put_json(&format!("/classes/{}/tags", class), tags)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_config_yields_no_store() {
        let config = RemoteConfig::default();
        assert!(!config.is_configured());
        assert!(RemoteStore::from_config(&config).is_none());
    }

    #[test]
    fn test_base_url_is_normalized() {
        let config = RemoteConfig {
            base_url: Some("https://store.example.com/".to_string()),
            api_key: Some("key".to_string()),
        };
        let store = RemoteStore::from_config(&config).unwrap();
        assert_eq!(store.base_url, "https://store.example.com");
    }

    #[tokio::test]
    async fn test_unreachable_store_reports_error() {
        // Nothing listens on the discard port; the request must fail,
        // not hang (connection refused is immediate on loopback).
        let config = RemoteConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            api_key: None,
        };
        let store = RemoteStore::from_config(&config).unwrap();
        let result = store.fetch_lessons("LKG").await;
        assert!(result.is_err());
    }
}
