//! Cloud Storage object store over the JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{parse_gs_uri, GcpAuth};
use crate::error::{StoreError, StoreResult};
use crate::store::ObjectStore;

const STORAGE_API_URL: &str = "https://storage.googleapis.com";

/// [`ObjectStore`] over Google Cloud Storage.
///
/// Accepts `gs://bucket/object` locators. Bare locators resolve against
/// the default bucket, and listings come back in the same form as the
/// prefix they were asked for.
pub struct GcsObjectStore {
    client: Client,
    auth: GcpAuth,
    base_url: Url,
    default_bucket: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectMeta>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
}

impl GcsObjectStore {
    pub fn new(auth: GcpAuth) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = Url::parse(STORAGE_API_URL)
            .map_err(|e| StoreError::Backend(format!("Invalid storage URL: {}", e)))?;

        Ok(Self {
            client,
            auth,
            base_url,
            default_bucket: None,
        })
    }

    /// Bucket used for locators without a `gs://` scheme.
    pub fn with_default_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.default_bucket = Some(bucket.into());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> StoreResult<Self> {
        self.base_url = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidLocator(format!("{}: {}", base_url, e)))?;
        Ok(self)
    }

    fn split<'a>(&'a self, locator: &'a str) -> StoreResult<(&'a str, &'a str)> {
        if locator.starts_with("gs://") {
            return parse_gs_uri(locator);
        }
        match &self.default_bucket {
            Some(bucket) if !locator.is_empty() => Ok((bucket.as_str(), locator)),
            _ => Err(StoreError::InvalidLocator(locator.to_string())),
        }
    }

    /// `{base}/storage/v1/b/{bucket}/o[/{object}]`, each segment percent-encoded.
    fn object_url(&self, bucket: &str, object: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| StoreError::Backend("storage base URL cannot be a base".into()))?;
            segments.pop_if_empty().extend(["storage", "v1", "b", bucket, "o"]);
            if let Some(object) = object {
                segments.push(object);
            }
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> StoreResult<reqwest::Response> {
        self.auth
            .apply(request)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("Storage request failed: {}", e)))
    }

    async fn backend_error(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StoreError::Backend(format!("Storage API error ({}): {}", status, body))
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn exists(&self, locator: &str) -> StoreResult<bool> {
        let (bucket, object) = self.split(locator)?;
        let url = self.object_url(bucket, Some(object))?;
        let response = self.send(self.client.get(url)).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::backend_error(response).await),
        }
    }

    async fn read(&self, locator: &str) -> StoreResult<Vec<u8>> {
        let (bucket, object) = self.split(locator)?;
        let mut url = self.object_url(bucket, Some(object))?;
        url.query_pairs_mut().append_pair("alt", "media");
        let response = self.send(self.client.get(url)).await?;

        match response.status() {
            status if status.is_success() => response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| StoreError::Backend(format!("Failed to read object: {}", e))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(locator.to_string())),
            _ => Err(Self::backend_error(response).await),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let (bucket, object_prefix) = self.split(prefix)?;
        let scheme_prefix = if prefix.starts_with("gs://") {
            format!("gs://{}/", bucket)
        } else {
            String::new()
        };

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.object_url(bucket, None)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("prefix", object_prefix);
                query.append_pair("fields", "items(name),nextPageToken");
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.client.get(url)).await?;
            if !response.status().is_success() {
                return Err(Self::backend_error(response).await);
            }
            let page: ObjectList = response
                .json()
                .await
                .map_err(|e| StoreError::Backend(format!("Failed to parse listing: {}", e)))?;

            names.extend(
                page.items
                    .into_iter()
                    .map(|item| format!("{}{}", scheme_prefix, item.name)),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        names.sort();
        Ok(names)
    }

    async fn put(
        &self,
        locator: &str,
        content: &[u8],
        content_type: Option<&str>,
    ) -> StoreResult<()> {
        let (bucket, object) = self.split(locator)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Backend("storage base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["upload", "storage", "v1", "b", bucket, "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", object);

        let request = self
            .client
            .post(url)
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(content.to_vec());
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(Self::backend_error(response).await);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "gcs"
    }
}
