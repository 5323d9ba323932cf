//! Google Cloud adapters: Vision OCR and Cloud Storage.
//!
//! Both talk to the public REST endpoints with `reqwest`. Vision accepts
//! either an API key or an OAuth access token; Cloud Storage requires an
//! access token for anything but public buckets.

mod storage;
mod vision;

pub use storage::GcsObjectStore;
pub use vision::GoogleVisionClient;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{StoreError, StoreResult};

/// Credentials attached to every Google API request.
pub enum GcpAuth {
    /// `?key=` query parameter.
    ApiKey(SecretString),
    /// `Authorization: Bearer` header.
    AccessToken(SecretString),
    /// No credentials (emulators, public buckets).
    Anonymous,
}

impl GcpAuth {
    /// Read credentials from `GOOGLE_ACCESS_TOKEN`, then `GOOGLE_API_KEY`.
    pub fn from_env() -> Self {
        if let Ok(token) = std::env::var("GOOGLE_ACCESS_TOKEN") {
            return GcpAuth::AccessToken(SecretString::new(token));
        }
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            return GcpAuth::ApiKey(SecretString::new(key));
        }
        GcpAuth::Anonymous
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            GcpAuth::ApiKey(key) => request.query(&[("key", key.expose_secret().as_str())]),
            GcpAuth::AccessToken(token) => request.bearer_auth(token.expose_secret()),
            GcpAuth::Anonymous => request,
        }
    }
}

impl std::fmt::Debug for GcpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            GcpAuth::ApiKey(_) => "ApiKey(..)",
            GcpAuth::AccessToken(_) => "AccessToken(..)",
            GcpAuth::Anonymous => "Anonymous",
        };
        f.write_str(kind)
    }
}

/// Split `gs://bucket/object/path` into `("bucket", "object/path")`.
pub fn parse_gs_uri(uri: &str) -> StoreResult<(&str, &str)> {
    let rest = uri
        .strip_prefix("gs://")
        .ok_or_else(|| StoreError::InvalidLocator(uri.to_string()))?;
    match rest.split_once('/') {
        Some((bucket, object)) if !bucket.is_empty() => Ok((bucket, object)),
        None if !rest.is_empty() => Ok((rest, "")),
        _ => Err(StoreError::InvalidLocator(uri.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gs_uri() {
        assert_eq!(
            parse_gs_uri("gs://uploads/raw_documents/a.pdf").unwrap(),
            ("uploads", "raw_documents/a.pdf")
        );
        assert_eq!(parse_gs_uri("gs://uploads").unwrap(), ("uploads", ""));
        assert!(parse_gs_uri("gs:///x").is_err());
        assert!(parse_gs_uri("s3://bucket/x").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let auth = GcpAuth::ApiKey(SecretString::new("hunter2".to_string()));
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
