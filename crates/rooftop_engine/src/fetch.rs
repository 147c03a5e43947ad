use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use rooftop_logging::{rooftop_debug, rooftop_trace};
use serde_json::{Map, Value};
use url::Url;

use crate::{FailureKind, FetchError};

/// Header carrying the CMS API token.
pub const API_TOKEN_HEADER: &str = "Api-Token";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec!["application/json".to_string()],
        }
    }
}

/// The one capability the pipeline needs from a content API.
#[async_trait::async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetches every raw entry of `content_type`, forwarding `request_options`
    /// as filter parameters.
    async fn get(
        &self,
        content_type: &str,
        request_options: &Map<String, Value>,
    ) -> Result<Vec<Value>, FetchError>;
}

/// Rooftop REST client: `GET {base}/{content_type}?{request_options}`.
#[derive(Debug, Clone)]
pub struct ReqwestContentClient {
    base: Url,
    api_token: String,
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestContentClient {
    pub fn new(
        base: Url,
        api_token: impl Into<String>,
        settings: FetchSettings,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            base: with_trailing_slash(base),
            api_token: api_token.into(),
            settings,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn resource_url(
        &self,
        content_type: &str,
        request_options: &Map<String, Value>,
    ) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(content_type)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let pairs = query_pairs(request_options);
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait::async_trait]
impl ContentClient for ReqwestContentClient {
    async fn get(
        &self,
        content_type: &str,
        request_options: &Map<String, Value>,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.resource_url(content_type, request_options)?;
        rooftop_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(API_TOKEN_HEADER, &self.api_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        if let Some(ct) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        rooftop_trace!("{} returned {} bytes", content_type, bytes.len());

        parse_items(&bytes)
    }
}

fn parse_items(bytes: &[u8]) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_slice(bytes) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(FetchError::new(
            FailureKind::MalformedPayload,
            "expected a JSON array of entries",
        )),
        Err(err) => Err(FetchError::new(FailureKind::MalformedPayload, err.to_string())),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Flattens request options into WordPress-style query pairs:
/// arrays become `key[]`, objects become `key[sub]`, nulls are dropped.
fn query_pairs(options: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in options {
        push_pairs(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Bool(_) | Value::Number(_) => pairs.push((key, value.to_string())),
        Value::Array(items) => {
            for item in items {
                push_pairs(pairs, format!("{key}[]"), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, format!("{key}[{sub}]"), item);
            }
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
