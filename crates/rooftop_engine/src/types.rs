use std::fmt;
use std::io;
use std::path::PathBuf;

use rooftop_core::TransformError;

use crate::config::ConfigurationError;
use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    MalformedPayload,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::MalformedPayload => write!(f, "malformed payload"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {path:?}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template `{name}`: {message}")]
    Template { name: String, message: String },
    #[error("invalid output path {path:?}: {reason}")]
    InvalidOutputPath { path: String, reason: &'static str },
    #[error("no fetched content for `{content_type}`")]
    MissingContent { content_type: String },
    #[error("content for `{content_type}` is not a list of items")]
    UnexpectedData { content_type: String },
}

/// Everything that can abort a build pass.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("failed to build content API client: {0}")]
    Client(#[source] FetchError),
    #[error("failed to fetch `{content_type}`: {source}")]
    Fetch {
        content_type: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to transform an item of `{content_type}`: {source}")]
    Transform {
        content_type: String,
        #[source]
        source: TransformError,
    },
    #[error("post-transform hook failed: {0}")]
    PostTransform(#[source] TransformError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to serialize content: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write asset: {0}")]
    Persist(#[from] PersistError),
    #[error("no content has been published to the shared context yet")]
    NotRun,
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
}
