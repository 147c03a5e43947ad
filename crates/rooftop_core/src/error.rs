use std::error::Error;

/// Failure while turning a raw CMS entry into a content item.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("required field `{path}` is missing")]
    MissingField { path: String },
    #[error("field `{path}` has an unexpected shape (expected {expected})")]
    UnexpectedShape { path: String, expected: &'static str },
    #[error("relationship fields nest deeper than {limit} levels")]
    DepthExceeded { limit: usize },
    #[error("custom transform failed: {0}")]
    Custom(#[source] Box<dyn Error + Send + Sync>),
}

impl TransformError {
    pub(crate) fn missing(path: impl Into<String>) -> Self {
        Self::MissingField { path: path.into() }
    }

    pub(crate) fn shape(path: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedShape {
            path: path.into(),
            expected,
        }
    }

    /// Wraps an arbitrary error raised by a caller-supplied transform or hook.
    pub fn custom(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }
}
