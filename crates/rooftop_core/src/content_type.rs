use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{normalize, TransformError};

/// Option keys that describe the content type itself and are never forwarded
/// to the content API.
pub const RESERVED_OPTION_KEYS: &[&str] = &["name", "transform", "template"];

pub type CustomTransform = Arc<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;
pub type OutputFn = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Per-item transform applied right after fetching.
#[derive(Clone, Default)]
pub enum Transform {
    /// Flatten with [`normalize`].
    #[default]
    Normalize,
    /// Keep the raw entry untouched.
    Identity,
    Custom(CustomTransform),
}

impl Transform {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn apply(&self, raw: Value) -> Result<Value, TransformError> {
        match self {
            Self::Normalize => normalize(raw),
            Self::Identity => Ok(raw),
            Self::Custom(f) => f(raw),
        }
    }
}

impl From<bool> for Transform {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Normalize
        } else {
            Self::Identity
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize => write!(f, "Normalize"),
            Self::Identity => write!(f, "Identity"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Where a rendered item lands, relative to the build output.
#[derive(Clone)]
pub enum OutputPath {
    /// Template string rendered with `{ item }`, e.g. `posts/{{ item.slug }}.html`.
    Pattern(String),
    Custom(OutputFn),
}

impl OutputPath {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSpec {
    /// Template file, relative to the project root.
    pub path: PathBuf,
    pub output: OutputPath,
}

impl TemplateSpec {
    pub fn new(path: impl Into<PathBuf>, output: OutputPath) -> Self {
        Self {
            path: path.into(),
            output,
        }
    }
}

/// One configured content source. Immutable once the plugin is built.
#[derive(Debug, Clone)]
pub struct ContentTypeSpec {
    pub name: String,
    pub request_options: Map<String, Value>,
    pub transform: Transform,
    pub template: Option<TemplateSpec>,
}

impl ContentTypeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_options: Map::new(),
            transform: Transform::default(),
            template: None,
        }
    }

    pub fn with_request_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request_options.insert(key.into(), value.into());
        self
    }

    pub fn with_transform(mut self, transform: impl Into<Transform>) -> Self {
        self.transform = transform.into();
        self
    }

    pub fn with_template(mut self, template: TemplateSpec) -> Self {
        self.template = Some(template);
        self
    }
}

impl From<&str> for ContentTypeSpec {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
