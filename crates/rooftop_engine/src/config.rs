//! Plugin options and their validation.
//!
//! Options can be assembled in code through [`PluginOptionsBuilder`] (the only
//! way to attach closures) or deserialized from a settings file into
//! [`PluginSettings`]. Both paths end in [`PluginOptionsBuilder::build`], which
//! rejects bad options before any network activity happens.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rooftop_core::{
    ContentTypeSpec, OutputPath, ResultMap, SharedContext, TemplateSpec, Transform,
    TransformError, RESERVED_OPTION_KEYS,
};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::aggregate::PostTransform;
use crate::fetch::FetchSettings;
use crate::output_path::sanitize_output_path;

/// Content fetched when no content types are configured.
pub const DEFAULT_CONTENT_TYPE: &str = "posts";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("option \"name\" or \"url\" is required")]
    MissingCmsIdentifier,
    #[error("options \"name\" and \"url\" are mutually exclusive")]
    ConflictingCmsIdentifier,
    #[error("option \"url\" is not a valid url: {0}")]
    InvalidUrl(String),
    #[error("option \"api_token\" is required")]
    MissingApiToken,
    #[error("option \"json\" is not a usable output path: {0}")]
    InvalidJsonTarget(String),
    #[error("content type #{index}: {reason}")]
    InvalidContentType { index: usize, reason: String },
    #[error("content type \"{0}\" is configured more than once")]
    DuplicateContentType(String),
}

/// Which CMS instance to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsEndpoint {
    /// Hosted instance name, e.g. `acme` for `acme.rooftopcms.io`.
    Name(String),
    /// Full API base url.
    Url(Url),
}

impl CmsEndpoint {
    pub fn base_url(&self) -> Result<Url, ConfigurationError> {
        match self {
            CmsEndpoint::Url(url) => Ok(url.clone()),
            CmsEndpoint::Name(name) => {
                let raw = format!("https://{name}.rooftopcms.io/wp-json/wp/v2/");
                Url::parse(&raw).map_err(|err| ConfigurationError::InvalidUrl(err.to_string()))
            }
        }
    }
}

/// Validated, immutable plugin options.
#[derive(Clone)]
pub struct PluginOptions {
    endpoint: CmsEndpoint,
    base_url: Url,
    api_token: String,
    json: Option<String>,
    post_transform: Option<PostTransform>,
    content_types: Vec<ContentTypeSpec>,
    project_root: PathBuf,
    fetch_settings: FetchSettings,
}

impl PluginOptions {
    pub fn builder() -> PluginOptionsBuilder {
        PluginOptionsBuilder::default()
    }

    pub fn endpoint(&self) -> &CmsEndpoint {
        &self.endpoint
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    /// Output path of the JSON artifact, already sanitized.
    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    pub fn post_transform(&self) -> Option<&PostTransform> {
        self.post_transform.as_ref()
    }

    pub fn content_types(&self) -> &[ContentTypeSpec] {
        &self.content_types
    }

    /// Directory that template paths are resolved against.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn fetch_settings(&self) -> &FetchSettings {
        &self.fetch_settings
    }
}

impl fmt::Debug for PluginOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginOptions")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<redacted>")
            .field("json", &self.json)
            .field("post_transform", &self.post_transform.as_ref().map(|_| ".."))
            .field("content_types", &self.content_types)
            .field("project_root", &self.project_root)
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct PluginOptionsBuilder {
    name: Option<String>,
    url: Option<String>,
    api_token: Option<String>,
    json: Option<String>,
    post_transform: Option<PostTransform>,
    content_types: Option<Vec<ContentTypeSpec>>,
    project_root: Option<PathBuf>,
    fetch_settings: FetchSettings,
}

impl PluginOptionsBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn json(mut self, target: impl Into<String>) -> Self {
        self.json = Some(target.into());
        self
    }

    /// Hook run once per pass on the aggregated results. It returns the
    /// replacement result map and extra variables merged into the shared
    /// context.
    pub fn post_transform<F>(mut self, hook: F) -> Self
    where
        F: Fn(ResultMap, &SharedContext) -> Result<(ResultMap, Map<String, Value>), TransformError>
            + Send
            + Sync
            + 'static,
    {
        self.post_transform = Some(Arc::new(hook));
        self
    }

    pub fn content_type(mut self, spec: impl Into<ContentTypeSpec>) -> Self {
        self.content_types.get_or_insert_with(Vec::new).push(spec.into());
        self
    }

    pub fn content_types<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ContentTypeSpec>,
    {
        self.content_types
            .get_or_insert_with(Vec::new)
            .extend(specs.into_iter().map(Into::into));
        self
    }

    pub fn project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn fetch_settings(mut self, settings: FetchSettings) -> Self {
        self.fetch_settings = settings;
        self
    }

    pub fn build(self) -> Result<PluginOptions, ConfigurationError> {
        let endpoint = match (non_empty(self.name), non_empty(self.url)) {
            (Some(_), Some(_)) => return Err(ConfigurationError::ConflictingCmsIdentifier),
            (None, None) => return Err(ConfigurationError::MissingCmsIdentifier),
            (Some(name), None) => CmsEndpoint::Name(name),
            (None, Some(url)) => CmsEndpoint::Url(
                Url::parse(&url).map_err(|err| ConfigurationError::InvalidUrl(err.to_string()))?,
            ),
        };
        let base_url = endpoint.base_url()?;
        let api_token = non_empty(self.api_token).ok_or(ConfigurationError::MissingApiToken)?;
        let json = self
            .json
            .map(|target| {
                sanitize_output_path(&target)
                    .map_err(|err| ConfigurationError::InvalidJsonTarget(err.to_string()))
            })
            .transpose()?;

        let content_types = self
            .content_types
            .unwrap_or_else(|| vec![ContentTypeSpec::new(DEFAULT_CONTENT_TYPE)]);
        validate_content_types(&content_types)?;

        Ok(PluginOptions {
            endpoint,
            base_url,
            api_token,
            json,
            post_transform: self.post_transform,
            content_types,
            project_root: self.project_root.unwrap_or_else(|| PathBuf::from(".")),
            fetch_settings: self.fetch_settings,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_content_types(specs: &[ContentTypeSpec]) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for (index, spec) in specs.iter().enumerate() {
        let invalid = |reason: String| ConfigurationError::InvalidContentType { index, reason };
        if spec.name.trim().is_empty() {
            return Err(invalid("\"name\" is required".to_string()));
        }
        if spec.name.contains(['/', '?', '#']) {
            return Err(invalid(format!("\"{}\" is not a resource name", spec.name)));
        }
        if let Some(key) = RESERVED_OPTION_KEYS
            .iter()
            .find(|key| spec.request_options.contains_key(**key))
        {
            return Err(invalid(format!("\"{key}\" cannot be a request option")));
        }
        if let Some(template) = &spec.template {
            if template.path.as_os_str().is_empty() {
                return Err(invalid("template \"path\" is required".to_string()));
            }
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(ConfigurationError::DuplicateContentType(spec.name.clone()));
        }
    }
    Ok(())
}

/// Options as written in a settings file.
///
/// Unknown keys are ignored so the same file can carry host settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub content_types: Option<Vec<ContentTypeEntry>>,
}

impl PluginSettings {
    pub fn into_builder(self) -> PluginOptionsBuilder {
        let mut builder = PluginOptions::builder();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(url) = self.url {
            builder = builder.url(url);
        }
        if let Some(token) = self.api_token {
            builder = builder.api_token(token);
        }
        if let Some(json) = self.json {
            builder = builder.json(json);
        }
        if let Some(entries) = self.content_types {
            builder = builder.content_types(entries);
        }
        builder
    }
}

/// A content type in a settings file: either a bare name or a full entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentTypeEntry {
    Name(String),
    Spec(ContentTypeSettings),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentTypeSettings {
    pub name: String,
    #[serde(default = "default_transform")]
    pub transform: bool,
    #[serde(default)]
    pub request_options: Map<String, Value>,
    #[serde(default)]
    pub template: Option<TemplateSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateSettings {
    pub path: PathBuf,
    /// Output path pattern rendered with `{ item }`.
    pub output: String,
}

fn default_transform() -> bool {
    true
}

impl From<ContentTypeEntry> for ContentTypeSpec {
    fn from(entry: ContentTypeEntry) -> Self {
        match entry {
            ContentTypeEntry::Name(name) => ContentTypeSpec::new(name),
            ContentTypeEntry::Spec(settings) => {
                let mut spec = ContentTypeSpec::new(settings.name)
                    .with_transform(Transform::from(settings.transform));
                spec.request_options = settings.request_options;
                if let Some(template) = settings.template {
                    spec = spec.with_template(TemplateSpec::new(
                        template.path,
                        OutputPath::Pattern(template.output),
                    ));
                }
                spec
            }
        }
    }
}

impl<'de> Deserialize<'de> for ContentTypeEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = ContentTypeEntry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a content type name or a content type entry")
            }

            fn visit_str<E: de::Error>(self, name: &str) -> Result<Self::Value, E> {
                Ok(ContentTypeEntry::Name(name.to_string()))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
                ContentTypeSettings::deserialize(de::value::MapAccessDeserializer::new(map))
                    .map(ContentTypeEntry::Spec)
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> PluginOptionsBuilder {
        PluginOptions::builder().name("acme").api_token("secret")
    }

    #[test]
    fn defaults_to_posts() {
        let options = base().build().unwrap();
        let names: Vec<_> = options.content_types().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["posts"]);
        assert_eq!(
            options.base_url().as_str(),
            "https://acme.rooftopcms.io/wp-json/wp/v2/"
        );
    }

    #[test]
    fn content_type_accepts_bare_names_and_full_specs() {
        let options = base()
            .content_type("posts")
            .content_type(ContentTypeSpec::new("pages").with_transform(false))
            .build()
            .unwrap();
        let specs = options.content_types();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "posts");
        assert!(matches!(specs[0].transform, Transform::Normalize));
        assert_eq!(specs[1].name, "pages");
        assert!(matches!(specs[1].transform, Transform::Identity));
    }

    #[test]
    fn cms_identifier_is_required() {
        let err = PluginOptions::builder().api_token("t").build().unwrap_err();
        assert_eq!(err, ConfigurationError::MissingCmsIdentifier);
        assert_eq!(err.to_string(), "option \"name\" or \"url\" is required");
    }

    #[test]
    fn name_and_url_conflict() {
        let err = base().url("https://cms.test/api").build().unwrap_err();
        assert_eq!(err, ConfigurationError::ConflictingCmsIdentifier);
    }

    #[test]
    fn api_token_is_required() {
        let err = PluginOptions::builder().name("acme").build().unwrap_err();
        assert_eq!(err, ConfigurationError::MissingApiToken);
        let err = PluginOptions::builder().name("acme").api_token("  ").build().unwrap_err();
        assert_eq!(err, ConfigurationError::MissingApiToken);
    }

    #[test]
    fn unusable_json_target_is_rejected() {
        let err = base().json("../data.json").build().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidJsonTarget(_)));
    }

    #[test]
    fn reserved_request_option_is_rejected() {
        let spec = ContentTypeSpec::new("posts").with_request_option("transform", json!(false));
        let err = base().content_type(spec).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidContentType { index: 0, .. }));
    }

    #[test]
    fn duplicate_content_types_are_rejected() {
        let err = base().content_types(["posts", "posts"]).build().unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateContentType("posts".into()));
    }

    #[test]
    fn settings_entries_accept_names_and_structs() {
        let settings: PluginSettings = serde_json::from_value(json!({
            "url": "https://cms.test/wp-json/wp/v2",
            "api_token": "secret",
            "content_types": [
                "posts",
                {
                    "name": "case_studies",
                    "transform": false,
                    "request_options": { "per_page": 5 },
                    "template": { "path": "views/case.html", "output": "case/{{ item.slug }}.html" }
                }
            ]
        }))
        .unwrap();
        let options = settings.into_builder().build().unwrap();

        let specs = options.content_types();
        assert_eq!(specs.len(), 2);
        assert!(matches!(specs[0].transform, Transform::Normalize));
        assert!(matches!(specs[1].transform, Transform::Identity));
        assert_eq!(specs[1].request_options.get("per_page"), Some(&json!(5)));
        let template = specs[1].template.as_ref().unwrap();
        assert_eq!(template.path, PathBuf::from("views/case.html"));
        assert!(matches!(&template.output, OutputPath::Pattern(p) if p == "case/{{ item.slug }}.html"));
    }
}
