use std::fs;
use std::path::{Path, PathBuf};

use rooftop_engine::PluginSettings;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid RON settings: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Ron,
    Json,
}

impl SettingsFormat {
    /// `.json` files are JSON; everything else is read as RON.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Ron,
        }
    }
}

/// Contents of the settings file.
///
/// ```ron
/// #![enable(implicit_some)]
/// (
///     plugin: (
///         name: "acme",
///         api_token: "...",
///         json: "data.json",
///         content_types: ["posts", {"name": "case_studies", "transform": false}],
///     ),
///     locals: {"site": "Acme"},
/// )
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    pub plugin: PluginSettings,
    /// Initial shared variables, visible to every template.
    #[serde(default)]
    pub locals: Map<String, Value>,
}

impl AppSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, SettingsFormat::for_path(path))
    }

    pub fn parse(text: &str, format: SettingsFormat) -> Result<Self, SettingsError> {
        match format {
            SettingsFormat::Ron => Ok(ron::from_str(text)?),
            SettingsFormat::Json => Ok(serde_json::from_str(text)?),
        }
    }
}
