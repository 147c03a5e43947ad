//! Rooftop engine: fetch, aggregate and publish CMS content during a build.
mod aggregate;
mod config;
mod fetch;
mod output_path;
mod persist;
mod plugin;
mod publish;
mod render;
mod types;

pub use aggregate::{aggregate, apply_post_transform, fetch_content_type, PostTransform};
pub use config::{
    CmsEndpoint, ConfigurationError, ContentTypeEntry, ContentTypeSettings, PluginOptions,
    PluginOptionsBuilder, PluginSettings, TemplateSettings, DEFAULT_CONTENT_TYPE,
};
pub use fetch::{ContentClient, FetchSettings, ReqwestContentClient, API_TOKEN_HEADER};
pub use output_path::sanitize_output_path;
pub use persist::{AssetSink, DirectoryAssetSink, MemoryAssetSink, PersistError};
pub use plugin::{BuildHooks, RooftopPlugin};
pub use publish::{render_content_type, write_json_artifact, EmitSummary};
pub use render::{CompiledTemplate, MiniJinjaEngine, TemplateEngine};
pub use types::{FailureKind, FetchError, PluginError, RenderError};

pub use rooftop_core::{
    normalize, ContentTypeSpec, OutputPath, ResultMap, SharedContext, TemplateSpec, Transform,
    TransformError, RESULT_KEY,
};
