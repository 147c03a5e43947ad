use rooftop_core::{ResultMap, SharedContext};
use rooftop_logging::rooftop_info;

use crate::aggregate::{aggregate, apply_post_transform};
use crate::config::PluginOptions;
use crate::fetch::{ContentClient, ReqwestContentClient};
use crate::persist::AssetSink;
use crate::publish::{render_content_type, write_json_artifact, EmitSummary};
use crate::render::TemplateEngine;
use crate::PluginError;

/// Lifecycle points a host build tool calls into.
#[async_trait::async_trait]
pub trait BuildHooks: Send + Sync {
    /// Before a full build.
    async fn before_build(&self, shared: &mut SharedContext) -> Result<(), PluginError>;

    /// Before an incremental rebuild; content is refetched from scratch.
    async fn before_rebuild(&self, shared: &mut SharedContext) -> Result<(), PluginError>;

    /// While the host collects output assets.
    fn emit_assets(
        &self,
        shared: &SharedContext,
        engine: &dyn TemplateEngine,
        sink: &mut dyn AssetSink,
    ) -> Result<EmitSummary, PluginError>;
}

/// Fetches CMS content into the shared context and publishes it as assets.
pub struct RooftopPlugin<C = ReqwestContentClient> {
    options: PluginOptions,
    client: C,
}

impl RooftopPlugin<ReqwestContentClient> {
    pub fn new(options: PluginOptions) -> Result<Self, PluginError> {
        let client = ReqwestContentClient::new(
            options.base_url().clone(),
            options.api_token(),
            options.fetch_settings().clone(),
        )
        .map_err(PluginError::Client)?;
        Ok(Self { options, client })
    }
}

impl<C: ContentClient> RooftopPlugin<C> {
    pub fn with_client(options: PluginOptions, client: C) -> Self {
        Self { options, client }
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Fetch phase: fetch and transform every content type, run the
    /// post-transform hook, then publish the results under
    /// [`rooftop_core::RESULT_KEY`]. Other shared keys are left alone.
    pub async fn run(&self, shared: &mut SharedContext) -> Result<ResultMap, PluginError> {
        rooftop_info!(
            "fetching {} content types from {}",
            self.options.content_types().len(),
            self.options.base_url()
        );
        let results = aggregate(&self.client, self.options.content_types()).await?;
        let results = apply_post_transform(self.options.post_transform(), results, shared)?;
        shared.publish_results(results.clone());
        Ok(results)
    }

    /// [`run`](Self::run) on a private runtime, for hosts without one.
    pub fn run_blocking(&self, shared: &mut SharedContext) -> Result<ResultMap, PluginError> {
        let runtime = tokio::runtime::Runtime::new().map_err(PluginError::Runtime)?;
        runtime.block_on(self.run(shared))
    }

    /// Emit phase: the JSON artifact (when configured) and one page per item
    /// for every content type with a template.
    pub fn emit(
        &self,
        shared: &SharedContext,
        engine: &dyn TemplateEngine,
        sink: &mut dyn AssetSink,
    ) -> Result<EmitSummary, PluginError> {
        let results = shared.results().ok_or(PluginError::NotRun)?;
        let mut summary = EmitSummary::default();

        if let Some(target) = self.options.json() {
            summary.json_artifact = Some(write_json_artifact(target, results, sink)?);
        }

        for spec in self.options.content_types() {
            let Some(template) = &spec.template else {
                continue;
            };
            let written = render_content_type(
                spec,
                template,
                self.options.project_root(),
                shared,
                engine,
                sink,
            )?;
            summary.rendered.extend(written);
        }
        Ok(summary)
    }
}

#[async_trait::async_trait]
impl<C: ContentClient> BuildHooks for RooftopPlugin<C> {
    async fn before_build(&self, shared: &mut SharedContext) -> Result<(), PluginError> {
        self.run(shared).await.map(|_| ())
    }

    async fn before_rebuild(&self, shared: &mut SharedContext) -> Result<(), PluginError> {
        self.run(shared).await.map(|_| ())
    }

    fn emit_assets(
        &self,
        shared: &SharedContext,
        engine: &dyn TemplateEngine,
        sink: &mut dyn AssetSink,
    ) -> Result<EmitSummary, PluginError> {
        self.emit(shared, engine, sink)
    }
}
