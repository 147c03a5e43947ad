use std::fs;
use std::path::Path;

use rooftop_core::{ContentTypeSpec, OutputFn, OutputPath, SharedContext, TemplateSpec};
use rooftop_logging::{rooftop_debug, rooftop_info};
use serde_json::{Map, Value};

use crate::output_path::sanitize_output_path;
use crate::persist::AssetSink;
use crate::render::{CompiledTemplate, TemplateEngine};
use crate::{PluginError, RenderError};

/// Assets produced by one emit phase, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub json_artifact: Option<String>,
    pub rendered: Vec<String>,
}

impl EmitSummary {
    pub fn asset_count(&self) -> usize {
        self.rendered.len() + usize::from(self.json_artifact.is_some())
    }
}

/// Serializes `results` as 2-space pretty JSON at `target`.
pub fn write_json_artifact(
    target: &str,
    results: &Value,
    sink: &mut dyn AssetSink,
) -> Result<String, PluginError> {
    let path = sanitize_output_path(target)?;
    let body = serde_json::to_string_pretty(results)?;
    sink.emit(&path, &body)?;
    rooftop_info!("wrote {} ({} bytes)", path, body.len());
    Ok(path)
}

/// Renders one output file per item of `spec`.
///
/// The template is read and compiled once, with the shared variables bound
/// at compile time. Each item renders in its own fresh scope layered over
/// them. The first failure aborts the
/// batch; files already emitted stay in place.
pub fn render_content_type(
    spec: &ContentTypeSpec,
    template: &TemplateSpec,
    root: &Path,
    shared: &SharedContext,
    engine: &dyn TemplateEngine,
    sink: &mut dyn AssetSink,
) -> Result<Vec<String>, PluginError> {
    let items = content_items(spec, shared)?;

    let path = root.join(&template.path);
    let source = fs::read_to_string(&path).map_err(|source| RenderError::ReadTemplate {
        path: path.clone(),
        source,
    })?;
    let name = template.path.to_string_lossy();
    let compiled = engine.compile(&name, &source, shared.as_map())?;
    let output = OutputResolver::new(&template.output, engine, &spec.name)?;

    let mut written = Vec::with_capacity(items.len());
    for item in items {
        let html = compiled.output(item)?;
        let target = sanitize_output_path(&output.resolve(item)?)?;
        sink.emit(&target, &html)?;
        rooftop_debug!("rendered {} -> {}", name, target);
        written.push(target);
    }
    rooftop_info!("rendered {} `{}` pages", written.len(), spec.name);
    Ok(written)
}

fn content_items<'a>(
    spec: &ContentTypeSpec,
    shared: &'a SharedContext,
) -> Result<&'a Vec<Value>, RenderError> {
    match shared.results().and_then(|results| results.get(&spec.name)) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(RenderError::UnexpectedData {
            content_type: spec.name.clone(),
        }),
        None => Err(RenderError::MissingContent {
            content_type: spec.name.clone(),
        }),
    }
}

enum OutputResolver<'a> {
    Pattern(Box<dyn CompiledTemplate>),
    Custom(&'a OutputFn),
}

impl<'a> OutputResolver<'a> {
    fn new(
        output: &'a OutputPath,
        engine: &dyn TemplateEngine,
        content_type: &str,
    ) -> Result<Self, RenderError> {
        match output {
            OutputPath::Pattern(pattern) => {
                let name = format!("{content_type}:output");
                engine
                    .compile(&name, pattern, &Map::new())
                    .map(OutputResolver::Pattern)
            }
            OutputPath::Custom(f) => Ok(OutputResolver::Custom(f)),
        }
    }

    fn resolve(&self, item: &Value) -> Result<String, RenderError> {
        match self {
            OutputResolver::Pattern(compiled) => compiled
                .output(item)
                .map(|path| path.trim().to_string()),
            OutputResolver::Custom(f) => Ok(f(item)),
        }
    }
}
