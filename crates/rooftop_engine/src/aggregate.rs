use std::sync::Arc;

use futures_util::future::try_join_all;
use rooftop_core::{ContentTypeSpec, ResultMap, SharedContext, TransformError};
use rooftop_logging::{rooftop_debug, rooftop_info};
use serde_json::{Map, Value};

use crate::fetch::ContentClient;
use crate::PluginError;

/// Rewrites the aggregated results and contributes extra shared variables.
pub type PostTransform = Arc<
    dyn Fn(ResultMap, &SharedContext) -> Result<(ResultMap, Map<String, Value>), TransformError>
        + Send
        + Sync,
>;

/// Fetches one content type and runs its transform over every entry.
///
/// A single failing entry fails the whole content type.
pub async fn fetch_content_type(
    client: &dyn ContentClient,
    spec: &ContentTypeSpec,
) -> Result<Vec<Value>, PluginError> {
    let raw = client
        .get(&spec.name, &spec.request_options)
        .await
        .map_err(|source| PluginError::Fetch {
            content_type: spec.name.clone(),
            source,
        })?;
    rooftop_debug!("`{}`: {} raw entries", spec.name, raw.len());

    raw.into_iter()
        .map(|entry| spec.transform.apply(entry))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| PluginError::Transform {
            content_type: spec.name.clone(),
            source,
        })
}

/// Fetches every content type concurrently; keys follow `specs` order no
/// matter which request finishes first.
pub async fn aggregate(
    client: &dyn ContentClient,
    specs: &[ContentTypeSpec],
) -> Result<ResultMap, PluginError> {
    let fetched = try_join_all(specs.iter().map(|spec| fetch_content_type(client, spec))).await?;

    let mut results = ResultMap::new();
    for (spec, items) in specs.iter().zip(fetched) {
        rooftop_info!("fetched {} `{}` items", items.len(), spec.name);
        results.insert(spec.name.clone(), Value::Array(items));
    }
    Ok(results)
}

/// Runs the post-transform hook, if any, merging its extra variables into
/// `shared`.
pub fn apply_post_transform(
    hook: Option<&PostTransform>,
    results: ResultMap,
    shared: &mut SharedContext,
) -> Result<ResultMap, PluginError> {
    let Some(hook) = hook else {
        return Ok(results);
    };
    let (results, extra) = hook(results, &*shared).map_err(PluginError::PostTransform)?;
    rooftop_debug!("post-transform contributed {} shared variables", extra.len());
    shared.merge(extra);
    Ok(results)
}
