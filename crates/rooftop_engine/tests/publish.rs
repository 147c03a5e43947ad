mod common;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{init_logging, object};
use pretty_assertions::assert_eq;
use rooftop_engine::{
    render_content_type, write_json_artifact, CompiledTemplate, ContentTypeSpec, MemoryAssetSink,
    MiniJinjaEngine, OutputPath, PluginError, RenderError, SharedContext, TemplateEngine,
    TemplateSpec,
};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn project(template: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("views")).unwrap();
    fs::write(temp.path().join("views/post.html"), template).unwrap();
    temp
}

fn shared_with(results: Value) -> SharedContext {
    let mut shared = SharedContext::from(object(json!({ "site": "Acme" })));
    shared.publish_results(object(results));
    shared
}

fn posts_spec(output: OutputPath) -> (ContentTypeSpec, TemplateSpec) {
    let template = TemplateSpec::new("views/post.html", output);
    (
        ContentTypeSpec::new("posts").with_template(template.clone()),
        template,
    )
}

fn render(
    root: &Path,
    shared: &SharedContext,
    output: OutputPath,
    sink: &mut MemoryAssetSink,
) -> Result<Vec<String>, PluginError> {
    let (spec, template) = posts_spec(output);
    let engine = MiniJinjaEngine::new(root);
    render_content_type(&spec, &template, root, shared, &engine, sink)
}

#[test]
fn json_artifact_is_pretty_printed() {
    let mut sink = MemoryAssetSink::new();
    let results = json!({ "posts": [{ "title": "One" }] });

    let path = write_json_artifact("data.json", &results, &mut sink).unwrap();

    assert_eq!(path, "data.json");
    assert_eq!(
        sink.get("data.json").unwrap(),
        "{\n  \"posts\": [\n    {\n      \"title\": \"One\"\n    }\n  ]\n}"
    );
}

#[test]
fn each_item_renders_its_own_file() {
    init_logging();
    let temp = project("<p>{{ item.title }}</p>");
    let shared = shared_with(json!({
        "posts": [
            { "slug": "first", "title": "First" },
            { "slug": "second", "title": "Second" }
        ]
    }));
    let mut sink = MemoryAssetSink::new();

    let written = render(
        temp.path(),
        &shared,
        OutputPath::Pattern("posts/{{ item.slug }}.html".into()),
        &mut sink,
    )
    .unwrap();

    assert_eq!(written, vec!["posts/first.html", "posts/second.html"]);
    assert_eq!(sink.len(), 2);
    assert_eq!(sink.get("posts/first.html").unwrap().trim(), "<p>First</p>");
    assert_eq!(sink.get("posts/second.html").unwrap().trim(), "<p>Second</p>");
}

#[test]
fn item_fields_do_not_leak_into_later_items() {
    let temp = project("{{ item.title }}{% if item.badge is defined %} [{{ item.badge }}]{% endif %}");
    let shared = shared_with(json!({
        "posts": [
            { "slug": "a", "title": "A", "badge": "new" },
            { "slug": "b", "title": "B" }
        ]
    }));
    let mut sink = MemoryAssetSink::new();

    render(
        temp.path(),
        &shared,
        OutputPath::Pattern("{{ item.slug }}.html".into()),
        &mut sink,
    )
    .unwrap();

    assert_eq!(sink.get("a.html").unwrap().trim(), "A [new]");
    assert_eq!(sink.get("b.html").unwrap().trim(), "B");
    assert!(!shared.contains_key("item"));
}

/// Records what the publisher hands to the engine instead of rendering.
#[derive(Default)]
struct RecordingEngine {
    compiled_with: Arc<Mutex<Vec<Vec<String>>>>,
    rendered: Arc<Mutex<Vec<Value>>>,
}

struct RecordingTemplate {
    rendered: Arc<Mutex<Vec<Value>>>,
}

impl TemplateEngine for RecordingEngine {
    fn compile(
        &self,
        _name: &str,
        _source: &str,
        shared: &Map<String, Value>,
    ) -> Result<Box<dyn CompiledTemplate>, RenderError> {
        self.compiled_with
            .lock()
            .unwrap()
            .push(shared.keys().cloned().collect());
        Ok(Box::new(RecordingTemplate {
            rendered: Arc::clone(&self.rendered),
        }))
    }
}

impl CompiledTemplate for RecordingTemplate {
    fn output(&self, item: &Value) -> Result<String, RenderError> {
        self.rendered.lock().unwrap().push(item.clone());
        Ok(String::new())
    }
}

fn many_posts(count: usize) -> Vec<Value> {
    let body = "lorem ipsum ".repeat(100);
    (0..count)
        .map(|i| json!({ "slug": format!("post-{i}"), "title": format!("Post {i}"), "body": body }))
        .collect()
}

#[test]
fn shared_variables_are_bound_once_per_batch() {
    let temp = project("unused");
    let posts = many_posts(300);
    let shared = shared_with(json!({ "posts": posts }));
    let (spec, template) = posts_spec(OutputPath::custom(|item| {
        format!("{}.html", item["slug"].as_str().unwrap_or("x"))
    }));
    let engine = RecordingEngine::default();
    let mut sink = MemoryAssetSink::new();

    render_content_type(&spec, &template, temp.path(), &shared, &engine, &mut sink).unwrap();

    assert_eq!(
        *engine.compiled_with.lock().unwrap(),
        vec![vec!["site".to_string(), "rooftop".to_string()]]
    );
    assert_eq!(*engine.rendered.lock().unwrap(), posts);
    assert_eq!(sink.len(), 300);
}

#[test]
fn renders_hundreds_of_items_against_the_full_result_set() {
    init_logging();
    let temp = project("<p>{{ item.title }} of {{ rooftop.posts | length }}</p>");
    let shared = shared_with(json!({ "posts": many_posts(400) }));
    let mut sink = MemoryAssetSink::new();

    let written = render(
        temp.path(),
        &shared,
        OutputPath::Pattern("posts/{{ item.slug }}.html".into()),
        &mut sink,
    )
    .unwrap();

    assert_eq!(written.len(), 400);
    assert_eq!(sink.get("posts/post-0.html").unwrap().trim(), "<p>Post 0 of 400</p>");
    assert_eq!(
        sink.get("posts/post-399.html").unwrap().trim(),
        "<p>Post 399 of 400</p>"
    );
}

#[test]
fn templates_see_shared_variables_and_includes() {
    init_logging();
    let temp = project("{% include \"views/header.html\" %}<p>{{ item.title }}</p>");
    fs::write(temp.path().join("views/header.html"), "<h1>{{ site }}</h1>").unwrap();
    let shared = shared_with(json!({ "posts": [{ "title": "Only" }] }));
    let mut sink = MemoryAssetSink::new();

    render(
        temp.path(),
        &shared,
        OutputPath::custom(|item| format!("{}.html", item["title"].as_str().unwrap_or("x"))),
        &mut sink,
    )
    .unwrap();

    assert_eq!(sink.get("Only.html").unwrap().trim(), "<h1>Acme</h1><p>Only</p>");
}

#[test]
fn undefined_variable_aborts_the_batch() {
    init_logging();
    let temp = project("<p>{{ item.subtitle.text }}</p>");
    let shared = shared_with(json!({ "posts": [{ "title": "One" }] }));
    let mut sink = MemoryAssetSink::new();

    let err = render(
        temp.path(),
        &shared,
        OutputPath::Pattern("{{ item.title }}.html".into()),
        &mut sink,
    )
    .unwrap_err();

    assert!(matches!(err, PluginError::Render(RenderError::Template { .. })));
    assert!(sink.is_empty());
}

#[test]
fn missing_template_file_is_a_render_error() {
    let temp = TempDir::new().unwrap();
    let shared = shared_with(json!({ "posts": [] }));
    let mut sink = MemoryAssetSink::new();

    let err = render(
        temp.path(),
        &shared,
        OutputPath::Pattern("x.html".into()),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, PluginError::Render(RenderError::ReadTemplate { .. })));
}

#[test]
fn non_list_content_cannot_be_rendered() {
    let temp = project("<p>{{ item }}</p>");
    let shared = shared_with(json!({ "posts": "foo" }));
    let mut sink = MemoryAssetSink::new();

    let err = render(
        temp.path(),
        &shared,
        OutputPath::Pattern("x.html".into()),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, PluginError::Render(RenderError::UnexpectedData { .. })));
}

#[test]
fn escaping_output_path_is_rejected() {
    let temp = project("<p>{{ item.title }}</p>");
    let shared = shared_with(json!({ "posts": [{ "title": "One" }] }));
    let mut sink = MemoryAssetSink::new();

    let err = render(
        temp.path(),
        &shared,
        OutputPath::custom(|_| "../escape.html".to_string()),
        &mut sink,
    )
    .unwrap_err();
    assert!(matches!(err, PluginError::Render(RenderError::InvalidOutputPath { .. })));
}
