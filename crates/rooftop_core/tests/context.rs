use pretty_assertions::assert_eq;
use rooftop_core::{SharedContext, RESULT_KEY};
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn merge_keeps_unrelated_keys() {
    let mut ctx = SharedContext::from(object(json!({ "site": "Acme", "year": 2024 })));
    ctx.merge(object(json!({ "year": 2025, "nav": ["home"] })));

    assert_eq!(ctx.get("site"), Some(&json!("Acme")));
    assert_eq!(ctx.get("year"), Some(&json!(2025)));
    assert_eq!(ctx.get("nav"), Some(&json!(["home"])));
    assert_eq!(ctx.len(), 3);
}

#[test]
fn publishing_results_only_touches_result_key() {
    let mut ctx = SharedContext::from(object(json!({ "site": "Acme" })));
    ctx.publish_results(object(json!({ "posts": [] })));

    assert_eq!(ctx.get("site"), Some(&json!("Acme")));
    assert_eq!(ctx.get(RESULT_KEY), Some(&json!({ "posts": [] })));
}

