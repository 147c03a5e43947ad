#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

use rooftop_engine::{ContentClient, FailureKind, FetchError};
use serde_json::{json, Map, Value};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(rooftop_logging::initialize_for_tests);
}

pub fn raw_entry(id: u64, title: &str) -> Value {
    json!({
        "id": id,
        "slug": title.to_lowercase().replace(' ', "-"),
        "title": { "rendered": title },
        "content": { "basic": { "content": format!("<p>{title}</p>"), "excerpt": "" } },
        "guid": { "rendered": format!("https://acme.test/?p={id}") },
        "link": format!("https://acme.test/{id}"),
        "_links": {}
    })
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// In-memory content API returning canned entries per content type.
#[derive(Default)]
pub struct FixtureClient {
    responses: HashMap<String, Vec<Value>>,
    calls: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
}

impl FixtureClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, content_type: &str, entries: Vec<Value>) -> Self {
        self.responses.insert(content_type.to_string(), entries);
        self
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ContentClient for FixtureClient {
    async fn get(
        &self,
        content_type: &str,
        request_options: &Map<String, Value>,
    ) -> Result<Vec<Value>, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((content_type.to_string(), request_options.clone()));
        self.responses
            .get(content_type)
            .cloned()
            .ok_or_else(|| FetchError::new(FailureKind::HttpStatus(404), "rest_no_route"))
    }
}
