use serde_json::{Map, Value};

/// Key under which fetched content is published in the shared context.
pub const RESULT_KEY: &str = "rooftop";

/// Content type name to its list of items, in configuration order.
pub type ResultMap = Map<String, Value>;

/// Build-wide variable store that templates read from.
///
/// The plugin contributes to it without owning it. Every mutation is a
/// key-by-key merge; the map as a whole is never replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedContext {
    vars: Map<String, Value>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.vars
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.vars.insert(key.into(), value)
    }

    /// Merges `extra` key by key; keys not present in `extra` are untouched.
    pub fn merge(&mut self, extra: Map<String, Value>) {
        for (key, value) in extra {
            self.vars.insert(key, value);
        }
    }

    pub fn publish_results(&mut self, results: ResultMap) {
        self.vars.insert(RESULT_KEY.to_string(), Value::Object(results));
    }

    pub fn results(&self) -> Option<&Value> {
        self.vars.get(RESULT_KEY)
    }
}

impl From<Map<String, Value>> for SharedContext {
    fn from(vars: Map<String, Value>) -> Self {
        Self { vars }
    }
}
