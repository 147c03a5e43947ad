use std::path::Path;

use minijinja::{context, path_loader, Environment, UndefinedBehavior, Value as TemplateValue};
use serde_json::{Map, Value};

use crate::RenderError;

/// Compiles template sources once so they can be applied to many items.
pub trait TemplateEngine: Send + Sync {
    /// Compiles `source` with `shared` bound as the base scope of every
    /// render. The shared variables are converted once here, not per item.
    fn compile(
        &self,
        name: &str,
        source: &str,
        shared: &Map<String, Value>,
    ) -> Result<Box<dyn CompiledTemplate>, RenderError>;
}

pub trait CompiledTemplate: Send + Sync {
    /// Renders with a fresh scope holding `item` over the bound shared variables.
    fn output(&self, item: &Value) -> Result<String, RenderError>;
}

/// Jinja-style engine. Includes and `extends` resolve against the project
/// root, and referencing an undefined variable is an error.
#[derive(Debug, Clone)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let mut env = Self::bare_environment();
        env.set_loader(path_loader(root.as_ref().to_path_buf()));
        Self { env }
    }

    /// Engine without a loader; templates cannot include other files.
    pub fn standalone() -> Self {
        Self {
            env: Self::bare_environment(),
        }
    }

    /// Access for hosts that register their own filters or globals.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    fn bare_environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn compile(
        &self,
        name: &str,
        source: &str,
        shared: &Map<String, Value>,
    ) -> Result<Box<dyn CompiledTemplate>, RenderError> {
        let mut env = self.env.clone();
        env.add_template_owned(name.to_string(), source.to_string())
            .map_err(|err| template_error(name, &err))?;
        Ok(Box::new(MiniJinjaTemplate {
            env,
            name: name.to_string(),
            shared: TemplateValue::from_serialize(shared),
        }))
    }
}

struct MiniJinjaTemplate {
    env: Environment<'static>,
    name: String,
    shared: TemplateValue,
}

impl CompiledTemplate for MiniJinjaTemplate {
    fn output(&self, item: &Value) -> Result<String, RenderError> {
        let template = self
            .env
            .get_template(&self.name)
            .map_err(|err| template_error(&self.name, &err))?;
        // `shared` is reference counted; only `item` is converted per render.
        let scope = context! {
            item => TemplateValue::from_serialize(item),
            ..self.shared.clone()
        };
        template
            .render(scope)
            .map_err(|err| template_error(&self.name, &err))
    }
}

fn template_error(name: &str, err: &minijinja::Error) -> RenderError {
    RenderError::Template {
        name: name.to_string(),
        message: format!("{err:#}"),
    }
}
