//! `{{variable}}` substitution in requests

use crate::error::{ScenarioError, ScenarioResult};
use handlebars::Handlebars;
use probe_http::RequestSpec;
use serde_json::Value;

/// Strict handlebars rendering: a missing variable is an error, and nothing
/// is HTML-escaped
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);

        Self { handlebars }
    }

    /// Render a template string against `variables`
    pub fn render(&self, template: &str, variables: &Value) -> ScenarioResult<String> {
        if !self.has_variables(template) {
            return Ok(template.to_string());
        }

        self.handlebars
            .render_template(template, variables)
            .map_err(|e| ScenarioError::Template {
                template: template.to_string(),
                message: e.to_string(),
            })
    }

    /// Render every string leaf of `value`.
    ///
    /// A string that is exactly one `{{path}}` reference takes the variable's
    /// JSON value, so numbers and objects keep their type.
    pub fn render_value(&self, value: &Value, variables: &Value) -> ScenarioResult<Value> {
        match value {
            Value::String(template) => {
                if let Some(found) = single_reference(template).and_then(|p| lookup(variables, p)) {
                    return Ok(found.clone());
                }
                self.render(template, variables).map(Value::String)
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.render_value(item, variables))
                .collect::<ScenarioResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut rendered = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    rendered.insert(key.clone(), self.render_value(item, variables)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }

    /// Render the path, header values and body of a request
    pub fn render_request(&self, request: &RequestSpec, variables: &Value) -> ScenarioResult<RequestSpec> {
        let mut rendered = request.clone();
        rendered.path = self.render(&request.path, variables)?;
        for value in rendered.headers.values_mut() {
            *value = self.render(value, variables)?;
        }
        if let Some(body) = &request.body {
            rendered.body = Some(self.render_value(body, variables)?);
        }
        Ok(rendered)
    }

    pub fn has_variables(&self, template: &str) -> bool {
        template.contains("{{") && template.contains("}}")
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// `"{{ a.b }}"` -> `Some("a.b")`
fn single_reference(template: &str) -> Option<&str> {
    let inner = template.trim().strip_prefix("{{")?.strip_suffix("}}")?.trim();
    let simple = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-');
    simple.then_some(inner)
}

fn lookup<'a>(variables: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(variables, |current, segment| current.get(segment))
}
