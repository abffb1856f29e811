use super::{CodegenContext, ComponentCategory, ComponentDescriptor, Inputs};
use crate::error::{ComponentError, RegistryError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative component definition as found in a JSON manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    pub id: String,
    pub category: String,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
    pub template: String,
}

/// A component whose code is a text template.
///
/// Placeholders are written in braces, `{{` and `}}` produce literal braces:
///
/// - `{output}`: the variable this node assigns
/// - `{input}`: the single input of a processor or output
/// - `{input1}`, `{input2}`, ...: inputs by port position
/// - `{inputs}`: all inputs as a Python list literal
/// - `{node_id}`: the node id
/// - `{config.a.b}`: a configuration value, `{config.a|fallback}` with a default
#[derive(Debug, Clone)]
pub struct TemplateComponent {
    id: String,
    category: ComponentCategory,
    imports: Vec<String>,
    dependencies: Vec<String>,
    functions: Vec<String>,
    template: String,
}

impl TemplateComponent {
    pub fn new(id: &str, category: ComponentCategory, template: &str) -> Self {
        Self {
            id: id.to_string(),
            category,
            imports: Vec::new(),
            dependencies: Vec::new(),
            functions: Vec::new(),
            template: template.to_string(),
        }
    }

    pub fn with_imports(mut self, imports: &[&str]) -> Self {
        self.imports = imports.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_functions(mut self, functions: &[&str]) -> Self {
        self.functions = functions.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn from_spec(spec: TemplateSpec) -> Result<Self, RegistryError> {
        let category = spec
            .category
            .parse()
            .map_err(|category| RegistryError::UnsupportedCategory {
                component_id: spec.id.clone(),
                category,
            })?;
        Ok(Self {
            id: spec.id,
            category,
            imports: spec.imports,
            dependencies: spec.dependencies,
            functions: spec.functions,
            template: spec.template,
        })
    }
}

impl ComponentDescriptor for TemplateComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> ComponentCategory {
        self.category
    }

    fn imports(&self, _config: &Value) -> Vec<String> {
        self.imports.clone()
    }

    fn dependencies(&self, _config: &Value) -> Vec<String> {
        self.dependencies.clone()
    }

    fn functions(&self, _config: &Value) -> Vec<String> {
        self.functions.clone()
    }

    fn generate(&self, ctx: &CodegenContext<'_>) -> Result<String, ComponentError> {
        render(&self.template, ctx)
    }
}

/// Expands the placeholders of `template` against `ctx`.
pub fn render(template: &str, ctx: &CodegenContext<'_>) -> Result<String, ComponentError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if tail.starts_with('}') {
            return Err(ComponentError::MalformedTemplate(snippet(tail)));
        } else {
            let end = tail
                .find('}')
                .ok_or_else(|| ComponentError::MalformedTemplate(snippet(tail)))?;
            out.push_str(&resolve(tail[1..end].trim(), ctx)?);
            rest = &tail[end + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve(key: &str, ctx: &CodegenContext<'_>) -> Result<String, ComponentError> {
    if let Some(path) = key.strip_prefix("config.") {
        let (path, fallback) = match path.split_once('|') {
            Some((path, fallback)) => (path, Some(fallback)),
            None => (path, None),
        };
        return match lookup(ctx.config, path) {
            Some(value) => Ok(python_literal(value)),
            None => fallback
                .map(str::to_string)
                .ok_or_else(|| ComponentError::MissingConfig(path.to_string())),
        };
    }

    let unresolved = || ComponentError::UnresolvedPlaceholder(key.to_string());
    match key {
        "output" => ctx.output.map(str::to_string).ok_or_else(unresolved),
        "node_id" => Ok(ctx.node_id.to_string()),
        "input" => match &ctx.inputs {
            Inputs::Single(name) => Ok(name.clone()),
            _ => Err(unresolved()),
        },
        "inputs" => Ok(format!("[{}]", ctx.inputs.names().join(", "))),
        _ => {
            let position: usize = key
                .strip_prefix("input")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n >= 1)
                .ok_or_else(unresolved)?;
            ctx.inputs
                .names()
                .get(position - 1)
                .map(|name| name.to_string())
                .ok_or_else(unresolved)
        }
    }
}

fn lookup<'v>(config: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(config, |value, segment| value.get(segment))
        .filter(|value| !value.is_null())
}

/// Top-level strings are inserted verbatim so templates control their own
/// quoting; everything else becomes a Python literal.
fn python_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => nested_literal(other),
    }
}

fn nested_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        // JSON string escapes are valid Python string escapes.
        Value::Number(_) | Value::String(_) => value.to_string(),
        Value::Array(items) => format!("[{}]", items.iter().map(nested_literal).join(", ")),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(key, item)| format!("{}: {}", Value::String(key.clone()), nested_literal(item)))
                .join(", ")
        ),
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(24).collect()
}
