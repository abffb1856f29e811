use crate::error::{ComponentError, RegistryError};
use ahash::AHashMap;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

mod builtin;
pub mod template;

pub use builtin::BUILTIN_COMPONENTS;
pub use template::{TemplateComponent, TemplateSpec};

/// Logical role of a component in the dataflow, which fixes its input arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentCategory {
    /// Reads data; no inputs, one output.
    Input,
    /// One input, one output.
    Processor,
    /// Exactly two inputs (joins, comparisons), one output.
    DoubleProcessor,
    /// Any number of inputs (concatenation, union), one output.
    MultiProcessor,
    /// Writes data; one input, no output.
    Output,
    /// Runs in the generated script's exception handler.
    Logger,
    /// Canvas-only note.
    Annotation,
}

impl ComponentCategory {
    /// Whether nodes of this category bind an output variable.
    pub fn produces_output(self) -> bool {
        matches!(
            self,
            Self::Input | Self::Processor | Self::DoubleProcessor | Self::MultiProcessor
        )
    }

    /// Whether nodes of this category take part in dependency resolution.
    pub fn is_dataflow(self) -> bool {
        !matches!(self, Self::Logger | Self::Annotation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Processor => "processor",
            Self::DoubleProcessor => "double_processor",
            Self::MultiProcessor => "multi_processor",
            Self::Output => "output",
            Self::Logger => "logger",
            Self::Annotation => "annotation",
        }
    }
}

impl fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentCategory {
    type Err = String;

    /// Accepts both the short names and the editor's `_type` strings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" | "pandas_df_input" => Ok(Self::Input),
            "processor" | "pandas_df_processor" => Ok(Self::Processor),
            "double_processor" | "pandas_df_double_processor" => Ok(Self::DoubleProcessor),
            "multi_processor" | "pandas_df_multi_processor" => Ok(Self::MultiProcessor),
            "output" | "pandas_df_output" => Ok(Self::Output),
            "logger" => Ok(Self::Logger),
            "annotation" => Ok(Self::Annotation),
            other => Err(other.to_string()),
        }
    }
}

/// Resolved input variable names handed to a component's code generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inputs {
    None,
    Single(String),
    Pair(String, String),
    Many(Vec<String>),
}

impl Inputs {
    /// All input names in port order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Inputs::None => Vec::new(),
            Inputs::Single(name) => vec![name.as_str()],
            Inputs::Pair(first, second) => vec![first.as_str(), second.as_str()],
            Inputs::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Everything a component needs to emit the code for one node.
#[derive(Debug, Clone)]
pub struct CodegenContext<'a> {
    pub node_id: &'a str,
    pub config: &'a Value,
    pub inputs: Inputs,
    /// Variable the component must assign; `None` for outputs and loggers.
    pub output: Option<&'a str>,
}

/// Defines the contract between the compiler and one component type.
///
/// Implementations must be pure: the same context always yields the same code.
pub trait ComponentDescriptor: Send + Sync {
    fn id(&self) -> &str;
    fn category(&self) -> ComponentCategory;
    /// Import statements the generated code relies on.
    fn imports(&self, config: &Value) -> Vec<String>;
    /// Extra packages to install, listed in the script header.
    fn dependencies(&self, _config: &Value) -> Vec<String> {
        Vec::new()
    }
    /// Helper function definitions emitted once before the body.
    fn functions(&self, _config: &Value) -> Vec<String> {
        Vec::new()
    }
    fn generate(&self, ctx: &CodegenContext<'_>) -> Result<String, ComponentError>;
}

/// Component lookup by type id, populated at startup.
#[derive(Default)]
pub struct ComponentRegistry {
    components: AHashMap<String, Box<dyn ComponentDescriptor>>,
    aliases: AHashMap<String, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in components.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        builtin::register_defaults(&mut registry);
        registry
    }

    /// Registers a component under its own id, replacing any previous one.
    pub fn register(&mut self, component: Box<dyn ComponentDescriptor>) {
        let id = component.id().to_string();
        self.aliases.remove(&id);
        self.components.insert(id, component);
    }

    /// Makes `alias` resolve to the already registered component `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<(), RegistryError> {
        let resolved = self.resolve_id(target).ok_or_else(|| RegistryError::UnknownAliasTarget {
            alias: alias.to_string(),
            target: target.to_string(),
        })?;
        let resolved = resolved.to_string();
        self.aliases.insert(alias.to_string(), resolved);
        Ok(())
    }

    /// Registers every component of a JSON manifest (an array of `TemplateSpec`).
    /// Returns how many components were added.
    pub fn load_manifest(&mut self, json: &str) -> Result<usize, RegistryError> {
        let specs: Vec<TemplateSpec> =
            serde_json::from_str(json).map_err(|e| RegistryError::ManifestParse(e.to_string()))?;
        let components = specs
            .into_iter()
            .map(TemplateComponent::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let count = components.len();
        for component in components {
            self.register(Box::new(component));
        }
        Ok(count)
    }

    pub fn get(&self, type_id: &str) -> Option<&dyn ComponentDescriptor> {
        let id = self.resolve_id(type_id)?;
        self.components.get(id).map(|c| c.as_ref())
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.resolve_id(type_id).is_some()
    }

    /// All registered components, sorted by id.
    pub fn components(&self) -> Vec<&dyn ComponentDescriptor> {
        let mut components: Vec<&dyn ComponentDescriptor> =
            self.components.values().map(|c| c.as_ref()).collect();
        components.sort_by(|a, b| a.id().cmp(b.id()));
        components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn resolve_id<'a>(&'a self, type_id: &'a str) -> Option<&'a str> {
        if self.components.contains_key(type_id) {
            Some(type_id)
        } else {
            self.aliases
                .get(type_id)
                .map(String::as_str)
                .filter(|id| self.components.contains_key(*id))
        }
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.components.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ComponentRegistry")
            .field("components", &ids)
            .field("aliases", &self.aliases.len())
            .finish()
    }
}
