use thiserror::Error;

/// Errors that can occur while compiling a flow into source code.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("Node '{node_id}' not found, which is referenced by '{referenced_by}'")]
    MissingNode {
        node_id: String,
        referenced_by: String,
    },

    #[error("Flow contains a dependency cycle: {}", cycle.join(" -> "))]
    CyclicGraph { cycle: Vec<String> },

    #[error("Node '{node_id}' has an unregistered or unsupported component type: '{type_name}'")]
    UnsupportedComponentType { node_id: String, type_name: String },

    #[error("Connections of node '{node_id}' are invalid: {message}")]
    ConnectionError { node_id: String, message: String },

    #[error("Component '{type_name}' failed to generate code for node '{node_id}': {source}")]
    ComponentCodeGeneration {
        node_id: String,
        type_name: String,
        source: ComponentError,
    },
}

/// Errors raised by a component descriptor while producing its code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("Missing configuration value '{0}'")]
    MissingConfig(String),

    #[error("Placeholder '{{{0}}}' cannot be resolved for this node")]
    UnresolvedPlaceholder(String),

    #[error("Malformed template near '{0}'")]
    MalformedTemplate(String),

    #[error("{0}")]
    Custom(String),
}

/// Errors that can occur while parsing a flow document.
#[derive(Error, Debug, Clone)]
pub enum FlowParseError {
    #[error("Failed to parse flow JSON: {0}")]
    Json(String),

    #[error("Failed to read flow document '{path}': {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Conversion(#[from] FlowConversionError),
}

/// Errors that can occur when converting a custom document model into a `Flow`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("Invalid flow data: {0}")]
    ValidationError(String),
}

/// Errors that can occur while populating a component registry.
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("Failed to parse component manifest: {0}")]
    ManifestParse(String),

    #[error("Component '{component_id}' declares an unsupported category: '{category}'")]
    UnsupportedCategory {
        component_id: String,
        category: String,
    },

    #[error("Cannot alias '{alias}' to unregistered component '{target}'")]
    UnknownAliasTarget { alias: String, target: String },
}

/// Errors that can occur while persisting or loading compiled artifacts.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("Artifact error: {0}")]
    Generic(String),
}
