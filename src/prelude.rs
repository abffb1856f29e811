//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! amphi_codegen crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use amphi_codegen::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let flow = load_flow("pipelines/orders.ampln")?;
//!
//! let mut registry = ComponentRegistry::with_defaults();
//! registry.load_manifest(&std::fs::read_to_string("components.json")?)?;
//!
//! let compiler = Compiler::builder(registry).build();
//! let compiled = compiler.compile_until(&flow, NO_TARGET)?;
//! println!("{}", compiled.source);
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{
    CompiledPipeline, Compiler, CompilerBuilder, MissingNodePolicy, NO_TARGET, OutputBinding,
};

// Flow model
pub use crate::flow::{
    Flow, FlowDocument, FlowEdge, FlowNode, IntoFlow, load_flow, parse_flow, reconnect_on_delete,
};

// Components
pub use crate::registry::{
    CodegenContext, ComponentCategory, ComponentDescriptor, ComponentRegistry, Inputs,
    TemplateComponent,
};

// Error types
pub use crate::error::{
    ArtifactError, CompileError, ComponentError, FlowConversionError, FlowParseError,
    RegistryError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
