//! # Amphi Codegen - Pipeline to Python Compiler
//!
//! **Amphi Codegen** turns the node graphs drawn in the Amphi pipeline editor into
//! standalone Python scripts. Every node on the canvas is backed by a component
//! that knows which imports it needs and which lines of code it emits; the
//! compiler orders the nodes by their connections, names each intermediate
//! result and stitches the components' code into one runnable script.
//!
//! ## Core Workflow
//!
//! The compiler operates on a canonical model of a pipeline, the [`flow::Flow`].
//! The primary workflow is:
//!
//! 1.  **Load Your Flow**: Parse an `.ampln` document with [`flow::parse_flow`], or
//!     implement [`flow::IntoFlow`] for your own document model.
//! 2.  **Register Components**: Start from [`registry::ComponentRegistry::with_defaults`],
//!     load extra templates from a JSON manifest, or implement
//!     [`registry::ComponentDescriptor`] for components that need custom logic.
//! 3.  **Compile**: Use [`compiler::Compiler::builder`] to create a compiler and call
//!     `compile` for the whole pipeline or `compile_until` to stop at a node and
//!     observe its output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use amphi_codegen::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let flow = Flow::new(
//!         vec![
//!             FlowNode::new("read", "csvFileInput", json!({ "filePath": "sales.csv" })),
//!             FlowNode::new("rename", "renameColumns", json!({ "columns": { "amt": "amount" } })),
//!             FlowNode::new("write", "csvFileOutput", json!({ "filePath": "clean.csv" })),
//!         ],
//!         vec![FlowEdge::new("read", "rename"), FlowEdge::new("rename", "write")],
//!     );
//!
//!     let compiler = Compiler::builder(ComponentRegistry::with_defaults()).build();
//!
//!     // The whole pipeline.
//!     let script = compiler.compile(&flow)?;
//!     println!("{}", script.source);
//!
//!     // Only what `rename` needs, ending with its output variable.
//!     let preview = compiler.compile_until(&flow, "rename")?;
//!     println!("preview variable: {:?}", preview.output_of("rename"));
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod registry;

#[cfg(feature = "python-bindings")]
mod python;
