use crate::error::CompileError;
use crate::flow::{Flow, FlowNode};
use crate::registry::{
    CodegenContext, ComponentCategory, ComponentDescriptor, ComponentRegistry, Inputs,
};
use ahash::{AHashMap, AHashSet};
use chrono::{Local, NaiveDateTime};

pub mod artifact;
pub mod assembler;
pub mod binding;
pub mod graph;

pub use artifact::{CompiledPipeline, OutputBinding};
pub use graph::{DependencyGraph, MissingNodePolicy, ResolvedOrder};

use assembler::{CodeAssembler, Requirements, push_block};
use binding::VariableBinder;

/// Target id the editor sends when the whole pipeline should be compiled.
pub const NO_TARGET: &str = "none";

/// Name written in the first header line of generated scripts.
pub const DEFAULT_TOOL_NAME: &str = "Amphi";

/// Settings that shape the generated script.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    pub tool_name: String,
    /// Fixed header timestamp; the local clock is read when `None`.
    pub timestamp: Option<NaiveDateTime>,
    pub missing_nodes: MissingNodePolicy,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            timestamp: None,
            missing_nodes: MissingNodePolicy::default(),
        }
    }
}

/// Compiles flows into Python scripts.
///
/// A `Compiler` holds no per-compilation state: every call to `compile`
/// starts with fresh counters and bindings, so one instance can be shared
/// across threads and called repeatedly.
#[derive(Debug)]
pub struct Compiler {
    registry: ComponentRegistry,
    options: CompilerOptions,
}

pub struct CompilerBuilder {
    registry: ComponentRegistry,
    options: CompilerOptions,
}

/// Mutable state of a single compilation run.
#[derive(Default)]
struct CompilationContext {
    binder: VariableBinder,
    requirements: Requirements,
    warnings: Vec<String>,
}

/// A node together with the component that generates its code.
struct ResolvedNode<'f, 'r> {
    node: &'f FlowNode,
    component: &'r dyn ComponentDescriptor,
}

impl CompilerBuilder {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            options: CompilerOptions::default(),
        }
    }

    pub fn tool_name(mut self, name: &str) -> Self {
        self.options.tool_name = name.to_string();
        self
    }

    /// Pins the header timestamp, making the output fully reproducible.
    pub fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.options.timestamp = Some(timestamp);
        self
    }

    pub fn missing_nodes(mut self, policy: MissingNodePolicy) -> Self {
        self.options.missing_nodes = policy;
        self
    }

    /// Lets nodes of type `user_type_name` compile with an existing component.
    pub fn with_type_mapping(mut self, user_type_name: &str, component_id: &str) -> Self {
        if let Err(e) = self.registry.alias(user_type_name, component_id) {
            tracing::warn!("ignoring type mapping: {}", e);
        }
        self
    }

    pub fn with_component(mut self, component: Box<dyn ComponentDescriptor>) -> Self {
        self.registry.register(component);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            registry: self.registry,
            options: self.options,
        }
    }
}

impl Compiler {
    pub fn builder(registry: ComponentRegistry) -> CompilerBuilder {
        CompilerBuilder::new(registry)
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compiles the whole flow.
    pub fn compile(&self, flow: &Flow) -> Result<CompiledPipeline, CompileError> {
        self.compile_target(flow, None)
    }

    /// Compiles only what `target` needs and ends the script with the target's
    /// output variable. `"none"` compiles the whole flow.
    pub fn compile_until(&self, flow: &Flow, target: &str) -> Result<CompiledPipeline, CompileError> {
        if target == NO_TARGET {
            self.compile_target(flow, None)
        } else {
            self.compile_target(flow, Some(target))
        }
    }

    fn compile_target(&self, flow: &Flow, target: Option<&str>) -> Result<CompiledPipeline, CompileError> {
        let resolved = self.resolve_components(flow)?;
        let dataflow: AHashSet<&str> = resolved
            .iter()
            .filter(|(_, r)| r.component.category().is_dataflow())
            .map(|(id, _)| *id)
            .collect();

        let mut ctx = CompilationContext::default();
        let graph = DependencyGraph::build(flow, &dataflow, self.options.missing_nodes, &mut ctx.warnings)?;
        let sorted = graph.topological_sort()?;

        let order = match target {
            None => sorted.sorted().to_vec(),
            Some(target) => {
                let target = self.check_target(flow, &dataflow, target)?;
                sorted.restrict_to(&graph, target)
            }
        };

        let mut body = String::new();
        let mut observe = None;
        for &node_id in &order {
            let Some(entry) = resolved.get(node_id) else {
                continue;
            };
            let code = self.emit_node(entry, graph.inputs(node_id), &mut ctx)?;
            push_block(&mut body, &code);

            if target == Some(node_id) {
                observe = ctx.binder.output_of(node_id).map(str::to_string);
                break;
            }
        }

        let logger_code = self.emit_loggers(flow, &resolved, &mut ctx)?;

        let timestamp = self
            .options
            .timestamp
            .unwrap_or_else(|| Local::now().naive_local());
        let source = CodeAssembler::new(&self.options.tool_name, timestamp).assemble(
            &ctx.requirements,
            &body,
            logger_code.as_deref(),
            observe.as_deref(),
        );

        tracing::info!(
            nodes = order.len(),
            until = target.unwrap_or(NO_TARGET),
            "compiled pipeline"
        );

        Ok(CompiledPipeline {
            source,
            order: order.iter().map(|id| id.to_string()).collect(),
            dependencies: ctx.requirements.dependencies().into_iter().map(str::to_string).collect(),
            bindings: ctx.binder.into_bindings(),
            warnings: ctx.warnings,
        })
    }

    /// Looks up the component of every non-annotation node.
    fn resolve_components<'f>(
        &'f self,
        flow: &'f Flow,
    ) -> Result<AHashMap<&'f str, ResolvedNode<'f, 'f>>, CompileError> {
        let mut resolved = AHashMap::with_capacity(flow.nodes.len());
        for node in flow.nodes.iter().filter(|n| !n.is_annotation()) {
            let component = self.registry.get(&node.node_type).ok_or_else(|| {
                CompileError::UnsupportedComponentType {
                    node_id: node.id.clone(),
                    type_name: node.node_type.clone(),
                }
            })?;
            if component.category() == ComponentCategory::Annotation {
                continue;
            }
            resolved.insert(node.id.as_str(), ResolvedNode { node, component });
        }
        Ok(resolved)
    }

    fn check_target<'f>(
        &self,
        flow: &'f Flow,
        dataflow: &AHashSet<&str>,
        target: &str,
    ) -> Result<&'f str, CompileError> {
        let node = flow.node(target).ok_or_else(|| CompileError::MissingNode {
            node_id: target.to_string(),
            referenced_by: "compile target".to_string(),
        })?;
        if !dataflow.contains(node.id.as_str()) {
            return Err(CompileError::ConnectionError {
                node_id: node.id.clone(),
                message: format!("'{}' nodes cannot be a compile target", node.node_type),
            });
        }
        Ok(node.id.as_str())
    }

    fn emit_node(
        &self,
        entry: &ResolvedNode<'_, '_>,
        predecessors: &[&str],
        ctx: &mut CompilationContext,
    ) -> Result<String, CompileError> {
        let ResolvedNode { node, component } = entry;
        let category = component.category();

        let inputs = ctx.binder.resolve_inputs(&node.id, category, predecessors)?;
        let output = category
            .produces_output()
            .then(|| ctx.binder.allocate(&node.id, component.id()));

        ctx.requirements.collect(*component, &node.data);
        let code = self.generate(node, *component, inputs, output.as_deref())?;

        tracing::debug!(
            node = %node.id,
            component = component.id(),
            output = output.as_deref().unwrap_or("-"),
            "emitted node"
        );
        Ok(code)
    }

    /// Generates the code of every logger node, in document order.
    /// Returns `None` when the flow has no loggers.
    fn emit_loggers(
        &self,
        flow: &Flow,
        resolved: &AHashMap<&str, ResolvedNode<'_, '_>>,
        ctx: &mut CompilationContext,
    ) -> Result<Option<String>, CompileError> {
        let mut code = String::new();
        let mut found = false;
        for node in &flow.nodes {
            let Some(entry) = resolved.get(node.id.as_str()) else {
                continue;
            };
            if entry.component.category() != ComponentCategory::Logger {
                continue;
            }
            found = true;
            ctx.requirements.collect(entry.component, &node.data);
            let logger = self.generate(node, entry.component, Inputs::None, None)?;
            push_block(&mut code, &logger);
        }
        Ok(found.then_some(code))
    }

    fn generate(
        &self,
        node: &FlowNode,
        component: &dyn ComponentDescriptor,
        inputs: Inputs,
        output: Option<&str>,
    ) -> Result<String, CompileError> {
        let context = CodegenContext {
            node_id: &node.id,
            config: &node.data,
            inputs,
            output,
        };
        component
            .generate(&context)
            .map_err(|source| CompileError::ComponentCodeGeneration {
                node_id: node.id.clone(),
                type_name: node.node_type.clone(),
                source,
            })
    }
}
