use amphi_codegen::prelude::*;
use clap::{Parser, Subcommand};
use std::fs;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Compiles Amphi pipeline flows into Python scripts
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a flow (.ampln document or bare flow JSON) into a Python script
    Compile {
        /// Path to the flow file
        flow_path: String,

        /// Stop at this node and end the script with its output variable
        #[arg(short, long)]
        until: Option<String>,

        /// JSON manifest with additional template components
        #[arg(short, long)]
        components: Option<String>,

        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Also save the compiled artifact (bincode) to this file
        #[arg(long)]
        artifact: Option<String>,

        /// Fail on edges that reference unknown nodes instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Delete a node and print the reconnected edge list as JSON
    DeleteNode {
        /// Path to the flow file
        flow_path: String,
        /// Id of the node to delete
        node_id: String,
    },

    /// List the registered components
    Components {
        /// JSON manifest with additional template components
        #[arg(short, long)]
        components: Option<String>,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Compile {
            flow_path,
            until,
            components,
            output,
            artifact,
            strict,
        } => run_compile(CompileArgs {
            flow_path,
            until,
            components,
            output,
            artifact,
            strict,
        }),
        Command::DeleteNode { flow_path, node_id } => run_delete_node(&flow_path, &node_id),
        Command::Components { components } => run_components(components.as_deref()),
    }
}

struct CompileArgs {
    flow_path: String,
    until: Option<String>,
    components: Option<String>,
    output: Option<String>,
    artifact: Option<String>,
    strict: bool,
}

fn run_compile(args: CompileArgs) {
    let total_start = Instant::now();

    // --- 1. Loading ---
    let flow = load_flow(&args.flow_path).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let registry = load_registry(args.components.as_deref());
    tracing::info!(
        nodes = flow.nodes.len(),
        edges = flow.edges.len(),
        components = registry.len(),
        "loaded flow '{}'",
        args.flow_path
    );

    // --- 2. Compilation ---
    let policy = if args.strict {
        MissingNodePolicy::Fail
    } else {
        MissingNodePolicy::Skip
    };
    let compiler = Compiler::builder(registry).missing_nodes(policy).build();

    let compile_start = Instant::now();
    let target = args.until.as_deref().unwrap_or(NO_TARGET);
    let compiled = compiler
        .compile_until(&flow, target)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    for warning in &compiled.warnings {
        eprintln!("warning: {}", warning);
    }

    // --- 3. Output ---
    match &args.output {
        Some(path) => fs::write(path, &compiled.source).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to write script to '{}': {}", path, e))
        }),
        None => print!("{}", compiled.source),
    }

    if let Some(path) = &args.artifact {
        compiled
            .save(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save artifact: {}", e)));
    }

    tracing::info!(
        emitted = compiled.order.len(),
        dependencies = compiled.dependencies.len(),
        "compiled in {:?} (total {:?})",
        compile_duration,
        total_start.elapsed()
    );
}

fn run_delete_node(flow_path: &str, node_id: &str) {
    let flow = load_flow(flow_path).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    if flow.node(node_id).is_none() {
        tracing::warn!("node '{}' is not part of the flow, edges are unchanged", node_id);
    }

    let edges = reconnect_on_delete(node_id, &flow.nodes, &flow.edges);
    let json = serde_json::to_string_pretty(&edges)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize edges: {}", e)));
    println!("{}", json);
}

fn run_components(manifest_path: Option<&str>) {
    let registry = load_registry(manifest_path);
    for component in registry.components() {
        println!("{:<24} {}", component.id(), component.category());
    }
}

fn load_registry(manifest_path: Option<&str>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::with_defaults();
    if let Some(path) = manifest_path {
        let manifest = fs::read_to_string(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read component manifest '{}': {}", path, e))
        });
        let added = registry
            .load_manifest(&manifest)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        tracing::debug!("registered {} components from '{}'", added, path);
    }
    registry
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
