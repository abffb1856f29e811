use amphi_codegen::flow::{DOCUMENT_EXTENSION, Flow, FlowDocument, FlowEdge, FlowNode};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};
use std::fs;

/// Generates random, acyclic Amphi pipelines for stress-testing the compiler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Number of dataflow nodes to generate
    #[arg(short, long, default_value_t = 50)]
    nodes: usize,

    /// Seed for reproducible output; a random seed is used when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Add a console logger node
    #[arg(long)]
    logger: bool,

    /// The path to write the generated document to
    #[arg(short, long, default_value = "generated.ampln")]
    output: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if cli.nodes == 0 {
        eprintln!("Error: --nodes must be at least 1");
        std::process::exit(1);
    }
    if !cli.output.ends_with(DOCUMENT_EXTENSION) {
        eprintln!("Warning: '{}' does not use the .{} extension", cli.output, DOCUMENT_EXTENSION);
    }

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let flow = generate_flow(&mut rng, cli.nodes, cli.logger);
    println!(
        "-> Generated {} nodes and {} edges.",
        flow.nodes.len(),
        flow.edges.len()
    );

    let json_output = FlowDocument::new(flow).to_json_pretty()?;
    fs::write(&cli.output, json_output)?;

    println!("Successfully saved pipeline to '{}'", cli.output);
    Ok(())
}

/// Builds a flow where every edge points from an earlier node to a later one,
/// so the result is always acyclic.
fn generate_flow(rng: &mut StdRng, count: usize, logger: bool) -> Flow {
    let mut nodes = Vec::with_capacity(count + 1);
    let mut edges = Vec::new();
    // Nodes that produce a variable and may feed later nodes.
    let mut producers: Vec<String> = Vec::new();

    let inputs = (count / 5).clamp(1, 8).min(count);
    for i in 0..inputs {
        let id = format!("input-{}", i);
        nodes.push(FlowNode::new(
            id.clone(),
            "csvFileInput",
            json!({ "filePath": format!("data/input_{}.csv", i) }),
        ));
        producers.push(id);
    }

    for i in inputs..count {
        let id = format!("node-{}", i);
        let roll = rng.random_range(0..100);

        let (node_type, data, sources): (&str, Value, Vec<String>) = if roll < 15 && producers.len() >= 2 {
            let (left, right) = pick_two(rng, &producers);
            ("join", json!({ "on": "id", "how": "left" }), vec![left, right])
        } else if roll < 25 && producers.len() >= 2 {
            let (first, second) = pick_two(rng, &producers);
            ("concat", json!({}), vec![first, second])
        } else if roll < 35 {
            let source = pick(rng, &producers);
            (
                "csvFileOutput",
                json!({ "filePath": format!("out/result_{}.csv", i) }),
                vec![source],
            )
        } else {
            let source = pick(rng, &producers);
            match rng.random_range(0..3) {
                0 => (
                    "renameColumns",
                    json!({ "columns": { format!("col_{}", i): format!("renamed_{}", i) } }),
                    vec![source],
                ),
                1 => (
                    "filterRows",
                    json!({ "condition": format!("value > {}", rng.random_range(0..1000)) }),
                    vec![source],
                ),
                _ => ("normalizeColumnNames", json!({}), vec![source]),
            }
        };

        for (port, source) in sources.iter().enumerate() {
            let target_handle = format!("in{}", port + 1);
            edges.push(
                FlowEdge::new(source.clone(), id.clone())
                    .with_handles(Some("out"), Some(target_handle.as_str())),
            );
        }
        if node_type != "csvFileOutput" {
            producers.push(id.clone());
        }
        nodes.push(FlowNode::new(id, node_type, data));
    }

    if logger {
        nodes.push(FlowNode::new("logger", "consoleLogger", json!({})));
    }

    Flow::new(nodes, edges)
}

fn pick(rng: &mut StdRng, producers: &[String]) -> String {
    producers[rng.random_range(0..producers.len())].clone()
}

fn pick_two(rng: &mut StdRng, producers: &[String]) -> (String, String) {
    let first = rng.random_range(0..producers.len());
    let mut second = rng.random_range(0..producers.len() - 1);
    if second >= first {
        second += 1;
    }
    (producers[first].clone(), producers[second].clone())
}
