//! Tests for the compilation process: ordering, variable binding and code emission.
mod common;
use amphi_codegen::prelude::*;
use common::*;
use serde_json::{Value, json};

const CHAIN_SCRIPT: &str = "# Source code generated by Amphi
# Date: 2024-05-17 09:30:00
# Additional dependencies: \nimport pandas as pd

# Read CSV file
csvFileInput1 = pd.read_csv(\"customers.csv\", sep=\",\")
# Rename columns
renameColumns1 = csvFileInput1.rename(columns={\"name\": \"customer_name\"})
# Write CSV file
renameColumns1.to_csv(\"out.csv\", sep=\",\", index=False)
";

#[test]
fn test_compiler_builds_linear_chain() {
    let compiler = create_compiler();
    let compiled = compiler.compile(&create_chain_flow()).expect("Failed to compile");

    assert_eq!(compiled.source, CHAIN_SCRIPT);
    assert_eq!(compiled.order, vec!["A", "B", "C"]);
    assert_eq!(compiled.output_of("A"), Some("csvFileInput1"));
    assert_eq!(compiled.output_of("B"), Some("renameColumns1"));
    assert_eq!(compiled.output_of("C"), None);
    assert!(!compiled.source.contains("try:"));
}

#[test]
fn test_double_processor_receives_both_inputs() {
    let compiler = create_compiler();
    let compiled = compiler.compile(&create_join_flow()).expect("Failed to compile");

    let d = position(&compiled.order, "D");
    assert!(position(&compiled.order, "A") < d);
    assert!(position(&compiled.order, "B") < d);
    assert!(compiled.source.contains(
        "join1 = pd.merge(csvFileInput1, csvFileInput2, how=\"inner\", on=\"customer_id\")"
    ));
}

#[test]
fn test_double_processor_inputs_follow_port_order() {
    let mut flow = create_join_flow();
    // A now feeds the second port, B the first.
    flow.edges = vec![
        FlowEdge::new("A", "D").with_handles(Some("out"), Some("in2")),
        FlowEdge::new("B", "D").with_handles(Some("out"), Some("in1")),
    ];
    let compiled = create_compiler().compile(&flow).expect("Failed to compile");
    assert!(compiled.source.contains("pd.merge(csvFileInput2, csvFileInput1,"));
}

#[test]
fn test_one_node_can_feed_both_ports_of_a_join() {
    let flow = Flow::new(
        vec![
            FlowNode::new("A", "csvInput", json!({ "filePath": "orders.csv" })),
            FlowNode::new("D", "join", json!({ "on": "order_id" })),
        ],
        vec![
            FlowEdge::new("A", "D").with_handles(Some("out"), Some("in1")),
            FlowEdge::new("A", "D").with_handles(Some("out"), Some("in2")),
        ],
    );
    let compiled = create_compiler().compile(&flow).expect("Failed to compile self-join");

    assert_eq!(compiled.order, vec!["A", "D"]);
    assert!(compiled.source.contains(
        "join1 = pd.merge(csvFileInput1, csvFileInput1, how=\"inner\", on=\"order_id\")"
    ));
}

#[test]
fn test_long_chain_in_reverse_document_order() {
    const LENGTH: usize = 100_000;
    let mut nodes = vec![FlowNode::new("n0", "csvInput", json!({ "filePath": "in.csv" }))];
    nodes.extend((1..LENGTH).map(|i| {
        FlowNode::new(format!("n{}", i), "renameColumns", json!({ "columns": { "a": "b" } }))
    }));
    nodes.reverse();
    let edges = (1..LENGTH)
        .map(|i| FlowEdge::new(format!("n{}", i - 1), format!("n{}", i)))
        .collect();

    let compiled = create_compiler()
        .compile(&Flow::new(nodes, edges))
        .expect("Failed to compile long chain");

    assert_eq!(compiled.order.len(), LENGTH);
    assert_eq!(compiled.order[0], "n0");
    assert_eq!(compiled.order[LENGTH - 1], format!("n{}", LENGTH - 1));
    assert_eq!(compiled.output_of("n99999"), Some("renameColumns99999"));
}

#[test]
fn test_partial_compile_stops_at_target() {
    let compiler = create_compiler();
    let compiled = compiler
        .compile_until(&create_chain_flow(), "B")
        .expect("Failed to compile");

    assert_eq!(compiled.order, vec!["A", "B"]);
    assert!(!compiled.source.contains("to_csv"));
    assert!(compiled.source.ends_with("\nrenameColumns1\n"));
}

#[test]
fn test_partial_compile_on_input_node() {
    let compiled = create_compiler()
        .compile_until(&create_join_flow(), "B")
        .expect("Failed to compile");

    // Only B is needed, so it is the first csv input of this compilation.
    assert_eq!(compiled.order, vec!["B"]);
    assert!(compiled.source.ends_with("\ncsvFileInput1\n"));
    assert!(!compiled.source.contains("orders.csv"));
}

#[test]
fn test_compiler_with_type_mapping() {
    let mut flow = create_chain_flow();
    flow.nodes[1].node_type = "MyRename".to_string();

    let compiler = Compiler::builder(ComponentRegistry::with_defaults())
        .with_type_mapping("csvInput", "csvFileInput")
        .with_type_mapping("csvOutput", "csvFileOutput")
        .with_type_mapping("MyRename", "renameColumns")
        .build();

    let result = compiler.compile(&flow);
    assert!(result.is_ok(), "Compilation should succeed with type mapping");
    assert_eq!(result.unwrap().output_of("B"), Some("renameColumns1"));
}

#[test]
fn test_compiler_fails_on_unregistered_type() {
    let mut flow = create_chain_flow();
    flow.nodes[1].node_type = "UnknownOperation".to_string();

    let result = create_compiler().compile(&flow);
    match result.err().unwrap() {
        CompileError::UnsupportedComponentType { node_id, type_name } => {
            assert_eq!(node_id, "B");
            assert_eq!(type_name, "UnknownOperation");
        }
        other => panic!("Expected UnsupportedComponentType error, got {:?}", other),
    }
}

#[test]
fn test_component_failure_names_the_node() {
    let mut flow = create_chain_flow();
    flow.nodes[1].data = json!({});

    match create_compiler().compile(&flow).err().unwrap() {
        CompileError::ComponentCodeGeneration {
            node_id,
            type_name,
            source,
        } => {
            assert_eq!(node_id, "B");
            assert_eq!(type_name, "renameColumns");
            assert_eq!(source, ComponentError::MissingConfig("columns".to_string()));
        }
        other => panic!("Expected ComponentCodeGeneration error, got {:?}", other),
    }
}

#[test]
fn test_cycle_is_rejected() {
    let mut flow = create_chain_flow();
    flow.nodes[2] = FlowNode::new("C", "renameColumns", json!({ "columns": {} }));
    flow.edges.push(FlowEdge::new("C", "B"));

    match create_compiler().compile(&flow) {
        Err(CompileError::CyclicGraph { cycle }) => {
            assert!(cycle.contains(&"B".to_string()));
            assert!(cycle.contains(&"C".to_string()));
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("Expected CyclicGraph error, got {:?}", other),
    }
}

#[test]
fn test_processor_with_two_inputs_is_rejected() {
    let mut flow = create_join_flow();
    flow.nodes[2] = FlowNode::new("D", "renameColumns", json!({ "columns": {} }));

    let err = create_compiler().compile(&flow).unwrap_err();
    assert!(matches!(err, CompileError::ConnectionError { ref node_id, .. } if node_id == "D"));
}

#[test]
fn test_double_processor_with_one_input_is_rejected() {
    let mut flow = create_join_flow();
    flow.edges.remove(0);

    let err = create_compiler().compile(&flow).unwrap_err();
    assert!(matches!(err, CompileError::ConnectionError { ref node_id, .. } if node_id == "D"));
}

#[test]
fn test_unknown_target_is_missing_node() {
    let err = create_compiler()
        .compile_until(&create_chain_flow(), "Z")
        .unwrap_err();
    assert!(matches!(err, CompileError::MissingNode { ref node_id, .. } if node_id == "Z"));
}

#[test]
fn test_dangling_edges_are_skipped_with_warning() {
    let mut flow = create_chain_flow();
    flow.edges.push(FlowEdge::new("B", "ghost"));

    let compiled = create_compiler().compile(&flow).expect("Failed to compile");
    assert_eq!(compiled.order, vec!["A", "B", "C"]);
    assert_eq!(compiled.warnings.len(), 1);
    assert!(compiled.warnings[0].contains("ghost"));
}

#[test]
fn test_dangling_edges_fail_in_strict_mode() {
    let mut flow = create_chain_flow();
    flow.edges.push(FlowEdge::new("ghost", "B"));

    let compiler = Compiler::builder(ComponentRegistry::with_defaults())
        .with_type_mapping("csvInput", "csvFileInput")
        .with_type_mapping("csvOutput", "csvFileOutput")
        .missing_nodes(MissingNodePolicy::Fail)
        .build();
    let err = compiler.compile(&flow).unwrap_err();
    assert!(matches!(err, CompileError::MissingNode { ref node_id, ref referenced_by } if node_id == "ghost" && referenced_by == "B"));
}

#[test]
fn test_annotations_are_ignored() {
    let mut flow = create_chain_flow();
    flow.nodes.push(FlowNode::new("note", "annotation", json!({ "content": "hello" })));
    flow.edges.push(FlowEdge::new("note", "B"));

    let compiled = create_compiler().compile(&flow).expect("Failed to compile");
    assert_eq!(compiled.source, CHAIN_SCRIPT);
}

#[test]
fn test_empty_flow_compiles_to_header_only() {
    let compiled = create_compiler().compile(&Flow::default()).expect("Failed to compile");
    assert!(compiled.order.is_empty());
    assert!(compiled.source.starts_with("# Source code generated by Amphi\n"));
    assert!(compiled.source.ends_with("# Additional dependencies: \n\n"));
}

/// Selects a fixed list of columns; pulls in duckdb only when asked to.
struct SelectColumns;

impl ComponentDescriptor for SelectColumns {
    fn id(&self) -> &str {
        "selectColumns"
    }

    fn category(&self) -> ComponentCategory {
        ComponentCategory::Processor
    }

    fn imports(&self, config: &Value) -> Vec<String> {
        let mut imports = vec!["import pandas as pd".to_string()];
        if config.get("engine").and_then(Value::as_str) == Some("duckdb") {
            imports.push("import duckdb".to_string());
        }
        imports
    }

    fn generate(&self, ctx: &CodegenContext<'_>) -> std::result::Result<String, ComponentError> {
        let columns = ctx
            .config
            .get("columns")
            .and_then(Value::as_array)
            .ok_or_else(|| ComponentError::MissingConfig("columns".to_string()))?;
        let Inputs::Single(input) = &ctx.inputs else {
            return Err(ComponentError::Custom("expects exactly one input".to_string()));
        };
        let output = ctx
            .output
            .ok_or_else(|| ComponentError::Custom("no output variable".to_string()))?;
        let names: Vec<String> = columns
            .iter()
            .filter_map(Value::as_str)
            .map(|c| format!("\"{}\"", c))
            .collect();
        Ok(format!("{} = {}[[{}]]", output, input, names.join(", ")))
    }
}

#[test]
fn test_custom_component_descriptor() {
    let mut flow = create_chain_flow();
    flow.nodes[1] = FlowNode::new("B", "selectColumns", json!({ "columns": ["id", "name"], "engine": "duckdb" }));

    let compiler = Compiler::builder(ComponentRegistry::with_defaults())
        .with_type_mapping("csvInput", "csvFileInput")
        .with_type_mapping("csvOutput", "csvFileOutput")
        .with_component(Box::new(SelectColumns))
        .build();
    let compiled = compiler.compile(&flow).expect("Failed to compile");

    assert!(compiled.source.contains("selectColumns1 = csvFileInput1[[\"id\", \"name\"]]\n"));
    assert!(compiled.source.contains("import pandas as pd\nimport duckdb\n"));
    assert!(compiled.source.contains("selectColumns1.to_csv("));
}
