//! Common test utilities for building flows and compilers.
use amphi_codegen::prelude::*;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

/// Timestamp pinned into every script generated by `create_compiler`.
#[allow(dead_code)]
pub fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid date")
}

/// A compiler over the built-in components that also accepts the editor's
/// short `csvInput` / `csvOutput` type names.
#[allow(dead_code)]
pub fn create_compiler() -> Compiler {
    Compiler::builder(ComponentRegistry::with_defaults())
        .timestamp(fixed_timestamp())
        .with_type_mapping("csvInput", "csvFileInput")
        .with_type_mapping("csvOutput", "csvFileOutput")
        .build()
}

/// Linear chain `A -> B -> C`: read a CSV, rename a column, write a CSV.
#[allow(dead_code)]
pub fn create_chain_flow() -> Flow {
    Flow::new(
        vec![
            FlowNode::new("A", "csvInput", json!({ "filePath": "customers.csv" })),
            FlowNode::new("B", "renameColumns", json!({ "columns": { "name": "customer_name" } })),
            FlowNode::new("C", "csvOutput", json!({ "filePath": "out.csv" })),
        ],
        vec![FlowEdge::new("A", "B"), FlowEdge::new("B", "C")],
    )
}

/// Two independent inputs joined by a double processor `D`.
///
/// The edge into port 2 is listed first so port ordering is exercised.
#[allow(dead_code)]
pub fn create_join_flow() -> Flow {
    Flow::new(
        vec![
            FlowNode::new("A", "csvInput", json!({ "filePath": "orders.csv" })),
            FlowNode::new("B", "csvInput", json!({ "filePath": "customers.csv" })),
            FlowNode::new("D", "join", json!({ "on": "customer_id" })),
        ],
        vec![
            FlowEdge::new("B", "D").with_handles(Some("out"), Some("in2")),
            FlowEdge::new("A", "D").with_handles(Some("out"), Some("in1")),
        ],
    )
}

/// The chain flow plus a console logger.
#[allow(dead_code)]
pub fn create_logger_flow() -> Flow {
    let mut flow = create_chain_flow();
    flow.nodes.push(FlowNode::new("L", "consoleLogger", json!({})));
    flow
}

/// A pipeline document as saved by the editor, including canvas state.
#[allow(dead_code)]
pub const SAMPLE_DOCUMENT: &str = r#"{
  "doc_type": "Amphi Pipeline",
  "version": "1",
  "json_version": "1",
  "id": "a41c0e0e",
  "primary": true,
  "pipelines": [
    {
      "id": "primary",
      "flow": {
        "nodes": [
          { "id": "read", "type": "csvFileInput", "position": { "x": 120, "y": 80 }, "data": { "filePath": "data/sales.csv", "sep": ";" } },
          { "id": "note", "type": "annotation", "position": { "x": 40, "y": 10 }, "data": { "content": "Monthly sales cleanup" } },
          { "id": "filter", "type": "filterRows", "position": { "x": 320, "y": 80 }, "data": { "condition": "amount > 0" } },
          { "id": "write", "type": "parquetFileOutput", "position": { "x": 520, "y": 80 }, "data": { "filePath": "out/sales.parquet" } }
        ],
        "edges": [
          { "id": "e-read-filter", "source": "read", "target": "filter", "sourceHandle": "out", "targetHandle": "in" },
          { "id": "e-filter-write", "source": "filter", "target": "write", "sourceHandle": "out", "targetHandle": "in" }
        ],
        "viewport": { "x": 0, "y": 0, "zoom": 1 }
      },
      "app_data": { "ui": {} }
    }
  ]
}"#;

/// Template components as they would be shipped in a manifest file.
#[allow(dead_code)]
pub const SAMPLE_MANIFEST: &str = r#"[
  {
    "id": "dropDuplicates",
    "category": "pandas_df_processor",
    "imports": ["import pandas as pd"],
    "template": "{output} = {input}.drop_duplicates()\n"
  },
  {
    "id": "sampleRows",
    "category": "processor",
    "imports": ["import pandas as pd", "import numpy as np"],
    "dependencies": ["numpy"],
    "template": "{output} = {input}.sample(n={config.rows|10}, random_state=np.random.RandomState(42))\n"
  }
]"#;

/// Position of `id` in `order`, panicking if it is absent.
#[allow(dead_code)]
pub fn position(order: &[String], id: &str) -> usize {
    order
        .iter()
        .position(|n| n == id)
        .unwrap_or_else(|| panic!("'{}' was not emitted", id))
}
