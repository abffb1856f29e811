use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node type used by the editor for free-floating notes on the canvas.
pub const ANNOTATION_TYPE: &str = "annotation";

/// The canonical definition of a pipeline flow, ready for compilation.
/// This is the target structure for any document conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    /// Editor-only fields such as the viewport.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single component instance placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: String,
    /// Registry key of the component this node instantiates.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Component configuration as edited in the node's form.
    #[serde(default)]
    pub data: Value,
    /// Editor-only fields (position, size, selection state) kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed dataflow connection: the source's output feeds the target's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(
        rename = "sourceHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source_handle: Option<String>,
    #[serde(
        rename = "targetHandle",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Flow {
    pub fn new(nodes: Vec<FlowNode>, edges: Vec<FlowEdge>) -> Self {
        Self {
            nodes,
            edges,
            extra: Map::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Merges `patch` into the configuration of node `id`, the way form edits do.
    /// Returns `false` if the node does not exist.
    pub fn merge_node_data(&mut self, id: &str, patch: Map<String, Value>) -> bool {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if !node.data.is_object() {
            node.data = Value::Object(Map::new());
        }
        if let Value::Object(data) = &mut node.data {
            data.extend(patch);
        }
        true
    }
}

impl FlowNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data,
            extra: Map::new(),
        }
    }

    pub fn is_annotation(&self) -> bool {
        self.node_type == ANNOTATION_TYPE
    }
}

impl FlowEdge {
    /// Creates an edge with the editor's default id scheme.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("reactflow__edge-{}-{}", source, target),
            source,
            target,
            source_handle: None,
            target_handle: None,
            extra: Map::new(),
        }
    }

    /// Sets both handles and re-derives the id from them, so edges between
    /// different ports of the same two nodes get different ids.
    pub fn with_handles(mut self, source_handle: Option<&str>, target_handle: Option<&str>) -> Self {
        self.id = format!(
            "reactflow__edge-{}{}-{}{}",
            self.source,
            source_handle.unwrap_or_default(),
            self.target,
            target_handle.unwrap_or_default()
        );
        self.source_handle = source_handle.map(str::to_string);
        self.target_handle = target_handle.map(str::to_string);
        self
    }

    /// Port index on the target side, taken from the handle's trailing digits.
    pub fn target_port(&self) -> Option<u32> {
        self.target_handle.as_deref().and_then(port_index)
    }

    /// True if both edges connect the same ports of the same nodes.
    pub fn same_connection(&self, other: &FlowEdge) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.source_handle == other.source_handle
            && self.target_handle == other.target_handle
    }
}

/// Parses the trailing integer of a handle id: `"input-1"` -> 1, `"in2"` -> 2.
pub fn port_index(handle: &str) -> Option<u32> {
    let prefix_len = handle.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    handle[prefix_len..].parse().ok()
}
