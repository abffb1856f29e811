//! Graph helpers shared by the compiler and the editor host.
//!
//! Predecessor lookups feed the variable binder; extension mapping and
//! deletion reconnection back the editor's drag-and-drop and delete actions.

use super::definition::{FlowEdge, FlowNode};
use itertools::Itertools;
use serde_json::json;
use std::path::Path;

/// Default input component for each file extension accepted by drag-and-drop.
const EXTENSION_COMPONENTS: &[(&str, &str)] = &[
    ("csv", "csvFileInput"),
    ("tsv", "csvFileInput"),
    ("parquet", "parquetFileInput"),
    ("json", "jsonFileInput"),
    ("jsonl", "jsonFileInput"),
    ("xlsx", "excelFileInput"),
    ("xls", "excelFileInput"),
    ("xml", "xmlFileInput"),
];

/// Source of the first edge terminating at `node_id`.
pub fn find_previous_node_id<'a>(node_id: &str, edges: &'a [FlowEdge]) -> Option<&'a str> {
    edges
        .iter()
        .find(|e| e.target == node_id)
        .map(|e| e.source.as_str())
}

/// Distinct sources feeding `node_id`, ordered by target port.
///
/// Edges with an indexed handle come first, by index; the rest keep their
/// relative edge order.
pub fn find_multiple_previous_node_ids<'a, I>(node_id: &str, edges: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a FlowEdge>,
{
    edges
        .into_iter()
        .filter(|e| e.target == node_id)
        .sorted_by_key(|e| match e.target_port() {
            Some(port) => (0, port),
            None => (1, 0),
        })
        .map(|e| e.source.as_str())
        .unique()
        .collect()
}

/// Sources feeding each input port of `node_id`, ordered like
/// [`find_multiple_previous_node_ids`].
///
/// Only exact duplicate connections (same source, same target handle) are
/// merged, so one node wired into two ports appears twice.
pub fn find_input_node_ids<'a, I>(node_id: &str, edges: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a FlowEdge>,
{
    edges
        .into_iter()
        .filter(|e| e.target == node_id)
        .sorted_by_key(|e| match e.target_port() {
            Some(port) => (0, port),
            None => (1, 0),
        })
        .unique_by(|e| (e.source.as_str(), e.target_handle.as_deref()))
        .map(|e| e.source.as_str())
        .collect()
}

/// Default component type for a file extension (case-insensitive, leading dot allowed).
pub fn component_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    EXTENSION_COMPONENTS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, component)| *component)
}

pub fn component_for_path(path: impl AsRef<Path>) -> Option<&'static str> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(component_for_extension)
}

impl FlowNode {
    /// Builds the node created when a file is dropped on the canvas.
    pub fn for_dropped_file(id: impl Into<String>, path: &str) -> Option<Self> {
        let component = component_for_path(path)?;
        Some(Self::new(id, component, json!({ "filePath": path })))
    }
}

/// Removes every edge touching `deleted` and reconnects each former
/// predecessor directly to each former successor.
///
/// Synthesized edges keep the predecessor's source handle and the successor's
/// target handle. Connections that already exist are not duplicated and
/// self-loops are never created, so applying the operation twice yields the
/// same edge list. Deleting a node that is not in `nodes` changes nothing.
///
/// A connection is identified by its nodes and both handles: one node may
/// feed several ports of a successor, and each port keeps its own edge. A
/// bridge whose id is already taken by another edge gets a numeric suffix.
pub fn reconnect_on_delete(deleted: &str, nodes: &[FlowNode], edges: &[FlowEdge]) -> Vec<FlowEdge> {
    if !nodes.iter().any(|n| n.id == deleted) {
        return edges.to_vec();
    }

    let (touching, mut kept): (Vec<&FlowEdge>, Vec<FlowEdge>) = edges
        .iter()
        .partition_map(|e| {
            if e.source == deleted || e.target == deleted {
                itertools::Either::Left(e)
            } else {
                itertools::Either::Right(e.clone())
            }
        });

    let incoming = touching.iter().filter(|e| e.target == deleted && e.source != deleted);
    let outgoing: Vec<&&FlowEdge> = touching
        .iter()
        .filter(|e| e.source == deleted && e.target != deleted)
        .collect();

    for (before, after) in incoming.cartesian_product(outgoing) {
        if before.source == after.target {
            continue;
        }
        let bridge = FlowEdge::new(before.source.clone(), after.target.clone()).with_handles(
            before.source_handle.as_deref(),
            after.target_handle.as_deref(),
        );
        if kept.iter().any(|e| e.same_connection(&bridge)) {
            continue;
        }
        let bridge = with_unique_id(bridge, &kept);
        kept.push(bridge);
    }
    kept
}

fn with_unique_id(mut edge: FlowEdge, edges: &[FlowEdge]) -> FlowEdge {
    let taken = |id: &str| edges.iter().any(|e| e.id == id);
    if taken(&edge.id) {
        let base = std::mem::take(&mut edge.id);
        edge.id = (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|id| !taken(id))
            .unwrap_or(base);
    }
    edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn node(id: &str) -> FlowNode {
        FlowNode::new(id, "renameColumns", Value::Null)
    }

    #[test]
    fn test_find_previous_node_id() {
        let edges = vec![FlowEdge::new("a", "b"), FlowEdge::new("b", "c")];
        assert_eq!(find_previous_node_id("c", &edges), Some("b"));
        assert_eq!(find_previous_node_id("a", &edges), None);
    }

    #[test]
    fn test_multiple_previous_ordered_by_port() {
        let edges = vec![
            FlowEdge::new("right", "join").with_handles(None, Some("in2")),
            FlowEdge::new("left", "join").with_handles(None, Some("in1")),
            FlowEdge::new("left", "join").with_handles(None, Some("in1")),
        ];
        assert_eq!(find_multiple_previous_node_ids("join", &edges), vec!["left", "right"]);
    }

    #[test]
    fn test_input_ids_keep_one_entry_per_port() {
        let edges = vec![
            FlowEdge::new("a", "join").with_handles(None, Some("in2")),
            FlowEdge::new("a", "join").with_handles(None, Some("in1")),
            FlowEdge::new("a", "join").with_handles(None, Some("in1")),
        ];
        assert_eq!(find_input_node_ids("join", &edges), vec!["a", "a"]);
        assert_eq!(find_multiple_previous_node_ids("join", &edges), vec!["a"]);
    }

    #[test]
    fn test_unindexed_handles_keep_edge_order() {
        let edges = vec![
            FlowEdge::new("b", "concat"),
            FlowEdge::new("c", "concat").with_handles(None, Some("input-0")),
            FlowEdge::new("a", "concat"),
        ];
        assert_eq!(find_multiple_previous_node_ids("concat", &edges), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_component_for_extension() {
        assert_eq!(component_for_extension("CSV"), Some("csvFileInput"));
        assert_eq!(component_for_extension(".parquet"), Some("parquetFileInput"));
        assert_eq!(component_for_extension("docx"), None);
        assert_eq!(component_for_path("data/sales.xlsx"), Some("excelFileInput"));
        assert_eq!(component_for_path("README"), None);

        let dropped = FlowNode::for_dropped_file("n1", "data/sales.tsv").unwrap();
        assert_eq!(dropped.node_type, "csvFileInput");
        assert_eq!(dropped.data["filePath"], "data/sales.tsv");
    }

    #[test]
    fn test_reconnect_on_delete_cross_product() {
        let nodes = vec![node("a"), node("b"), node("x"), node("c"), node("d")];
        let edges = vec![
            FlowEdge::new("a", "x").with_handles(Some("out"), Some("in1")),
            FlowEdge::new("b", "x").with_handles(Some("out"), Some("in2")),
            FlowEdge::new("x", "c").with_handles(Some("out"), Some("in")),
            FlowEdge::new("x", "d").with_handles(Some("out"), Some("in")),
        ];
        let revised = reconnect_on_delete("x", &nodes, &edges);
        let pairs: Vec<(&str, &str)> = revised
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "c"), ("a", "d"), ("b", "c"), ("b", "d")]);
        assert!(revised.iter().all(|e| e.target_handle.as_deref() == Some("in")));
    }

    #[test]
    fn test_reconnect_on_delete_is_idempotent() {
        let nodes = vec![node("a"), node("x"), node("c")];
        let edges = vec![FlowEdge::new("a", "x"), FlowEdge::new("x", "c"), FlowEdge::new("a", "c")];
        let once = reconnect_on_delete("x", &nodes, &edges);
        assert_eq!(once.len(), 1);
        assert_eq!(reconnect_on_delete("x", &nodes, &once), once);
    }

    #[test]
    fn test_bridge_ids_never_collide() {
        let nodes = vec![node("a"), node("x"), node("c")];
        let mut clash = FlowEdge::new("a", "c").with_handles(Some("out"), Some("in2"));
        clash.id = "reactflow__edge-aout-cin1".to_string();
        let edges = vec![
            clash,
            FlowEdge::new("a", "x").with_handles(Some("out"), Some("in")),
            FlowEdge::new("x", "c").with_handles(Some("out"), Some("in1")),
        ];
        let revised = reconnect_on_delete("x", &nodes, &edges);
        assert_eq!(revised.len(), 2);
        assert_eq!(revised[1].target_handle.as_deref(), Some("in1"));
        assert_eq!(revised[1].id, "reactflow__edge-aout-cin1-1");
        assert!(revised.iter().map(|e| &e.id).all_unique());
    }

    #[test]
    fn test_handles_are_part_of_the_edge_id() {
        let in1 = FlowEdge::new("a", "join").with_handles(None, Some("in1"));
        let in2 = FlowEdge::new("a", "join").with_handles(None, Some("in2"));
        assert_eq!(in1.id, "reactflow__edge-a-joinin1");
        assert_ne!(in1.id, in2.id);
        assert_eq!(FlowEdge::new("a", "join").id, "reactflow__edge-a-join");
    }

    #[test]
    fn test_reconnect_on_delete_unknown_node() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![FlowEdge::new("a", "b")];
        assert_eq!(reconnect_on_delete("zzz", &nodes, &edges), edges);
    }
}
