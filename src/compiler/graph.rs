//! Dependency resolution: which nodes feed which, in what order they are
//! emitted, and which subset a partial compile needs.

use crate::error::CompileError;
use crate::flow::{Flow, FlowEdge, find_input_node_ids, find_multiple_previous_node_ids};
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// What to do with an edge whose endpoint is not in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingNodePolicy {
    /// Drop the edge, log a warning and keep compiling.
    #[default]
    Skip,
    /// Abort the compilation with `CompileError::MissingNode`.
    Fail,
}

/// Per-node dependency lists of the dataflow part of a flow.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    /// Dataflow nodes in document order.
    nodes: Vec<&'a str>,
    /// Distinct upstream nodes, used for ordering.
    dependencies: AHashMap<&'a str, Vec<&'a str>>,
    /// Upstream node of every input port, used for binding.
    inputs: AHashMap<&'a str, Vec<&'a str>>,
}

/// Nodes in emission order plus what is needed to rebuild the traversal
/// paths that reached each one.
#[derive(Debug, Clone)]
pub struct ResolvedOrder<'a> {
    sorted: Vec<&'a str>,
    /// Consumer through which a node was first entered; roots are absent.
    first_parent: AHashMap<&'a str, &'a str>,
    /// Every consumer the traversal reached a node from, first entry included.
    reached_from: AHashMap<&'a str, Vec<&'a str>>,
}

#[derive(Default)]
struct SortState<'a> {
    visited: AHashSet<&'a str>,
    on_stack: AHashSet<&'a str>,
    sorted: Vec<&'a str>,
    first_parent: AHashMap<&'a str, &'a str>,
    reached_from: AHashMap<&'a str, Vec<&'a str>>,
}

impl<'a> DependencyGraph<'a> {
    /// Builds dependency lists for the nodes in `dataflow`.
    ///
    /// Edges touching nodes outside `dataflow` (loggers, annotations) are
    /// ignored. Edges naming an id absent from the flow are handled according
    /// to `policy`; skipped edges are described in `warnings`.
    pub fn build(
        flow: &'a Flow,
        dataflow: &AHashSet<&'a str>,
        policy: MissingNodePolicy,
        warnings: &mut Vec<String>,
    ) -> Result<Self, CompileError> {
        let known: AHashSet<&str> = flow.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut incoming: AHashMap<&str, Vec<&'a FlowEdge>> = AHashMap::new();

        for edge in &flow.edges {
            if let Some((missing, other)) = missing_endpoint(edge, &known) {
                let error = CompileError::MissingNode {
                    node_id: missing.to_string(),
                    referenced_by: other.to_string(),
                };
                match policy {
                    MissingNodePolicy::Fail => return Err(error),
                    MissingNodePolicy::Skip => {
                        tracing::warn!(edge = %edge.id, "skipping edge: {}", error);
                        warnings.push(error.to_string());
                        continue;
                    }
                }
            }
            if dataflow.contains(edge.source.as_str()) && dataflow.contains(edge.target.as_str()) {
                incoming.entry(edge.target.as_str()).or_default().push(edge);
            }
        }

        let nodes: Vec<&'a str> = flow
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| dataflow.contains(id))
            .collect();

        let mut dependencies = AHashMap::with_capacity(nodes.len());
        let mut inputs = AHashMap::with_capacity(nodes.len());
        for &id in &nodes {
            let edges = incoming.get(id).map(Vec::as_slice).unwrap_or(&[]);
            dependencies.insert(id, find_multiple_previous_node_ids(id, edges.iter().copied()));
            inputs.insert(id, find_input_node_ids(id, edges.iter().copied()));
        }

        Ok(Self {
            nodes,
            dependencies,
            inputs,
        })
    }

    /// Distinct upstream nodes of `node_id`, in port order.
    pub fn dependencies(&self, node_id: &str) -> &[&'a str] {
        self.dependencies
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Upstream node of each input port of `node_id`, in port order. A node
    /// wired into several ports appears once per port.
    pub fn inputs(&self, node_id: &str) -> &[&'a str] {
        self.inputs.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.dependencies.contains_key(node_id)
    }

    /// Depth-first post-order over dependencies, starting from every node in
    /// document order. A dependency that is still on the traversal stack is a
    /// cycle and fails with `CompileError::CyclicGraph`.
    ///
    /// The traversal keeps its own frame stack, so chain length is bounded by
    /// memory rather than by the thread's stack.
    pub fn topological_sort(&self) -> Result<ResolvedOrder<'a>, CompileError> {
        let mut state = SortState::default();
        for &root in &self.nodes {
            if state.visited.insert(root) {
                self.visit(root, &mut state)?;
            }
        }
        Ok(ResolvedOrder {
            sorted: state.sorted,
            first_parent: state.first_parent,
            reached_from: state.reached_from,
        })
    }

    fn visit(&self, root: &'a str, state: &mut SortState<'a>) -> Result<(), CompileError> {
        // (node, index of the next dependency to look at)
        let mut frames: Vec<(&'a str, usize)> = vec![(root, 0)];
        state.on_stack.insert(root);

        while let Some(&(node, next)) = frames.last() {
            let Some(&dependency) = self.dependencies(node).get(next) else {
                frames.pop();
                state.on_stack.remove(node);
                state.sorted.push(node);
                continue;
            };
            if let Some(top) = frames.last_mut() {
                top.1 += 1;
            }

            if state.on_stack.contains(dependency) {
                return Err(cycle_error(&frames, dependency));
            }
            state.reached_from.entry(dependency).or_default().push(node);
            if state.visited.insert(dependency) {
                state.first_parent.insert(dependency, node);
                state.on_stack.insert(dependency);
                frames.push((dependency, 0));
            }
        }
        Ok(())
    }

    /// Every node `target` transitively depends on, `target` included.
    pub fn ancestors_of(&self, target: &'a str) -> AHashSet<&'a str> {
        let mut required = AHashSet::new();
        let mut queue = VecDeque::from([target]);
        while let Some(node) = queue.pop_front() {
            if required.insert(node) {
                queue.extend(self.dependencies(node).iter().copied());
            }
        }
        required
    }
}

/// The frames run consumer -> dependency; the cycle is reported in dataflow
/// direction with its first node repeated at the end.
fn cycle_error(frames: &[(&str, usize)], dependency: &str) -> CompileError {
    let start = frames
        .iter()
        .position(|(n, _)| *n == dependency)
        .unwrap_or(0);
    let mut cycle: Vec<String> = frames[start..].iter().map(|(n, _)| n.to_string()).collect();
    cycle.push(dependency.to_string());
    cycle.reverse();
    CompileError::CyclicGraph { cycle }
}

impl<'a> ResolvedOrder<'a> {
    /// Nodes such that each appears after all of its dependencies.
    pub fn sorted(&self) -> &[&'a str] {
        &self.sorted
    }

    /// The minimal ordered subset needed to compute `target`.
    pub fn restrict_to(&self, graph: &DependencyGraph<'a>, target: &'a str) -> Vec<&'a str> {
        let required = graph.ancestors_of(target);
        self.sorted
            .iter()
            .copied()
            .filter(|id| required.contains(id))
            .collect()
    }

    /// Union of the traversal paths (the node and the consumers the traversal
    /// came through) that reached `node_id`. `None` for unknown nodes.
    pub fn reached_via(&self, node_id: &str) -> Option<AHashSet<&'a str>> {
        let node = *self.sorted.iter().find(|n| **n == node_id)?;
        let mut paths = AHashSet::from_iter([node]);
        for &consumer in self.reached_from.get(node).into_iter().flatten() {
            // A consumer's stack when it was entered is its first-entry chain.
            let mut current = Some(consumer);
            while let Some(id) = current {
                if !paths.insert(id) {
                    break;
                }
                current = self.first_parent.get(id).copied();
            }
        }
        Some(paths)
    }
}

fn missing_endpoint<'e>(edge: &'e FlowEdge, known: &AHashSet<&str>) -> Option<(&'e str, &'e str)> {
    if !known.contains(edge.source.as_str()) {
        Some((edge.source.as_str(), edge.target.as_str()))
    } else if !known.contains(edge.target.as_str()) {
        Some((edge.target.as_str(), edge.source.as_str()))
    } else {
        None
    }
}
