use super::artifact::OutputBinding;
use crate::error::CompileError;
use crate::registry::{ComponentCategory, Inputs};
use ahash::AHashMap;

/// Assigns output variable names and resolves the input names of consumers.
///
/// Names are `{component_id}{n}` with a per-component counter starting at 1.
/// Counters live only as long as the binder, so every compilation starts over.
#[derive(Debug, Default)]
pub struct VariableBinder {
    counters: AHashMap<String, u32>,
    bindings: AHashMap<String, String>,
    order: Vec<OutputBinding>,
}

impl VariableBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the output name of `node_id`. A node is only ever named once;
    /// asking again returns the existing name.
    pub fn allocate(&mut self, node_id: &str, component_id: &str) -> String {
        if let Some(existing) = self.bindings.get(node_id) {
            return existing.clone();
        }
        let counter = self.counters.entry(component_id.to_string()).or_insert(0);
        *counter += 1;
        let name = format!("{}{}", variable_stem(component_id), counter);

        self.bindings.insert(node_id.to_string(), name.clone());
        self.order.push(OutputBinding {
            node_id: node_id.to_string(),
            variable: name.clone(),
        });
        name
    }

    pub fn output_of(&self, node_id: &str) -> Option<&str> {
        self.bindings.get(node_id).map(String::as_str)
    }

    /// Maps the upstream nodes of `node_id` to their variables, checking the
    /// arity its category requires.
    pub fn resolve_inputs(
        &self,
        node_id: &str,
        category: ComponentCategory,
        predecessors: &[&str],
    ) -> Result<Inputs, CompileError> {
        let connection_error = |message: String| CompileError::ConnectionError {
            node_id: node_id.to_string(),
            message,
        };

        if !category.is_dataflow() || category == ComponentCategory::Input {
            return Ok(Inputs::None);
        }

        let mut names = predecessors
            .iter()
            .map(|&source| {
                self.output_of(source).map(str::to_string).ok_or_else(|| {
                    connection_error(format!("upstream node '{}' produces no output", source))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match category {
            ComponentCategory::Processor | ComponentCategory::Output => match names.len() {
                1 => Ok(Inputs::Single(names.remove(0))),
                0 => Err(connection_error(format!("{} has no incoming connection", category))),
                n => Err(connection_error(format!(
                    "{} expects a single input but has {} incoming connections",
                    category, n
                ))),
            },
            ComponentCategory::DoubleProcessor => {
                if names.len() != 2 {
                    return Err(connection_error(format!(
                        "{} expects exactly 2 inputs but has {}",
                        category,
                        names.len()
                    )));
                }
                let second = names.remove(1);
                let first = names.remove(0);
                Ok(Inputs::Pair(first, second))
            }
            ComponentCategory::MultiProcessor => {
                if names.is_empty() {
                    return Err(connection_error(format!("{} has no incoming connection", category)));
                }
                Ok(Inputs::Many(names))
            }
            ComponentCategory::Input | ComponentCategory::Logger | ComponentCategory::Annotation => {
                Ok(Inputs::None)
            }
        }
    }

    /// Bindings in the order they were assigned.
    pub fn into_bindings(self) -> Vec<OutputBinding> {
        self.order
    }
}

/// Turns a component id into a valid Python identifier prefix.
pub fn variable_stem(component_id: &str) -> String {
    let mut stem: String = component_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() || stem.starts_with(|c: char| c.is_ascii_digit()) {
        stem.insert(0, '_');
    }
    stem
}
