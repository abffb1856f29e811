use super::definition::Flow;
use super::document::FlowDocument;
use crate::error::FlowConversionError;

/// A trait for document models that can be converted into a compilable `Flow`.
///
/// `FlowDocument` implements it for `.ampln` files. Hosts that keep pipelines
/// in their own shape implement it on their structs to feed the compiler
/// without going through JSON.
///
/// # Example
///
/// ```rust,no_run
/// use amphi_codegen::prelude::*;
/// use amphi_codegen::error::FlowConversionError;
///
/// struct Step { id: String, component: String }
/// struct Chain { steps: Vec<Step> }
///
/// impl IntoFlow for Chain {
///     fn into_flow(self) -> std::result::Result<Flow, FlowConversionError> {
///         let edges = self
///             .steps
///             .windows(2)
///             .map(|pair| FlowEdge::new(pair[0].id.clone(), pair[1].id.clone()))
///             .collect();
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|s| FlowNode::new(s.id, s.component, serde_json::Value::Null))
///             .collect();
///         Ok(Flow::new(nodes, edges))
///     }
/// }
/// ```
pub trait IntoFlow {
    /// Consumes the object and converts it into a compilable flow.
    fn into_flow(self) -> Result<Flow, FlowConversionError>;
}

impl IntoFlow for Flow {
    fn into_flow(self) -> Result<Flow, FlowConversionError> {
        Ok(self)
    }
}

impl IntoFlow for FlowDocument {
    fn into_flow(self) -> Result<Flow, FlowConversionError> {
        self.pipelines
            .into_iter()
            .next()
            .map(|pipeline| pipeline.flow)
            .ok_or_else(|| {
                FlowConversionError::ValidationError("document contains no pipelines".to_string())
            })
    }
}
