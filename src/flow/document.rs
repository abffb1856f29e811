use super::conversion::IntoFlow;
use super::definition::Flow;
use crate::error::FlowParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Document type written by the pipeline editor.
pub const DOC_TYPE: &str = "Amphi Pipeline";

/// File extension of pipeline documents.
pub const DOCUMENT_EXTENSION: &str = "ampln";

/// A `.ampln` pipeline document as saved by the editor.
///
/// Only the parts the compiler reads are typed; everything else is carried in
/// `extra` so a document can be re-saved without losing editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default)]
    pub version: String,
    pub pipelines: Vec<PipelineEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One pipeline inside a document. The editor writes exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEntry {
    #[serde(default)]
    pub id: String,
    pub flow: Flow,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_doc_type() -> String {
    DOC_TYPE.to_string()
}

impl FlowDocument {
    /// Wraps a flow into a fresh single-pipeline document.
    pub fn new(flow: Flow) -> Self {
        Self {
            doc_type: default_doc_type(),
            version: "1".to_string(),
            pipelines: vec![PipelineEntry {
                id: "primary".to_string(),
                flow,
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, FlowParseError> {
        serde_json::from_str(json).map_err(|e| FlowParseError::Json(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, FlowParseError> {
        serde_json::to_string_pretty(self).map_err(|e| FlowParseError::Json(e.to_string()))
    }

    /// The flow of the first pipeline, if any.
    pub fn primary_flow(&self) -> Option<&Flow> {
        self.pipelines.first().map(|p| &p.flow)
    }

    pub fn primary_flow_mut(&mut self) -> Option<&mut Flow> {
        self.pipelines.first_mut().map(|p| &mut p.flow)
    }
}

/// Parses either a full `.ampln` document or a bare `{nodes, edges}` object.
pub fn parse_flow(json: &str) -> Result<Flow, FlowParseError> {
    let value: Value = serde_json::from_str(json).map_err(|e| FlowParseError::Json(e.to_string()))?;
    if value.get("pipelines").is_some() {
        let document: FlowDocument =
            serde_json::from_value(value).map_err(|e| FlowParseError::Json(e.to_string()))?;
        Ok(document.into_flow()?)
    } else {
        serde_json::from_value(value).map_err(|e| FlowParseError::Json(e.to_string()))
    }
}

/// Reads and parses a flow from a file on disk.
pub fn load_flow(path: impl AsRef<Path>) -> Result<Flow, FlowParseError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| FlowParseError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_flow(&content)
}

impl Flow {
    /// See [`parse_flow`].
    pub fn from_json(json: &str) -> Result<Self, FlowParseError> {
        parse_flow(json)
    }

    pub fn to_json(&self) -> Result<String, FlowParseError> {
        serde_json::to_string(self).map_err(|e| FlowParseError::Json(e.to_string()))
    }
}
