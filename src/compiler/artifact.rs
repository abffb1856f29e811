use crate::error::ArtifactError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

/// The variable a node's result is stored in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    pub node_id: String,
    pub variable: String,
}

/// Result of one compilation: the script plus what the host needs to run
/// and inspect it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CompiledPipeline {
    /// The generated Python source.
    pub source: String,
    /// Ids of the emitted dataflow nodes, in emission order.
    pub order: Vec<String>,
    /// Output variables, in emission order.
    pub bindings: Vec<OutputBinding>,
    /// Packages listed in the `# Additional dependencies` header line.
    pub dependencies: Vec<String>,
    /// Problems that were skipped rather than treated as errors.
    pub warnings: Vec<String>,
}

impl CompiledPipeline {
    pub fn output_of(&self, node_id: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.node_id == node_id)
            .map(|b| b.variable.as_str())
    }

    /// Node id -> output variable, as consumed by the editor's data preview.
    pub fn binding_map(&self) -> AHashMap<&str, &str> {
        self.bindings
            .iter()
            .map(|b| (b.node_id.as_str(), b.variable.as_str()))
            .collect()
    }

    /// Serializes the artifact with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Generic(format!("Serialization failed: {}", e)))
    }

    /// Saves the artifact to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| {
            ArtifactError::Generic(format!("Could not create file '{}': {}", path, e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not write to file '{}': {}", path, e))
        })?;
        Ok(())
    }

    /// Loads an artifact from a file.
    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ArtifactError::Generic(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Generic(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Deserializes an artifact from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(artifact, _)| artifact) // bincode 2 returns (value, bytes_read)
            .map_err(|e| ArtifactError::Generic(format!("Deserialization failed: {}", e)))
    }
}
