//! Load phase: workflow JSON → normalized graph.

pub mod graph;
pub mod types;

use std::path::Path;

pub use graph::{LinkGraph, WorkflowGraph};
pub use types::*;

use crate::error::LoadError;

/// Parse workflow JSON text and detect its shape.
pub fn load_str(json: &str) -> Result<WorkflowGraph, LoadError> {
    let doc = serde_json::from_str::<serde_json::Value>(json)?;
    let graph = WorkflowGraph::from_value(doc)?;
    tracing::debug!(
        shape = %graph.shape,
        nodes = graph.nodes.len(),
        "loaded workflow"
    );
    Ok(graph)
}

/// Read a workflow file. A missing file is reported as `NotFound`, distinct
/// from a file that exists but does not parse.
pub fn load_file(path: &Path) -> Result<WorkflowGraph, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read workflow file");
    load_str(&text)
}
