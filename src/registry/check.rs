//! Registry membership check (R001).

use super::Registry;
use crate::error::QaError;
use crate::parse::graph::WorkflowGraph;

/// One message per node whose declared type the registry does not know.
/// Nodes without a type, or with an empty one, are skipped.
pub fn check_against_registry<R: Registry + ?Sized>(
    graph: &WorkflowGraph,
    registry: &R,
) -> Vec<QaError> {
    let mut errors = Vec::new();

    for node in &graph.nodes {
        let Some(type_name) = node.type_name.as_deref() else {
            continue;
        };
        if type_name.is_empty() || registry.contains(type_name) {
            continue;
        }
        errors.push(QaError::registry(
            "R001",
            format!("Unknown node type \"{}\"", type_name),
            Some(node.label()),
        ));
    }

    errors
}
