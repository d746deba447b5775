//! Required node types (S009).

use std::collections::BTreeSet;

use crate::error::QaError;
use crate::parse::graph::WorkflowGraph;

/// Node types a minimal text-to-image workflow must contain.
pub const TEXT2IMG_REQUIRED: &[&str] = &[
    "CheckpointLoaderSimple",
    "CLIPTextEncode",
    "EmptyLatentImage",
    "KSampler",
    "VAEDecode",
];

/// Report every required type the graph does not declare, as one message.
pub fn check_required_types<S: AsRef<str>>(graph: &WorkflowGraph, required: &[S]) -> Vec<QaError> {
    let present: BTreeSet<&str> = graph.node_types().collect();
    let missing: BTreeSet<&str> = required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !present.contains(name))
        .collect();

    if missing.is_empty() {
        return vec![];
    }

    vec![QaError::structure(
        "S009",
        format!(
            "Missing required node types: {}",
            missing.into_iter().collect::<Vec<_>>().join(", ")
        ),
        None,
    )]
}
