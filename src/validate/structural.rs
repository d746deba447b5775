//! Graph-level structural validation rules (S001–S008).

use std::collections::BTreeSet;

use serde_json::Value;

use super::StructureOptions;
use crate::error::QaError;
use crate::parse::graph::{LinkGraph, WorkflowGraph};
use crate::parse::types::{GraphShape, Link, LinksField, NodeId, json_kind};

pub const NO_NODES: &str = "Workflow has no nodes.";

/// Result of the structural stage.
#[derive(Debug, Clone, Default)]
pub struct StructureCheck {
    /// Identifiers of nodes that passed the identity rule.
    pub node_ids: BTreeSet<NodeId>,
    /// Link entries that parsed as 5-tuples, resolved or not.
    pub links: Vec<Link>,
    pub errors: Vec<QaError>,
}

impl StructureCheck {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn link_graph(&self) -> LinkGraph {
        LinkGraph::build(&self.node_ids, &self.links)
    }
}

/// Run all structural rules. Independent rules all run, so one pass reports
/// every problem.
pub fn validate_structure(graph: &WorkflowGraph, options: &StructureOptions) -> StructureCheck {
    let mut check = StructureCheck::default();

    if !s001_has_nodes(graph, &mut check.errors) {
        return check;
    }

    check.node_ids = s002_node_identity(graph, options, &mut check.errors);
    let entries = s003_links_are_list(graph, &mut check.errors);
    check.links = s004_link_entries(entries, &mut check.errors);
    s005_links_resolve(&check.links, &check.node_ids, &mut check.errors);

    if options.reject_cycles {
        if let Some(error) = s008_no_cycles(&check) {
            check.errors.push(error);
        }
    }

    check
}

fn s001_has_nodes(graph: &WorkflowGraph, errors: &mut Vec<QaError>) -> bool {
    if graph.is_empty() {
        errors.push(QaError::structure("S001", NO_NODES, None));
        return false;
    }
    true
}

fn s002_node_identity(
    graph: &WorkflowGraph,
    options: &StructureOptions,
    errors: &mut Vec<QaError>,
) -> BTreeSet<NodeId> {
    let mut ids = BTreeSet::new();

    for node in &graph.nodes {
        match graph.shape {
            GraphShape::Array => {
                let Some(id) = &node.id else {
                    let message = match &node.raw_id {
                        Some(raw) => format!(
                            "Node at index {} has a non-integer id {}",
                            node.position, raw
                        ),
                        None => format!("Node at index {} is missing an integer id", node.position),
                    };
                    errors.push(QaError::structure("S002", message, None));
                    continue;
                };
                if !ids.insert(id.clone()) {
                    if options.reject_duplicate_ids {
                        errors.push(QaError::structure(
                            "S007",
                            format!("Duplicate node id {}", id),
                            Some(id.to_string()),
                        ));
                    } else {
                        tracing::warn!(node_id = %id, "duplicate node id tolerated");
                    }
                }
            }
            GraphShape::Map => {
                let Some(id) = &node.id else { continue };
                if node.type_name.is_none() {
                    errors.push(QaError::structure(
                        "S006",
                        format!("Node \"{}\" is missing class_type", id),
                        Some(id.to_string()),
                    ));
                }
                ids.insert(id.clone());
            }
        }
    }

    ids
}

fn s003_links_are_list<'g>(graph: &'g WorkflowGraph, errors: &mut Vec<QaError>) -> &'g [Value] {
    if let LinksField::Invalid(value) = &graph.links {
        errors.push(QaError::structure(
            "S003",
            format!("Workflow links must be a list, found {}", json_kind(value)),
            None,
        ));
    }
    graph.links.entries()
}

fn s004_link_entries(entries: &[Value], errors: &mut Vec<QaError>) -> Vec<Link> {
    let mut links = Vec::with_capacity(entries.len());
    for entry in entries {
        match Link::from_entry(entry) {
            Some(link) => links.push(link),
            None => errors.push(QaError::structure(
                "S004",
                format!("Invalid link entry: {}", entry),
                None,
            )),
        }
    }
    links
}

fn s005_links_resolve(links: &[Link], node_ids: &BTreeSet<NodeId>, errors: &mut Vec<QaError>) {
    let resolves = |id: Option<NodeId>| id.is_some_and(|id| node_ids.contains(&id));

    for link in links {
        if !resolves(link.source_id()) {
            errors.push(QaError::structure(
                "S005",
                format!(
                    "Link {} references unknown source node {}",
                    link.id, link.source
                ),
                Some(link.source.to_string()),
            ));
        }
        if !resolves(link.target_id()) {
            errors.push(QaError::structure(
                "S005",
                format!(
                    "Link {} references unknown target node {}",
                    link.id, link.target
                ),
                Some(link.target.to_string()),
            ));
        }
    }
}

fn s008_no_cycles(check: &StructureCheck) -> Option<QaError> {
    check.link_graph().find_cycle().map(|id| {
        QaError::structure(
            "S008",
            format!("Workflow graph contains a cycle through node {}", id),
            Some(id.to_string()),
        )
    })
}
