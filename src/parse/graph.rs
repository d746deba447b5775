//! Shape detection and the petgraph view over resolved links.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde_json::{Map, Value};

use super::types::{GraphShape, Link, LinksField, NodeId, NodeRecord, json_kind};
use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowGraph {
    pub shape: GraphShape,
    pub nodes: Vec<NodeRecord>,
    /// Always `Absent` for map-form graphs.
    pub links: LinksField,
}

impl WorkflowGraph {
    /// Normalize a decoded JSON document into a graph, detecting its shape.
    pub fn from_value(doc: Value) -> Result<Self, LoadError> {
        let mut top = match doc {
            Value::Object(top) => top,
            other => {
                return Err(LoadError::UnrecognizedShape(format!(
                    "expected a JSON object at the top level, found {}",
                    json_kind(&other)
                )));
            }
        };

        if let Some(nodes) = top.remove("nodes") {
            let links = top.remove("links");
            return Self::from_array_form(nodes, links);
        }

        Self::from_map_form(top)
    }

    fn from_array_form(nodes: Value, links: Option<Value>) -> Result<Self, LoadError> {
        let nodes = match nodes {
            Value::Array(nodes) => nodes,
            Value::Null => Vec::new(),
            other => {
                return Err(LoadError::UnrecognizedShape(format!(
                    "`nodes` must be an array, found {}",
                    json_kind(&other)
                )));
            }
        };

        let nodes = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| {
                let raw_id = node.get("id").cloned();
                let id = raw_id.as_ref().and_then(Value::as_i64).map(NodeId::Int);
                let type_name = node
                    .get("type")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                NodeRecord {
                    position,
                    id,
                    raw_id,
                    type_name,
                }
            })
            .collect();

        let links = match links {
            None => LinksField::Absent,
            Some(Value::Array(entries)) => LinksField::List(entries),
            Some(other) => LinksField::Invalid(other),
        };

        Ok(WorkflowGraph {
            shape: GraphShape::Array,
            nodes,
            links,
        })
    }

    fn from_map_form(top: Map<String, Value>) -> Result<Self, LoadError> {
        let mut nodes = Vec::with_capacity(top.len());

        for (position, (key, node)) in top.into_iter().enumerate() {
            let fields = match node {
                Value::Object(fields) => fields,
                other => {
                    return Err(LoadError::UnrecognizedShape(format!(
                        "no `nodes` array and entry '{}' is {}, not a node object",
                        key,
                        json_kind(&other)
                    )));
                }
            };
            let type_name = fields
                .get("class_type")
                .and_then(Value::as_str)
                .map(str::to_string);
            nodes.push(NodeRecord {
                position,
                id: Some(NodeId::Key(key.clone())),
                raw_id: Some(Value::String(key)),
                type_name,
            });
        }

        Ok(WorkflowGraph {
            shape: GraphShape::Map,
            nodes,
            links: LinksField::Absent,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declared type names in node order, skipping nodes without one.
    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|n| n.type_name.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkLabel {
    pub link_id: String,
    pub source_slot: Option<i64>,
    pub target_slot: Option<i64>,
}

/// Directed graph over nodes whose links fully resolved.
pub struct LinkGraph {
    pub graph: DiGraph<NodeId, LinkLabel>,
    pub node_indices: HashMap<NodeId, NodeIndex>,
}

impl LinkGraph {
    /// Build from a node-id set and links. Links with an endpoint outside the
    /// set are left out; the structural check reports those separately.
    pub fn build<'a>(node_ids: impl IntoIterator<Item = &'a NodeId>, links: &[Link]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for id in node_ids {
            if !node_indices.contains_key(id) {
                let idx = graph.add_node(id.clone());
                node_indices.insert(id.clone(), idx);
            }
        }

        for link in links {
            let source = link.source_id().and_then(|id| node_indices.get(&id).copied());
            let target = link.target_id().and_then(|id| node_indices.get(&id).copied());
            if let (Some(s), Some(t)) = (source, target) {
                graph.add_edge(
                    s,
                    t,
                    LinkLabel {
                        link_id: link.id.to_string(),
                        source_slot: link.source_slot.as_i64(),
                        target_slot: link.target_slot.as_i64(),
                    },
                );
            }
        }

        LinkGraph {
            graph,
            node_indices,
        }
    }

    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// A node that lies on a directed cycle, if any. Self-loops count.
    pub fn find_cycle(&self) -> Option<&NodeId> {
        match toposort(&self.graph, None) {
            Ok(_) => None,
            Err(cycle) => Some(&self.graph[cycle.node_id()]),
        }
    }
}
