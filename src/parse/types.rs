//! Normalized in-memory form of a ComfyUI workflow document.
//!
//! Two serialized shapes exist: the editor's "array form" (`nodes` + `links`
//! arrays, as saved from the UI) and the API "map form" (node key → object
//! with `class_type`, as posted to `/prompt`). Both load into a
//! [`WorkflowGraph`] so the validators never look at the raw shape again.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphShape {
    /// `{"nodes": [...], "links": [...]}`
    Array,
    /// `{"<key>": {"class_type": ...}, ...}`
    Map,
}

impl std::fmt::Display for GraphShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphShape::Array => write!(f, "array"),
            GraphShape::Map => write!(f, "map"),
        }
    }
}

/// Node identifier. Array-form graphs use integers, map-form graphs use the
/// object keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum NodeId {
    Int(i64),
    Key(String),
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeId::Int(n) => write!(f, "{}", n),
            NodeId::Key(k) => write!(f, "{}", k),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Index of the node in document order.
    pub position: usize,
    /// `None` when the node carries no usable identifier.
    pub id: Option<NodeId>,
    /// The identifier exactly as it appeared in the document, if any.
    pub raw_id: Option<Value>,
    /// `type` (array form) or `class_type` (map form), when it is a string.
    pub type_name: Option<String>,
}

impl NodeRecord {
    /// Label used in messages: the id when present, the position otherwise.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("#{}", self.position),
        }
    }
}

/// The `links` field of an array-form document.
#[derive(Debug, Clone, PartialEq)]
pub enum LinksField {
    Absent,
    List(Vec<Value>),
    /// Present but not a list. Kept so the structural check can name it.
    Invalid(Value),
}

impl LinksField {
    pub fn entries(&self) -> &[Value] {
        match self {
            LinksField::List(entries) => entries,
            LinksField::Absent | LinksField::Invalid(_) => &[],
        }
    }
}

/// A well-formed link entry: `[id, source, source_slot, target, target_slot, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: Value,
    pub source: Value,
    pub source_slot: Value,
    pub target: Value,
    pub target_slot: Value,
}

impl Link {
    pub const MIN_FIELDS: usize = 5;

    /// Parse a raw link entry. Trailing fields past the fifth are ignored.
    pub fn from_entry(entry: &Value) -> Option<Link> {
        let fields = entry.as_array()?;
        if fields.len() < Self::MIN_FIELDS {
            return None;
        }
        Some(Link {
            id: fields[0].clone(),
            source: fields[1].clone(),
            source_slot: fields[2].clone(),
            target: fields[3].clone(),
            target_slot: fields[4].clone(),
        })
    }

    pub fn source_id(&self) -> Option<NodeId> {
        self.source.as_i64().map(NodeId::Int)
    }

    pub fn target_id(&self) -> Option<NodeId> {
        self.target.as_i64().map(NodeId::Int)
    }
}

/// Name a JSON value's kind for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
