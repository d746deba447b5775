//! Node registry: the set of type names the hosting application can execute.
//!
//! The checker only ever asks "is this name known?", so anything that can
//! answer that implements [`Registry`]. Where the names come from is the
//! business of a [`RegistrySource`].

pub mod check;
pub mod source;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use check::check_against_registry;
pub use source::{JsonFileRegistry, PythonRegistry, RegistrySource};

pub trait Registry {
    fn contains(&self, type_name: &str) -> bool;
}

impl<R: Registry + ?Sized> Registry for &R {
    fn contains(&self, type_name: &str) -> bool {
        (**self).contains(type_name)
    }
}

impl Registry for HashSet<String> {
    fn contains(&self, type_name: &str) -> bool {
        HashSet::contains(self, type_name)
    }
}

impl Registry for BTreeSet<String> {
    fn contains(&self, type_name: &str) -> bool {
        BTreeSet::contains(self, type_name)
    }
}

impl<V> Registry for HashMap<String, V> {
    fn contains(&self, type_name: &str) -> bool {
        self.contains_key(type_name)
    }
}

impl<V> Registry for BTreeMap<String, V> {
    fn contains(&self, type_name: &str) -> bool {
        self.contains_key(type_name)
    }
}

impl Registry for serde_json::Map<String, serde_json::Value> {
    fn contains(&self, type_name: &str) -> bool {
        self.contains_key(type_name)
    }
}

impl Registry for [&str] {
    fn contains(&self, type_name: &str) -> bool {
        self.iter().any(|name| *name == type_name)
    }
}

/// Wrap a lookup function as a registry.
pub struct FnRegistry<F>(pub F);

impl<F: Fn(&str) -> bool> Registry for FnRegistry<F> {
    fn contains(&self, type_name: &str) -> bool {
        (self.0)(type_name)
    }
}

/// Owned set of known node type names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeRegistry {
    names: BTreeSet<String>,
}

/// Accepted on-disk layouts: a plain list of names, or an object keyed by
/// name such as a dump of `NODE_CLASS_MAPPINGS` or `/object_info`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryDocument {
    Names(Vec<String>),
    Mapping(serde_json::Map<String, serde_json::Value>),
}

impl NodeRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeRegistry {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let names = match serde_json::from_str::<RegistryDocument>(json)? {
            RegistryDocument::Names(names) => names,
            RegistryDocument::Mapping(mapping) => mapping.into_iter().map(|(k, _)| k).collect(),
        };
        Ok(NodeRegistry::new(names))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn is_subset(&self, other: &NodeRegistry) -> bool {
        self.names.is_subset(&other.names)
    }
}

impl Registry for NodeRegistry {
    fn contains(&self, type_name: &str) -> bool {
        self.names.contains(type_name)
    }
}

impl<S: Into<String>> FromIterator<S> for NodeRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        NodeRegistry::new(iter)
    }
}
