use serde_json::{Value, json};
use workflow_qa::error::QaError;
use workflow_qa::parse::{self, WorkflowGraph};
use workflow_qa::registry::NodeRegistry;

// =============================================================================
// Workflow builders
// =============================================================================

/// Array-form document text from node and link values.
pub fn array_doc(nodes: Value, links: Value) -> String {
    json!({ "nodes": nodes, "links": links }).to_string()
}

/// Array-form graph where node `i` has id `i` and the given type.
pub fn chain_graph(types: &[&str]) -> WorkflowGraph {
    let nodes: Vec<Value> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({ "id": i as i64 + 1, "type": t }))
        .collect();
    let links: Vec<Value> = (1..types.len() as i64)
        .map(|i| json!([i, i, 0, i + 1, 0]))
        .collect();
    parse::load_str(&array_doc(Value::Array(nodes), Value::Array(links))).expect("Should load")
}

pub fn load(json: &str) -> WorkflowGraph {
    parse::load_str(json).expect("Should load")
}

pub fn registry(names: &[&str]) -> NodeRegistry {
    NodeRegistry::new(names.iter().copied())
}

// =============================================================================
// Assertions
// =============================================================================

pub fn messages(errors: &[QaError]) -> Vec<&str> {
    errors.iter().map(|e| e.message.as_str()).collect()
}

pub fn assert_has_error(errors: &[QaError], code: &str) {
    assert!(
        errors.iter().any(|e| e.code == code),
        "Expected error {}, got: {:?}",
        code,
        errors
    );
}

pub fn assert_no_error(errors: &[QaError], code: &str) {
    assert!(
        !errors.iter().any(|e| e.code == code),
        "Did not expect error {}, but got: {:?}",
        code,
        errors
    );
}
