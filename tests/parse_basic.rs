//! Integration tests for the load phase: shape detection and load failures.

#[allow(dead_code)]
mod helpers;

use helpers::*;
use workflow_qa::error::LoadError;
use workflow_qa::parse::{self, GraphShape, LinksField, NodeId};

#[test]
fn load_array_form_workflow() {
    let graph = load(include_str!("workflows/minimal_text2img.json"));
    assert_eq!(graph.shape, GraphShape::Array);
    assert_eq!(graph.nodes.len(), 7);
    assert_eq!(graph.links.entries().len(), 9);
    assert_eq!(graph.nodes[0].id, Some(NodeId::Int(4)));
    assert_eq!(graph.nodes[0].type_name.as_deref(), Some("CheckpointLoaderSimple"));
}

#[test]
fn load_map_form_keeps_document_order() {
    let graph = load(include_str!("fixtures/text2img_api.json"));
    assert_eq!(graph.shape, GraphShape::Map);
    assert_eq!(graph.links, LinksField::Absent);
    let ids: Vec<String> = graph.nodes.iter().map(|n| n.label()).collect();
    assert_eq!(ids, vec!["3", "4", "5", "6", "7", "8", "9"]);
    let types: Vec<&str> = graph.node_types().collect();
    assert_eq!(types[0], "KSampler");
}

#[test]
fn map_form_node_without_class_type_still_loads() {
    let graph = load(r#"{"1": {}}"#);
    assert_eq!(graph.shape, GraphShape::Map);
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].type_name, None);
}

#[test]
fn empty_object_is_an_empty_map_form_graph() {
    let graph = load("{}");
    assert_eq!(graph.shape, GraphShape::Map);
    assert!(graph.is_empty());
}

#[test]
fn null_nodes_is_an_empty_array_form_graph() {
    let graph = load(r#"{"nodes": null}"#);
    assert_eq!(graph.shape, GraphShape::Array);
    assert!(graph.is_empty());
}

#[test]
fn links_absent_vs_invalid() {
    let absent = load(r#"{"nodes": [{"id": 1, "type": "A"}]}"#);
    assert_eq!(absent.links, LinksField::Absent);

    let invalid = load(r#"{"nodes": [{"id": 1, "type": "A"}], "links": {"0": [0, 1, 0, 1, 0]}}"#);
    assert!(matches!(invalid.links, LinksField::Invalid(_)));
    assert!(invalid.links.entries().is_empty());
}

#[test]
fn non_integer_ids_are_kept_raw() {
    let graph = load(r#"{"nodes": [{"id": "7", "type": "A"}, {"id": 2.5}, {"type": "B"}]}"#);
    assert_eq!(graph.nodes[0].id, None);
    assert_eq!(graph.nodes[0].raw_id, Some(serde_json::json!("7")));
    assert_eq!(graph.nodes[1].id, None);
    assert_eq!(graph.nodes[2].raw_id, None);
    assert_eq!(graph.nodes[2].label(), "#2");
}

#[test]
fn invalid_json_is_a_parse_error() {
    let err = parse::load_str("{\"nodes\": [").unwrap_err();
    assert!(matches!(err, LoadError::Parse(_)), "got {:?}", err);
    assert_eq!(err.code(), "L002");
    assert!(err.to_string().starts_with("Invalid JSON in workflow: EOF while parsing"));
}

#[test]
fn top_level_array_is_unrecognized() {
    let err = parse::load_str("[1, 2]").unwrap_err();
    assert!(matches!(err, LoadError::UnrecognizedShape(_)));
    assert!(err.to_string().contains("found array"));
}

#[test]
fn nodes_must_be_an_array() {
    let err = parse::load_str(r#"{"nodes": "many"}"#).unwrap_err();
    assert!(matches!(err, LoadError::UnrecognizedShape(_)));
}

#[test]
fn map_form_entries_must_be_objects() {
    let err = parse::load_str(r#"{"1": {"class_type": "A"}, "version": 2}"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unrecognized workflow shape: no `nodes` array and entry 'version' is number, not a node object"
    );
}

#[test]
fn missing_file_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing.json");
    let err = parse::load_file(&path).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), "L001");
}

#[test]
fn load_file_reads_fixture() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/workflows/minimal_text2img.json");
    let graph = parse::load_file(&path).expect("Should load from disk");
    assert_eq!(graph.nodes.len(), 7);
}

#[test]
fn link_graph_tracks_resolved_links() {
    let graph = load(include_str!("workflows/minimal_text2img.json"));
    let check = workflow_qa::validate::validate_structure(&graph, &Default::default());
    let links = check.link_graph();
    assert_eq!(links.link_count(), 9);
    assert_eq!(links.find_cycle(), None);
}
