//! Orchestration and reporting: load → structure → registry → report.
//!
//! Stage order is fail-fast. A load failure ends the run, and the registry
//! stage only runs once the structural stage found nothing (unless
//! [`ValidateOptions::check_all`] asks for it anyway). Within a stage every
//! finding is kept.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{LoadError, QaError};
use crate::parse::{self, WorkflowGraph};
use crate::registry::{RegistrySource, check_against_registry};
use crate::validate::{StructureOptions, check_required_types, validate_structure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    LoadFailed,
    StructuralFailed,
    RegistryUnavailable,
    RegistryFailed,
}

impl Outcome {
    pub fn is_pass(self) -> bool {
        self == Outcome::Passed
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::LoadFailed => write!(f, "load failed"),
            Outcome::StructuralFailed => write!(f, "structural check failed"),
            Outcome::RegistryUnavailable => write!(f, "registry unavailable"),
            Outcome::RegistryFailed => write!(f, "registry check failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub outcome: Outcome,
    /// Findings in the order the stages produced them.
    pub errors: Vec<QaError>,
    /// One confirmation line per check that passed.
    pub checks: Vec<String>,
}

impl ValidationReport {
    fn load_failed(error: &LoadError) -> Self {
        ValidationReport {
            outcome: Outcome::LoadFailed,
            errors: vec![QaError::from(error)],
            checks: vec![],
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// Error lines for display. Findings with the same message collapse into
    /// one line that names every node they came from.
    pub fn display_lines(&self) -> Vec<String> {
        let mut groups: Vec<(&QaError, Vec<&str>)> = Vec::new();
        for error in &self.errors {
            let same = groups.iter().position(|(first, _)| {
                first.stage == error.stage
                    && first.code == error.code
                    && first.message == error.message
            });
            match same {
                Some(i) => {
                    let ids = &mut groups[i].1;
                    if let Some(id) = error.node_id.as_deref() {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                }
                None => groups.push((error, error.node_id.as_deref().into_iter().collect())),
            }
        }

        groups
            .into_iter()
            .map(|(first, ids)| {
                let line = format!("[{}:{}] {}", first.stage, first.code, first.message);
                match ids.as_slice() {
                    [] => line,
                    [id] => format!("{} (node '{}')", line, id),
                    many => {
                        let quoted: Vec<String> = many.iter().map(|id| format!("'{}'", id)).collect();
                        format!("{} (nodes {})", line, quoted.join(", "))
                    }
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowSource {
    Path(PathBuf),
    Text(String),
}

#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    pub structure: StructureOptions,
    /// Node types the workflow must contain, checked with the structure.
    pub required_types: Vec<String>,
    /// Run the registry stage even after structural failure. The outcome
    /// still reports the structural failure.
    pub check_all: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidateOptions,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Validator { options }
    }

    pub fn validate_source(
        &self,
        source: &WorkflowSource,
        registry: Option<&dyn RegistrySource>,
    ) -> ValidationReport {
        match source {
            WorkflowSource::Path(path) => self.validate_file(path, registry),
            WorkflowSource::Text(text) => self.validate_str(text, registry),
        }
    }

    pub fn validate_file(
        &self,
        path: &Path,
        registry: Option<&dyn RegistrySource>,
    ) -> ValidationReport {
        let graph = match parse::load_file(path) {
            Ok(graph) => graph,
            Err(e) => {
                tracing::debug!(error = %e, "workflow failed to load");
                return ValidationReport::load_failed(&e);
            }
        };
        let mut report = self.validate_graph(&graph, registry);
        report
            .checks
            .insert(0, format!("Workflow JSON is readable: {}", path.display()));
        report
    }

    pub fn validate_str(&self, json: &str, registry: Option<&dyn RegistrySource>) -> ValidationReport {
        match parse::load_str(json) {
            Ok(graph) => self.validate_graph(&graph, registry),
            Err(e) => {
                tracing::debug!(error = %e, "workflow failed to load");
                ValidationReport::load_failed(&e)
            }
        }
    }

    pub fn validate_graph(
        &self,
        graph: &WorkflowGraph,
        registry: Option<&dyn RegistrySource>,
    ) -> ValidationReport {
        let mut errors = Vec::new();
        let mut checks = Vec::new();

        // Structural stage
        let structure = validate_structure(graph, &self.options.structure);
        let link_count = structure.link_graph().link_count();
        let node_count = structure.node_ids.len();
        errors.extend(structure.errors);
        if !self.options.required_types.is_empty() {
            errors.extend(check_required_types(graph, &self.options.required_types));
        }

        let structure_ok = errors.is_empty();
        if structure_ok {
            checks.push(format!(
                "Structure is valid: {} nodes ({} form), {} links",
                node_count, graph.shape, link_count
            ));
            if !self.options.required_types.is_empty() {
                let mut required = self.options.required_types.clone();
                required.sort();
                required.dedup();
                checks.push(format!("Required nodes present: {}", required.join(", ")));
            }
        } else {
            tracing::info!(errors = errors.len(), "structural check failed");
            if !self.options.check_all {
                return ValidationReport {
                    outcome: Outcome::StructuralFailed,
                    errors,
                    checks,
                };
            }
        }

        // Registry stage
        let Some(source) = registry else {
            tracing::debug!("no registry supplied, structure-only run");
            return ValidationReport {
                outcome: if structure_ok {
                    Outcome::Passed
                } else {
                    Outcome::StructuralFailed
                },
                errors,
                checks,
            };
        };

        let outcome = match source.fetch() {
            Err(e) => {
                tracing::warn!(source = %source.describe(), error = %e, "registry unavailable");
                errors.push(QaError::from(&e));
                Outcome::RegistryUnavailable
            }
            Ok(known) => {
                let unknown = check_against_registry(graph, &*known);
                if unknown.is_empty() {
                    checks.push(format!(
                        "All node types known to {} ({} registered)",
                        source.describe(),
                        known.len()
                    ));
                    Outcome::Passed
                } else {
                    tracing::info!(unknown = unknown.len(), "registry check failed");
                    errors.extend(unknown);
                    Outcome::RegistryFailed
                }
            }
        };

        ValidationReport {
            outcome: if structure_ok {
                outcome
            } else {
                Outcome::StructuralFailed
            },
            errors,
            checks,
        }
    }
}

/// Validate with default options. `None` for the registry runs in
/// structure-only mode.
pub fn validate(source: &WorkflowSource, registry: Option<&dyn RegistrySource>) -> ValidationReport {
    Validator::default().validate_source(source, registry)
}
