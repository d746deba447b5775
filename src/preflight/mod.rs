//! Accelerator preflight for the portable distribution.
//!
//! Probes the optional acceleration libraries, appends the results to the
//! manifest, and disables custom nodes whose accelerator failed to import.
//! Re-enabling is manual: rename `<node>.disabled` back to `<node>`.

pub mod disable;
pub mod manifest;
pub mod probe;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use disable::{DisableStatus, dependents_of, disable_node};
pub use probe::{ACCEL_CHECKS, AccelCheck, ProbeRecord, Prober, PythonProber, probe};

use crate::portable::{COMFY_DIR, CUSTOM_NODES_DIR};

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub manifest: PathBuf,
    pub custom_nodes: PathBuf,
}

impl PreflightConfig {
    /// Layout of an extracted package: `ComfyUI/custom_nodes` and the
    /// manifest at the package root.
    pub fn for_root(root: &Path) -> Self {
        PreflightConfig {
            manifest: root.join(manifest::MANIFEST_FILE),
            custom_nodes: root.join(COMFY_DIR).join(CUSTOM_NODES_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeAction {
    pub backend: String,
    pub node: String,
    pub status: DisableStatus,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightSummary {
    pub records: Vec<ProbeRecord>,
    pub actions: Vec<NodeAction>,
    /// Failed backends with no custom nodes mapped to them.
    pub unmapped: Vec<String>,
    pub manifest_entries: usize,
    pub custom_nodes_found: bool,
}

impl PreflightSummary {
    pub fn failures(&self) -> impl Iterator<Item = &ProbeRecord> {
        self.records.iter().filter(|r| !r.success)
    }

    /// Node actions taken because `backend` failed.
    pub fn actions_for<'a>(&'a self, backend: &'a str) -> impl Iterator<Item = &'a NodeAction> {
        self.actions.iter().filter(move |a| a.backend == backend)
    }

    pub fn disabled(&self) -> impl Iterator<Item = &NodeAction> {
        self.actions
            .iter()
            .filter(|a| a.status == DisableStatus::Disabled)
    }
}

pub fn run_preflight<P: Prober + ?Sized>(
    config: &PreflightConfig,
    prober: &P,
    checks: &[AccelCheck],
) -> anyhow::Result<PreflightSummary> {
    let mut summary = PreflightSummary::default();

    for check in checks {
        let record = probe(prober, check);
        if record.success {
            tracing::info!(name = check.name, version = ?record.version, "accelerator available");
        } else {
            tracing::warn!(name = check.name, error = ?record.error_if_any, "accelerator unavailable");
        }
        summary.records.push(record);
    }

    summary.manifest_entries = manifest::append_records(&config.manifest, &summary.records)?;

    if !config.custom_nodes.is_dir() {
        tracing::warn!(path = %config.custom_nodes.display(), "custom_nodes directory not found");
        return Ok(summary);
    }
    summary.custom_nodes_found = true;

    let failed: Vec<String> = summary.failures().map(|r| r.name.clone()).collect();
    for backend in failed {
        let nodes = dependents_of(&backend);
        if nodes.is_empty() {
            tracing::info!(backend = %backend, "no dependent custom nodes mapped");
            summary.unmapped.push(backend);
            continue;
        }
        for node in nodes {
            let (status, path) = disable_node(&config.custom_nodes.join(node))?;
            tracing::info!(backend = %backend, node, ?status, path = %path.display(), "custom node checked");
            summary.actions.push(NodeAction {
                backend: backend.clone(),
                node: node.to_string(),
                status,
                path,
            });
        }
    }

    Ok(summary)
}
