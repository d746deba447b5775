//! Disabling custom nodes whose accelerator is missing.

use std::path::{Path, PathBuf};

use serde::Serialize;

pub const DISABLED_SUFFIX: &str = ".disabled";

/// Custom node directories that cannot load without the named accelerator.
pub const DEPENDENT_NODES: &[(&str, &[&str])] = &[
    ("nunchaku", &["ComfyUI-nunchaku"]),
    ("spas_sage_attn", &["ComfyUI-RadialAttn"]),
];

pub fn dependents_of(backend: &str) -> &'static [&'static str] {
    DEPENDENT_NODES
        .iter()
        .find(|(name, _)| *name == backend)
        .map(|(_, nodes)| *nodes)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableStatus {
    Disabled,
    AlreadyDisabled,
    Missing,
}

pub fn disabled_path(node_dir: &Path) -> PathBuf {
    let mut name = node_dir.file_name().unwrap_or_default().to_os_string();
    name.push(DISABLED_SUFFIX);
    node_dir.with_file_name(name)
}

/// Rename `node_dir` to `<node_dir>.disabled`. An existing disabled copy wins
/// and nothing is renamed.
pub fn disable_node(node_dir: &Path) -> std::io::Result<(DisableStatus, PathBuf)> {
    let disabled = disabled_path(node_dir);
    if disabled.exists() {
        return Ok((DisableStatus::AlreadyDisabled, disabled));
    }
    if node_dir.exists() {
        std::fs::rename(node_dir, &disabled)?;
        return Ok((DisableStatus::Disabled, disabled));
    }
    Ok((DisableStatus::Missing, disabled))
}
