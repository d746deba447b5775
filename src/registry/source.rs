//! Ways of obtaining a node registry.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::NodeRegistry;
use crate::error::LoadError;
use crate::portable;

/// Something that can produce the registry on demand. Fetching may be
/// expensive (a full application import), so callers only fetch once the
/// workflow has passed the structural stage.
pub trait RegistrySource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Cow<'_, NodeRegistry>, LoadError>;
}

impl RegistrySource for NodeRegistry {
    fn describe(&self) -> String {
        "static registry".to_string()
    }

    fn fetch(&self) -> Result<Cow<'_, NodeRegistry>, LoadError> {
        Ok(Cow::Borrowed(self))
    }
}

/// Registry read from a JSON file: a list of names, or an object keyed by
/// type name.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRegistry { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistrySource for JsonFileRegistry {
    fn describe(&self) -> String {
        format!("registry file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Cow<'_, NodeRegistry>, LoadError> {
        if !self.path.is_file() {
            return Err(LoadError::SourceNotFound {
                what: "Registry file",
                path: self.path.clone(),
            });
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            LoadError::RegistryUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let registry = NodeRegistry::from_json(&text).map_err(|e| {
            LoadError::RegistryUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        tracing::info!(path = %self.path.display(), types = registry.len(), "loaded registry file");
        Ok(Cow::Owned(registry))
    }
}

const DUMP_NODE_CLASS_MAPPINGS: &str = "\
import json, sys
sys.path.insert(0, sys.argv[1])
import nodes
print(json.dumps(sorted(nodes.NODE_CLASS_MAPPINGS)))
";

/// Registry taken from a live ComfyUI install by importing its `nodes`
/// module with the distribution's embedded interpreter.
#[derive(Debug, Clone)]
pub struct PythonRegistry {
    base: PathBuf,
    python: Option<PathBuf>,
}

impl PythonRegistry {
    /// `base` is the repository or extracted package root that contains the
    /// portable distribution.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        PythonRegistry {
            base: base.into(),
            python: None,
        }
    }

    /// Use this interpreter instead of the embedded one.
    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = Some(python.into());
        self
    }
}

impl RegistrySource for PythonRegistry {
    fn describe(&self) -> String {
        format!("ComfyUI under {}", self.base.display())
    }

    fn fetch(&self) -> Result<Cow<'_, NodeRegistry>, LoadError> {
        let root = portable::resolve_portable_root(&self.base)?;
        let comfy = portable::comfy_dir(&root)?;
        let python = self
            .python
            .clone()
            .unwrap_or_else(|| portable::embedded_python(&root));

        tracing::info!(python = %python.display(), comfy = %comfy.display(), "importing node registry");
        let output = Command::new(&python)
            .arg("-s")
            .arg("-c")
            .arg(DUMP_NODE_CLASS_MAPPINGS)
            .arg(&comfy)
            .current_dir(&comfy)
            .output()
            .map_err(|e| {
                LoadError::RegistryUnavailable(format!(
                    "failed to start {}: {}",
                    python.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output");
            return Err(LoadError::RegistryUnavailable(format!(
                "importing nodes failed ({}): {}",
                output.status,
                reason.trim()
            )));
        }

        // Custom nodes may print while importing; the dump is the last line.
        let stdout = String::from_utf8_lossy(&output.stdout);
        let last = stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| LoadError::RegistryUnavailable("importing nodes printed nothing".into()))?;
        let registry = NodeRegistry::from_json(last).map_err(|e| {
            LoadError::RegistryUnavailable(format!("unexpected registry dump: {}", e))
        })?;

        tracing::info!(types = registry.len(), "imported node registry");
        Ok(Cow::Owned(registry))
    }
}
