//! Locating the pieces of a portable ComfyUI distribution on disk.

use std::path::{Path, PathBuf};

use crate::error::LoadError;

pub const PORTABLE_DIR: &str = "ComfyUI_Windows_portable";
pub const BUILDER_DIR: &str = "builder";
pub const COMFY_DIR: &str = "ComfyUI";
pub const EMBEDDED_PYTHON: &str = "python_embeded/python.exe";
pub const CUSTOM_NODES_DIR: &str = "custom_nodes";

/// Find the portable root under `base`: either `base/ComfyUI_Windows_portable`
/// or, in a build checkout, `base/builder/ComfyUI_Windows_portable`.
pub fn resolve_portable_root(base: &Path) -> Result<PathBuf, LoadError> {
    let direct = base.join(PORTABLE_DIR);
    if direct.is_dir() {
        return Ok(direct);
    }
    let nested = base.join(BUILDER_DIR).join(PORTABLE_DIR);
    if nested.is_dir() {
        return Ok(nested);
    }
    Err(LoadError::SourceNotFound {
        what: "Portable root",
        path: direct,
    })
}

/// The ComfyUI application directory inside a portable root.
pub fn comfy_dir(portable_root: &Path) -> Result<PathBuf, LoadError> {
    let dir = portable_root.join(COMFY_DIR);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(LoadError::SourceNotFound {
            what: "ComfyUI directory",
            path: dir,
        })
    }
}

pub fn embedded_python(portable_root: &Path) -> PathBuf {
    portable_root.join(EMBEDDED_PYTHON)
}

/// Interpreter for an extracted package: its embedded one when present,
/// otherwise `python` from `PATH`.
pub fn package_python(package_root: &Path) -> PathBuf {
    let embedded = embedded_python(package_root);
    if embedded.is_file() {
        return embedded;
    }
    tracing::warn!(
        path = %embedded.display(),
        "embedded interpreter not found, using python from PATH"
    );
    PathBuf::from("python")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_direct_layout_over_builder() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(PORTABLE_DIR)).unwrap();
        std::fs::create_dir_all(tmp.path().join(BUILDER_DIR).join(PORTABLE_DIR)).unwrap();
        let root = resolve_portable_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path().join(PORTABLE_DIR));
    }

    #[test]
    fn falls_back_to_builder_layout() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(BUILDER_DIR).join(PORTABLE_DIR)).unwrap();
        let root = resolve_portable_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path().join(BUILDER_DIR).join(PORTABLE_DIR));
    }

    #[test]
    fn package_python_prefers_embedded_interpreter() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(package_python(tmp.path()), PathBuf::from("python"));

        let embedded = embedded_python(tmp.path());
        std::fs::create_dir_all(embedded.parent().unwrap()).unwrap();
        std::fs::write(&embedded, "").unwrap();
        assert_eq!(package_python(tmp.path()), embedded);
    }

    #[test]
    fn missing_root_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve_portable_root(tmp.path()).unwrap_err();
        assert!(err.is_not_found());
        assert!(comfy_dir(tmp.path()).unwrap_err().is_not_found());
    }
}
