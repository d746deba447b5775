//! Accelerator import probes.

use std::path::PathBuf;
use std::process::Command;

use serde::{Deserialize, Serialize};

pub const PROBE_SOURCE: &str = "runtime-preflight";

/// One accelerator and the module names that provide it, tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccelCheck {
    pub name: &'static str,
    pub imports: &'static [&'static str],
}

pub const ACCEL_CHECKS: &[AccelCheck] = &[
    AccelCheck {
        name: "flash_attn_3",
        imports: &["flash_attn_3"],
    },
    AccelCheck {
        name: "xformers",
        imports: &["xformers"],
    },
    AccelCheck {
        name: "nunchaku",
        imports: &["nunchaku"],
    },
    AccelCheck {
        name: "spas_sage_attn",
        imports: &["spas_sage_attn", "sparse_sageattn"],
    },
    AccelCheck {
        name: "sageattention",
        imports: &["sageattention", "sageattention2"],
    },
    AccelCheck {
        name: "natten",
        imports: &["natten"],
    },
    AccelCheck {
        name: "bitsandbytes",
        imports: &["bitsandbytes"],
    },
];

/// Imports a module in the target environment.
pub trait Prober {
    /// `Ok(version)` when the import succeeds; `version` is `None` when the
    /// module has no `__version__`. `Err` carries a one-line reason.
    fn try_import(&self, module: &str) -> Result<Option<String>, String>;
}

/// A manifest entry for one accelerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRecord {
    pub name: String,
    pub version: Option<String>,
    pub source: String,
    pub success: bool,
    pub error_if_any: Option<String>,
}

/// Try each import of `check` until one succeeds. Failures are joined as
/// `module: reason | module: reason`.
pub fn probe<P: Prober + ?Sized>(prober: &P, check: &AccelCheck) -> ProbeRecord {
    let mut failures = Vec::new();

    for module in check.imports {
        match prober.try_import(module) {
            Ok(version) => {
                return ProbeRecord {
                    name: check.name.to_string(),
                    version,
                    source: PROBE_SOURCE.to_string(),
                    success: true,
                    error_if_any: None,
                };
            }
            Err(reason) => failures.push(format!("{}: {}", module, reason)),
        }
    }

    ProbeRecord {
        name: check.name.to_string(),
        version: None,
        source: PROBE_SOURCE.to_string(),
        success: false,
        error_if_any: Some(failures.join(" | ")),
    }
}

const IMPORT_AND_REPORT_VERSION: &str = "\
import importlib, sys
m = importlib.import_module(sys.argv[1])
v = getattr(m, '__version__', None)
print('' if v is None else v)
";

/// Probes by running the interpreter once per module.
#[derive(Debug, Clone)]
pub struct PythonProber {
    python: PathBuf,
}

impl PythonProber {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        PythonProber {
            python: python.into(),
        }
    }
}

impl Prober for PythonProber {
    fn try_import(&self, module: &str) -> Result<Option<String>, String> {
        let output = Command::new(&self.python)
            .arg("-s")
            .arg("-c")
            .arg(IMPORT_AND_REPORT_VERSION)
            .arg(module)
            .output()
            .map_err(|e| format!("failed to start {}: {}", self.python.display(), e))?;

        if !output.status.success() {
            // Python's last stderr line is `ExceptionType: message`.
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or("import failed")
                .to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = stdout.lines().last().unwrap_or("").trim();
        Ok((!version.is_empty()).then(|| version.to_string()))
    }
}
