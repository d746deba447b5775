//! Accelerator preflight: probing, manifest appends, and node disabling.

use std::collections::HashMap;

use serde_json::{Value, json};
use workflow_qa::preflight::manifest::{self, MANIFEST_FILE};
use workflow_qa::preflight::{
    ACCEL_CHECKS, AccelCheck, DisableStatus, PreflightConfig, Prober, probe, run_preflight,
};

/// Prober answering from a fixed table; unknown modules fail to import.
struct FakeProber {
    available: HashMap<&'static str, Option<&'static str>>,
}

impl FakeProber {
    fn with(available: &[(&'static str, Option<&'static str>)]) -> Self {
        FakeProber {
            available: available.iter().copied().collect(),
        }
    }
}

impl Prober for FakeProber {
    fn try_import(&self, module: &str) -> Result<Option<String>, String> {
        match self.available.get(module) {
            Some(version) => Ok(version.map(str::to_string)),
            None => Err(format!("ModuleNotFoundError: No module named '{}'", module)),
        }
    }
}

fn package_root() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let custom_nodes = tmp.path().join("ComfyUI").join("custom_nodes");
    std::fs::create_dir_all(custom_nodes.join("ComfyUI-nunchaku")).unwrap();
    std::fs::create_dir_all(custom_nodes.join("ComfyUI-RadialAttn")).unwrap();
    tmp
}

#[test]
fn probe_falls_back_to_alternate_import() {
    let check = AccelCheck {
        name: "sageattention",
        imports: &["sageattention", "sageattention2"],
    };
    let record = probe(&FakeProber::with(&[("sageattention2", Some("2.1.1"))]), &check);
    assert!(record.success);
    assert_eq!(record.version.as_deref(), Some("2.1.1"));
    assert_eq!(record.source, "runtime-preflight");
    assert_eq!(record.error_if_any, None);
}

#[test]
fn probe_joins_every_failure() {
    let check = AccelCheck {
        name: "spas_sage_attn",
        imports: &["spas_sage_attn", "sparse_sageattn"],
    };
    let record = probe(&FakeProber::with(&[]), &check);
    assert!(!record.success);
    assert_eq!(
        record.error_if_any.as_deref(),
        Some(
            "spas_sage_attn: ModuleNotFoundError: No module named 'spas_sage_attn' | \
             sparse_sageattn: ModuleNotFoundError: No module named 'sparse_sageattn'"
        )
    );
}

#[test]
fn missing_accelerators_disable_dependent_nodes() {
    let root = package_root();
    let config = PreflightConfig::for_root(root.path());
    let prober = FakeProber::with(&[("xformers", Some("0.0.28")), ("natten", None)]);

    let summary = run_preflight(&config, &prober, ACCEL_CHECKS).unwrap();

    assert_eq!(summary.records.len(), ACCEL_CHECKS.len());
    assert_eq!(summary.failures().count(), 5);
    assert!(summary.custom_nodes_found);

    let disabled: Vec<&str> = summary.disabled().map(|a| a.node.as_str()).collect();
    assert_eq!(disabled, vec!["ComfyUI-nunchaku", "ComfyUI-RadialAttn"]);
    assert_eq!(
        summary.unmapped,
        vec!["flash_attn_3", "sageattention", "bitsandbytes"]
    );
    assert_eq!(summary.actions_for("nunchaku").count(), 1);
    assert_eq!(summary.actions_for("bitsandbytes").count(), 0);
    assert!(config.custom_nodes.join("ComfyUI-nunchaku.disabled").is_dir());
    assert!(!config.custom_nodes.join("ComfyUI-nunchaku").exists());

    // A second run finds them already disabled and renames nothing.
    let again = run_preflight(&config, &prober, ACCEL_CHECKS).unwrap();
    assert!(
        again
            .actions
            .iter()
            .all(|a| a.status == DisableStatus::AlreadyDisabled)
    );
    assert_eq!(again.manifest_entries, 2 * ACCEL_CHECKS.len());
}

#[test]
fn available_accelerators_leave_nodes_alone() {
    let root = package_root();
    let config = PreflightConfig::for_root(root.path());
    let everything: Vec<(&'static str, Option<&'static str>)> = ACCEL_CHECKS
        .iter()
        .map(|c| (c.imports[0], Some("1.0")))
        .collect();

    let summary = run_preflight(&config, &FakeProber::with(&everything), ACCEL_CHECKS).unwrap();
    assert!(summary.actions.is_empty());
    assert!(config.custom_nodes.join("ComfyUI-nunchaku").is_dir());
}

#[test]
fn missing_custom_nodes_directory_is_not_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let config = PreflightConfig::for_root(tmp.path());
    let summary = run_preflight(&config, &FakeProber::with(&[]), ACCEL_CHECKS).unwrap();
    assert!(!summary.custom_nodes_found);
    assert!(summary.actions.is_empty());
    assert!(summary.unmapped.is_empty());
    assert!(tmp.path().join(MANIFEST_FILE).is_file());
}

#[test]
fn manifest_appends_without_dedup() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(MANIFEST_FILE);
    std::fs::write(&path, r#"{"name": "legacy", "success": true}"#).unwrap();

    let record = probe(
        &FakeProber::with(&[("natten", Some("0.17.1"))]),
        &AccelCheck {
            name: "natten",
            imports: &["natten"],
        },
    );
    let total = manifest::append_records(&path, &[record.clone(), record]).unwrap();
    assert_eq!(total, 3);

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written[0], json!({"name": "legacy", "success": true}));
    assert_eq!(
        written[1],
        json!({
            "name": "natten",
            "version": "0.17.1",
            "source": "runtime-preflight",
            "success": true,
            "error_if_any": null
        })
    );
    assert_eq!(written[1], written[2]);
}

#[test]
fn unreadable_manifest_is_replaced() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(MANIFEST_FILE);
    std::fs::write(&path, "{ truncated").unwrap();
    assert!(manifest::load_existing(&path).unwrap().is_empty());
}
