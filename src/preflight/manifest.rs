//! Append-only JSON manifest of probe results.

use std::path::Path;

use serde_json::Value;

use super::probe::ProbeRecord;

pub const MANIFEST_FILE: &str = "accel_manifest.json";

/// Read the entries already in the manifest. A missing file is empty, a
/// single object is wrapped into a list, and an unreadable file is logged
/// and replaced.
pub fn load_existing(path: &Path) -> std::io::Result<Vec<Value>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let text = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(other) => Ok(vec![other]),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse existing manifest; overwriting");
            Ok(vec![])
        }
    }
}

/// Write `existing` followed by `records`. No deduplication.
pub fn write_manifest(path: &Path, existing: Vec<Value>, records: &[ProbeRecord]) -> anyhow::Result<()> {
    let mut combined = existing;
    for record in records {
        combined.push(serde_json::to_value(record)?);
    }
    let json = serde_json::to_string_pretty(&combined)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), entries = combined.len(), "wrote accelerator preflight results");
    Ok(())
}

/// Load, append and write back in one step.
pub fn append_records(path: &Path, records: &[ProbeRecord]) -> anyhow::Result<usize> {
    let existing = load_existing(path)?;
    let total = existing.len() + records.len();
    write_manifest(path, existing, records)?;
    Ok(total)
}
