//! Structural validation phase.
//!
//! Checks graph well-formedness without consulting any node registry.

pub mod required;
pub mod structural;

pub use required::{TEXT2IMG_REQUIRED, check_required_types};
pub use structural::{NO_NODES, StructureCheck, validate_structure};

/// Strictness switches. Both default to off, matching the tolerant behavior
/// of the packaging scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureOptions {
    /// Report repeated node ids instead of only logging them.
    pub reject_duplicate_ids: bool,
    /// Report a directed cycle among resolved links.
    pub reject_cycles: bool,
}

impl StructureOptions {
    pub fn strict() -> Self {
        StructureOptions {
            reject_duplicate_ids: true,
            reject_cycles: true,
        }
    }
}
