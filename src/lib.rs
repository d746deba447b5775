pub mod error;
pub mod parse;
pub mod portable;
pub mod preflight;
pub mod registry;
pub mod report;
pub mod validate;

pub use report::{Outcome, ValidateOptions, ValidationReport, Validator, WorkflowSource, validate};
