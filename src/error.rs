//! Unified error types used across all validation stages.

use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Structure,
    Registry,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Load => write!(f, "Load"),
            Stage::Structure => write!(f, "Structure"),
            Stage::Registry => write!(f, "Registry"),
        }
    }
}

/// A single finding reported by one of the stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaError {
    pub code: String,
    pub stage: Stage,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for QaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.stage, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.stage, self.code, self.message),
        }
    }
}

impl std::error::Error for QaError {}

impl QaError {
    pub fn load(code: &str, message: impl Into<String>) -> Self {
        QaError {
            code: code.into(),
            stage: Stage::Load,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn structure(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        QaError {
            code: code.into(),
            stage: Stage::Structure,
            message: message.into(),
            node_id,
        }
    }

    pub fn registry(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        QaError {
            code: code.into(),
            stage: Stage::Registry,
            message: message.into(),
            node_id,
        }
    }
}

/// Fatal failures: the run cannot continue past the stage that raised them.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Workflow file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Invalid JSON in workflow: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized workflow shape: {0}")]
    UnrecognizedShape(String),

    #[error("{what} not found: {}", path.display())]
    SourceNotFound { what: &'static str, path: PathBuf },

    #[error("Node registry unavailable: {0}")]
    RegistryUnavailable(String),
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::NotFound { .. } => "L001",
            LoadError::Parse(_) => "L002",
            LoadError::Io { .. } => "L003",
            LoadError::UnrecognizedShape(_) => "L004",
            LoadError::SourceNotFound { .. } => "R000",
            LoadError::RegistryUnavailable(_) => "R000",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LoadError::NotFound { .. } | LoadError::SourceNotFound { .. }
        )
    }
}

impl From<&LoadError> for QaError {
    fn from(e: &LoadError) -> Self {
        let stage = match e {
            LoadError::SourceNotFound { .. } | LoadError::RegistryUnavailable(_) => {
                Stage::Registry
            }
            _ => Stage::Load,
        };
        QaError {
            code: e.code().to_string(),
            stage,
            message: e.to_string(),
            node_id: None,
        }
    }
}
