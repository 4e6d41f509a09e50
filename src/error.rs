use crate::artifact::ArtifactError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fault,
    Emission,
    Index,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fault => "fault",
            Stage::Emission => "emission",
            Stage::Index => "index",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load {artifact} from {}: {source}", path.display())]
    ArtifactLoad {
        artifact: &'static str,
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
    #[error("{stage} stage artifact mismatch: {reason}")]
    ArtifactMismatch { stage: Stage, reason: String },
}

impl AppError {
    pub fn mismatch(stage: Stage, reason: impl Into<String>) -> Self {
        AppError::ArtifactMismatch {
            stage,
            reason: reason.into(),
        }
    }
}
