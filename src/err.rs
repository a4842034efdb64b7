use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RebuildError>;

/// Errors raised at the boundary with the external unpacker.
#[derive(Debug, Error)]
pub enum UnpackError {
    #[error("unpacker executable `{}` does not exist", path.display())]
    ToolNotFound { path: PathBuf },

    #[error("failed to launch unpacker `{}`: {source}", tool.display())]
    Spawn { tool: PathBuf, source: io::Error },

    #[error("unpacker `{}` failed on `{}` ({status})", tool.display(), installer.display())]
    Failed {
        tool: PathBuf,
        installer: PathBuf,
        status: ExitStatus,
    },
}

#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("input file `{}` does not exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("failed to resolve input path `{}`: {source}", path.display())]
    InputPath { path: PathBuf, source: io::Error },

    #[error("extraction root `{}` is not accessible: {source}", path.display())]
    ExtractionRootUnavailable { path: PathBuf, source: io::Error },

    #[error("failed to create directory `{}`: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to copy `{}` to `{}`: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to rename `{}` to `{}`: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("extraction failed: {0}")]
    Unpack(#[from] UnpackError),
}

impl RebuildError {
    /// Short name of the pipeline stage the error belongs to, for user facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            RebuildError::InputNotFound { .. } | RebuildError::InputPath { .. } => "input",
            RebuildError::Unpack(_) => "extraction",
            RebuildError::Rename { .. } => "normalization",
            RebuildError::ExtractionRootUnavailable { .. }
            | RebuildError::CreateDir { .. }
            | RebuildError::Copy { .. } => "fan-out",
        }
    }
}
