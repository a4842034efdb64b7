use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest `{}` does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read manifest `{}`: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to decode manifest as {encoding}: {message}")]
    Decode {
        encoding: &'static str,
        message: String,
    },
}

pub(super) type Result<T> = std::result::Result<T, ManifestError>;
