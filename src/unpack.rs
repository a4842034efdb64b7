//! The external unpacker. Everything after extraction only sees the directory it produced.

use std::path::{self, Path, PathBuf};
use std::process::Command;

use log::info;

use crate::err::UnpackError;

/// Turns a packed installer into a fully populated extraction directory.
pub trait Unpacker {
    fn unpack(&self, installer: &Path, destination: &Path) -> Result<(), UnpackError>;
}

/// Runs `innounp -x <installer>` inside the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Innounp {
    executable: PathBuf,
}

impl Innounp {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Innounp {
            executable: executable.into(),
        }
    }

    /// `bin/innounp.exe` below `base` when it exists, otherwise `innounp` from `PATH`.
    pub fn locate(base: impl AsRef<Path>) -> Self {
        let bundled = base.as_ref().join("bin").join("innounp.exe");
        if bundled.is_file() {
            Innounp::new(bundled)
        } else {
            Innounp::new("innounp")
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Only paths with a directory component are checked up front; bare names are left to the
    /// `PATH` lookup of the spawn.
    fn check_exists(&self) -> Result<(), UnpackError> {
        if self.has_dir() && !self.executable.is_file() {
            return Err(UnpackError::ToolNotFound {
                path: self.executable.clone(),
            });
        }
        Ok(())
    }

    fn has_dir(&self) -> bool {
        self.executable
            .parent()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// The child runs inside the destination directory, so relative paths have to be anchored
    /// to our own working directory first.
    fn resolved_executable(&self) -> Result<PathBuf, UnpackError> {
        if !self.has_dir() {
            return Ok(self.executable.clone());
        }
        path::absolute(&self.executable).map_err(|source| UnpackError::Spawn {
            tool: self.executable.clone(),
            source,
        })
    }
}

impl Unpacker for Innounp {
    fn unpack(&self, installer: &Path, destination: &Path) -> Result<(), UnpackError> {
        self.check_exists()?;

        let executable = self.resolved_executable()?;
        let installer = path::absolute(installer).map_err(|source| UnpackError::Spawn {
            tool: executable.clone(),
            source,
        })?;

        info!(
            "running `{} -x {}` in `{}`",
            executable.display(),
            installer.display(),
            destination.display()
        );

        let status = Command::new(&executable)
            .arg("-x")
            .arg(&installer)
            .current_dir(destination)
            .status()
            .map_err(|source| UnpackError::Spawn {
                tool: executable.clone(),
                source,
            })?;

        if !status.success() {
            return Err(UnpackError::Failed {
                tool: executable,
                installer,
                status,
            });
        }

        info!("extraction completed for `{}`", installer.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_with_directory_is_reported() {
        let d = tempfile::tempdir().unwrap();
        let unpacker = Innounp::new(d.path().join("bin").join("innounp.exe"));
        let err = unpacker.unpack(Path::new("setup.exe"), d.path()).unwrap_err();
        assert!(matches!(err, UnpackError::ToolNotFound { .. }));
    }

    #[test]
    fn test_locate_falls_back_to_path_lookup() {
        let d = tempfile::tempdir().unwrap();
        assert_eq!(Innounp::locate(d.path()).executable(), Path::new("innounp"));

        let bundled = d.path().join("bin").join("innounp.exe");
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, b"").unwrap();
        assert_eq!(Innounp::locate(d.path()).executable(), bundled.as_path());
    }

    #[test]
    fn test_unspawnable_tool_is_reported() {
        let d = tempfile::tempdir().unwrap();
        let unpacker = Innounp::new("innorebuild-test-no-such-unpacker");
        let err = unpacker.unpack(Path::new("setup.exe"), d.path()).unwrap_err();
        assert!(matches!(err, UnpackError::Spawn { .. }));
    }
}
