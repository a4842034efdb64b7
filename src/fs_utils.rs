use std::fs;
use std::path::Path;

use filetime::FileTime;
use log::debug;

use crate::err::{RebuildError, Result};

/// `create_dir_all` that maps failures to [`RebuildError::CreateDir`]. Existing directories are
/// fine.
pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| RebuildError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Copies `from` to `to`, creating parent directories and overwriting an existing file.
/// Permissions and access/modification times are carried over.
pub(crate) fn copy_preserving(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }

    let copy_err = |source| RebuildError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    fs::copy(from, to).map_err(copy_err)?;

    let metadata = fs::metadata(from).map_err(copy_err)?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    let atime = FileTime::from_last_access_time(&metadata);
    filetime::set_file_times(to, atime, mtime).map_err(copy_err)?;

    debug!("copied `{}` -> `{}`", from.display(), to.display());
    Ok(())
}
