//! Removal of Inno Setup placeholder brackets (`{app}`, `{sys}`, ...) from names.
//!
//! `innounp` writes constants verbatim as directory names (`{app}\bin\tool.exe`). Every path in
//! the extracted tree and every path taken from the manifest goes through the same stripping, so
//! the two always agree on where a file lives.

use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::err::{RebuildError, Result};

/// Removes every `{` and `}` from `name`.
pub fn strip_placeholders(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '{' | '}')).collect()
}

/// Turns a manifest path (`{app}\plugins\a,1.dll`) into a path below `root`.
///
/// Both `\` and `/` are separators and placeholders are stripped from each component. Only plain
/// names are kept: empty components, `.`, `..`, roots and drive prefixes are dropped, so the result
/// never leaves `root`.
pub fn resolve_manifest_path(root: &Path, pattern: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for part in pattern.split(['\\', '/']) {
        let part = strip_placeholders(part.trim());
        for component in Path::new(&part).components() {
            match component {
                Component::Normal(name) => out.push(name),
                Component::CurDir => {}
                other => warn!(
                    "dropping `{}` from manifest path `{pattern}`",
                    other.as_os_str().to_string_lossy()
                ),
            }
        }
    }
    out
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// `(from, to)` pairs that were renamed, in the order they were applied.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Renames that were skipped because the target already existed.
    pub collisions: Vec<(PathBuf, PathBuf)>,
}

/// Strips placeholder brackets from every file and directory name below `root`.
///
/// The tree is fully enumerated before anything is renamed. Entries are ordered contents first,
/// so a directory is only renamed after everything inside it, and the collected child paths stay
/// valid while the pass runs.
pub fn normalize_tree(root: impl AsRef<Path>) -> Result<NormalizeReport> {
    let root = root.as_ref();
    fs::metadata(root).map_err(|source| RebuildError::ExtractionRootUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut planned = vec![];
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry during normalization: {e}");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        let stripped = strip_placeholders(&name);
        if stripped != name {
            let to = entry.path().with_file_name(stripped);
            planned.push((entry.path().to_path_buf(), to));
        }
    }

    debug!("normalization planned {} rename(s)", planned.len());

    let mut report = NormalizeReport::default();
    for (from, to) in planned {
        if to.exists() {
            warn!(
                "not renaming `{}`: `{}` already exists",
                from.display(),
                to.display()
            );
            report.collisions.push((from, to));
            continue;
        }

        fs::rename(&from, &to).map_err(|source| RebuildError::Rename {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
        info!("renamed `{}` to `{}`", from.display(), to.display());
        report.renamed.push((from, to));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_placeholders() {
        assert_eq!(strip_placeholders("{app}"), "app");
        assert_eq!(strip_placeholders("{commonappdata}x{"), "commonappdatax");
        assert_eq!(strip_placeholders("plain,1.dll"), "plain,1.dll");
    }

    #[test]
    fn test_resolve_manifest_path_splits_both_separators() {
        let root = Path::new("root");
        assert_eq!(
            resolve_manifest_path(root, r"{app}\plugins/a,1.dll"),
            root.join("app").join("plugins").join("a,1.dll")
        );
        assert_eq!(resolve_manifest_path(root, r"{app}\"), root.join("app"));
        assert_eq!(resolve_manifest_path(root, ""), root.to_path_buf());
    }

    #[test]
    fn test_resolve_manifest_path_stays_below_root() {
        let root = Path::new("root");
        assert_eq!(
            resolve_manifest_path(root, r"{app}\..\..\escaped"),
            root.join("app").join("escaped")
        );
        assert_eq!(
            resolve_manifest_path(root, r"\\server\share\.\a.dll"),
            root.join("server").join("share").join("a.dll")
        );
        assert_eq!(resolve_manifest_path(root, "../.."), root.to_path_buf());
    }

    #[test]
    fn test_normalize_tree_renames_nested_entries() {
        let d = tempfile::tempdir().unwrap();
        let nested = d.path().join("{app}").join("{sub}");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("{x}.txt"), b"x").unwrap();

        let report = normalize_tree(d.path()).unwrap();

        assert_eq!(report.renamed.len(), 3);
        assert!(report.collisions.is_empty());
        assert_eq!(
            fs::read(d.path().join("app").join("sub").join("x.txt")).unwrap(),
            b"x"
        );
        assert!(!d.path().join("{app}").exists());
    }

    #[test]
    fn test_normalize_tree_reports_collisions() {
        let d = tempfile::tempdir().unwrap();
        fs::write(d.path().join("{a}.txt"), b"braced").unwrap();
        fs::write(d.path().join("a.txt"), b"plain").unwrap();

        let report = normalize_tree(d.path()).unwrap();

        assert!(report.renamed.is_empty());
        assert_eq!(report.collisions.len(), 1);
        assert_eq!(fs::read(d.path().join("a.txt")).unwrap(), b"plain");
    }

    #[test]
    fn test_normalize_tree_missing_root_is_fatal() {
        let d = tempfile::tempdir().unwrap();
        let err = normalize_tree(d.path().join("missing")).unwrap_err();
        assert!(matches!(err, RebuildError::ExtractionRootUnavailable { .. }));
    }
}
