//! Fans an extracted tree out into one output tree per category.
//!
//! Three steps run in order over the same extraction root:
//! 1. declared entries: every `[Files]` entry is copied to `<category>/<DestDir>/<DestName>`,
//! 2. tagged discovery: every file named `name,<token>.ext` is copied as `name.ext` into its
//!    category, at the same relative directory,
//! 3. common replication: every untagged file is copied into every resolved category.
//!
//! A file can be copied by both step 1 and step 2; the copies are identical and nothing is
//! deduplicated.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::err::{RebuildError, Result};
use crate::fs_utils::{copy_preserving, ensure_dir};
use crate::manifest::FileEntry;
use crate::placeholder::resolve_manifest_path;
use crate::variant::{Category, VariantCategoryMap, VariantToken};

/// Where each category's output tree lives: `<root>/<prefix><category>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    prefix: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        OutputLayout {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, category: &Category) -> PathBuf {
        self.root.join(format!("{}{}", self.prefix, category))
    }
}

/// A declared entry whose source was not found in the extraction root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSource {
    pub line: usize,
    pub source: String,
    pub resolved: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub declared_copies: usize,
    pub tagged_copies: usize,
    pub common_copies: usize,
    pub missing_sources: Vec<MissingSource>,
    /// Tokens found on disk (or in the manifest) without a mapping; their files went to
    /// [`Category::Unknown`].
    pub unmapped_tokens: BTreeSet<VariantToken>,
    pub walk_errors: usize,
    /// Output trees that exist after the run.
    pub output_dirs: BTreeMap<Category, PathBuf>,
}

impl FanOutReport {
    pub fn total_copies(&self) -> usize {
        self.declared_copies + self.tagged_copies + self.common_copies
    }
}

/// Splits the variant marker off a file name.
///
/// `driver,2.dll` -> (`2`, `driver.dll`). A name whose marker follows the extension
/// (`app.exe,1`) is handled the same way. An empty marker (`notes,.txt`) still tags the file, with
/// an empty token that no manifest maps. Returns `None` for names without a comma.
pub fn split_variant_suffix(file_name: &str) -> Option<(VariantToken, String)> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;

    let (base, token, rest) = match stem.rsplit_once(',') {
        Some((base, token)) => (base, token, &file_name[stem.len()..]),
        None => {
            let (base, token) = file_name.rsplit_once(',')?;
            (base, token, "")
        }
    };

    Some((VariantToken::new(token), format!("{base}{rest}")))
}

/// Materializes one output tree per category under `layout`.
///
/// Only an unusable `extraction_root` or a failing copy abort the run; missing declared sources,
/// unmapped tokens and unreadable walk entries are logged and reported.
pub fn materialize(
    extraction_root: impl AsRef<Path>,
    entries: &[FileEntry],
    variants: &VariantCategoryMap,
    layout: &OutputLayout,
) -> Result<FanOutReport> {
    let root = extraction_root.as_ref();
    let metadata = fs::metadata(root).map_err(|source| RebuildError::ExtractionRootUnavailable {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(RebuildError::ExtractionRootUnavailable {
            path: root.to_path_buf(),
            source: io::Error::other("not a directory"),
        });
    }

    let mut fan_out = FanOut {
        root,
        variants,
        layout,
        report: FanOutReport::default(),
    };

    for entry in entries {
        fan_out.place_declared(entry)?;
    }

    let common = fan_out.place_tagged()?;
    fan_out.replicate_common(&common)?;

    let report = fan_out.report;
    info!(
        "fan-out finished: {} declared, {} tagged, {} common copies into {} tree(s)",
        report.declared_copies,
        report.tagged_copies,
        report.common_copies,
        report.output_dirs.len()
    );
    Ok(report)
}

struct FanOut<'a> {
    root: &'a Path,
    variants: &'a VariantCategoryMap,
    layout: &'a OutputLayout,
    report: FanOutReport,
}

impl FanOut<'_> {
    /// Output directory of `category`, created on first use.
    fn open(&mut self, category: &Category) -> Result<PathBuf> {
        if let Some(dir) = self.report.output_dirs.get(category) {
            return Ok(dir.clone());
        }

        let dir = self.layout.dir(category);
        ensure_dir(&dir)?;
        debug!("opened output tree `{}`", dir.display());
        self.report.output_dirs.insert(category.clone(), dir.clone());
        Ok(dir)
    }

    fn resolve(&mut self, token: VariantToken) -> Category {
        let category = self.variants.resolve(&token);
        if category == Category::Unknown {
            self.report.unmapped_tokens.insert(token);
        }
        category
    }

    fn place_declared(&mut self, entry: &FileEntry) -> Result<()> {
        let source = resolve_manifest_path(self.root, &entry.source);

        // Entries without a token are the same file for every architecture.
        let categories = match VariantToken::from_source_pattern(&entry.source) {
            Some(token) => vec![self.resolve(token)],
            None => self.variants.categories(),
        };

        if !source.is_file() {
            warn!(
                "manifest line {}: source `{}` not found at `{}`, skipping",
                entry.line,
                entry.source,
                source.display()
            );
            self.report.missing_sources.push(MissingSource {
                line: entry.line,
                source: entry.source.clone(),
                resolved: source,
            });
            return Ok(());
        }

        let dest_name = if entry.dest_name.trim().is_empty() {
            source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            entry.dest_name.clone()
        };

        for category in categories {
            let dir = self.open(&category)?;
            let destination =
                resolve_manifest_path(&resolve_manifest_path(&dir, &entry.dest_dir), &dest_name);
            copy_preserving(&source, &destination)?;
            info!("copied `{}` (variant: {category})", source.display());
            self.report.declared_copies += 1;
        }

        Ok(())
    }

    /// Copies every tagged file to its category and returns the untagged files, relative to the
    /// extraction root.
    fn place_tagged(&mut self) -> Result<Vec<PathBuf>> {
        let mut common = vec![];

        // Output trees may live inside the extraction root; never walk into them.
        let layout_root = self.layout.root().to_path_buf();
        let prefix = self.layout.prefix.clone();
        let walker = WalkDir::new(self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                let is_output_tree = e.file_type().is_dir()
                    && e.path().parent() == Some(layout_root.as_path())
                    && e.file_name().to_string_lossy().starts_with(prefix.as_str());
                !is_output_tree
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    self.report.walk_errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(self.root) else {
                continue;
            };
            let relative = relative.to_path_buf();

            let tagged = entry.file_name().to_str().and_then(split_variant_suffix);
            let Some((token, clean_name)) = tagged else {
                common.push(relative);
                continue;
            };

            let category = self.resolve(token);
            let dir = self.open(&category)?;
            let destination = match relative.parent() {
                Some(parent) => dir.join(parent).join(&clean_name),
                None => dir.join(&clean_name),
            };

            copy_preserving(entry.path(), &destination)?;
            info!(
                "copied `{}` as `{clean_name}` (variant: {category})",
                relative.display()
            );
            self.report.tagged_copies += 1;
        }

        debug!("{} common file(s) found", common.len());
        Ok(common)
    }

    fn replicate_common(&mut self, common: &[PathBuf]) -> Result<()> {
        let mut categories: BTreeSet<Category> = self.variants.categories().into_iter().collect();
        categories.extend(self.report.output_dirs.keys().cloned());

        if categories.is_empty() {
            if !common.is_empty() {
                warn!(
                    "no variants resolved, {} common file(s) not copied anywhere",
                    common.len()
                );
            }
            return Ok(());
        }

        for category in &categories {
            let dir = self.open(category)?;
            for relative in common {
                copy_preserving(&self.root.join(relative), &dir.join(relative))?;
                self.report.common_copies += 1;
            }
            info!("copied {} common file(s) into `{}`", common.len(), dir.display());
        }

        Ok(())
    }
}
