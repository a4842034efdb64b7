//! Sequences unpack -> normalize -> parse -> fan-out.

use std::path::{self, Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::err::{RebuildError, Result};
use crate::fanout::{FanOutReport, OutputLayout, materialize};
use crate::fs_utils::ensure_dir;
use crate::manifest::{Manifest, MetadataKey};
use crate::placeholder::{NormalizeReport, normalize_tree};
use crate::settings::RebuildSettings;
use crate::unpack::Unpacker;

/// Directories of one run of [`Rebuild::run_in`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    /// Absolute path of the installer.
    pub installer: PathBuf,
    /// Holds the raw extraction and the output trees.
    pub work_dir: PathBuf,
    /// Raw extraction, left in place as a side artifact.
    pub extracted_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebuildSummary {
    pub manifest: Manifest,
    pub normalize: NormalizeReport,
    pub fan_out: FanOutReport,
    pub extracted_dir: PathBuf,
}

impl RebuildSummary {
    /// Writes the end-of-run summary to the log.
    pub fn log(&self) {
        info!("extraction summary");
        for key in [
            MetadataKey::AppName,
            MetadataKey::AppVersion,
            MetadataKey::AppPublisher,
            MetadataKey::AppSupportUrl,
            MetadataKey::AppComments,
        ] {
            info!("{key}: {}", self.manifest.metadata.display(key));
        }
        for (token, category) in self.manifest.variants.iter() {
            info!("variant {token} -> {category}");
        }
        for dir in self.fan_out.output_dirs.values() {
            info!("output directory: {}", dir.display());
        }
        info!("raw extraction: {}", self.extracted_dir.display());
        info!(
            "{} declared source(s) missing, {} unmapped variant token(s)",
            self.fan_out.missing_sources.len(),
            self.fan_out.unmapped_tokens.len()
        );
    }
}

#[derive(Debug, Clone)]
pub struct Rebuild {
    settings: RebuildSettings,
    output_root: PathBuf,
}

impl Rebuild {
    pub fn new(settings: RebuildSettings, output_root: impl Into<PathBuf>) -> Self {
        Rebuild {
            settings,
            output_root: output_root.into(),
        }
    }

    pub fn settings(&self) -> &RebuildSettings {
        &self.settings
    }

    /// Creates `<output_root>/<stem>_<timestamp>/<stem>_extracted` for `installer`.
    pub fn prepare(&self, installer: impl AsRef<Path>) -> Result<Workspace> {
        let installer = installer.as_ref();
        if !installer.is_file() {
            return Err(RebuildError::InputNotFound {
                path: installer.to_path_buf(),
            });
        }
        let installer = path::absolute(installer).map_err(|source| RebuildError::InputPath {
            path: installer.to_path_buf(),
            source,
        })?;

        let stem = installer
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "installer".to_owned());
        let timestamp = jiff::Zoned::now().strftime("%Y%m%d_%H%M%S").to_string();

        let work_dir = self.output_root.join(format!("{stem}_{timestamp}"));
        let extracted_dir = work_dir.join(format!("{stem}_extracted"));
        ensure_dir(&extracted_dir)?;
        info!("work directory: `{}`", work_dir.display());

        Ok(Workspace {
            installer,
            work_dir,
            extracted_dir,
        })
    }

    /// Full pipeline for `installer`. The installer itself is left untouched.
    pub fn run(&self, installer: impl AsRef<Path>, unpacker: &dyn Unpacker) -> Result<RebuildSummary> {
        let workspace = self.prepare(installer)?;
        self.run_in(&workspace, unpacker)
    }

    pub fn run_in(&self, workspace: &Workspace, unpacker: &dyn Unpacker) -> Result<RebuildSummary> {
        unpacker.unpack(&workspace.installer, &workspace.extracted_dir)?;
        self.split(&workspace.extracted_dir, &workspace.work_dir)
    }

    /// Normalizes, parses and fans out an already extracted tree. Output trees are created
    /// directly below `output_root`.
    pub fn split(
        &self,
        extracted_dir: impl AsRef<Path>,
        output_root: impl AsRef<Path>,
    ) -> Result<RebuildSummary> {
        let extracted_dir = extracted_dir.as_ref();

        let normalize = normalize_tree(extracted_dir)?;

        let manifest_path = extracted_dir.join(self.settings.get_manifest_name());
        let manifest = Manifest::load_or_empty(&manifest_path, &self.settings);
        if manifest.variants.is_empty() {
            info!("no variants found in `{}`", manifest_path.display());
        }

        let layout = OutputLayout::new(output_root.as_ref(), self.settings.get_output_prefix());
        let fan_out = materialize(
            extracted_dir,
            &manifest.entries,
            &manifest.variants,
            &layout,
        )?;

        let summary = RebuildSummary {
            manifest,
            normalize,
            fan_out,
            extracted_dir: extracted_dir.to_path_buf(),
        };
        summary.log();
        Ok(summary)
    }
}
