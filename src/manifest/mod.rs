//! Parsing of the `install_script.iss` written by `innounp`.
//!
//! This module is split into:
//! - `decode`: tolerant byte -> text decoding (BOM detection, optional ANSI code page)
//! - `parse`: the line grammar for directives and `[Files]` entries
//! - `types`: the parsed model ([`Metadata`], [`FileEntry`])
//! - `error`: failures to locate or decode the script

mod decode;
mod error;
mod parse;
mod types;

use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::settings::RebuildSettings;
use crate::variant::VariantCategoryMap;

pub use decode::decode;
pub use error::ManifestError;
pub use types::{FileEntry, Metadata, MetadataKey};

/// Everything the fan-out needs from the script. Read-only once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub metadata: Metadata,
    pub entries: Vec<FileEntry>,
    pub variants: VariantCategoryMap,
}

impl Manifest {
    /// Parses script text with the default `Check:` rules.
    pub fn parse(text: &str) -> Self {
        Manifest::parse_with_settings(text, &RebuildSettings::default())
    }

    pub fn parse_with_settings(text: &str, settings: &RebuildSettings) -> Self {
        let metadata = parse::parse_metadata(text);
        let entries = parse::parse_file_entries(text);
        let variants = parse::infer_variants(&entries, settings.get_check_rules());

        Manifest {
            metadata,
            entries,
            variants,
        }
    }

    pub fn from_bytes(bytes: &[u8], settings: &RebuildSettings) -> Result<Self, ManifestError> {
        let text = decode(bytes, settings.get_ansi_codec())?;
        Ok(Manifest::parse_with_settings(&text, settings))
    }

    pub fn from_path(path: impl AsRef<Path>, settings: &RebuildSettings) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ManifestError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ManifestError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let manifest = Manifest::from_bytes(&bytes, settings)?;
        info!(
            "parsed `{}`: {} metadata field(s), {} file entries, {} variant(s)",
            path.display(),
            manifest.metadata.len(),
            manifest.entries.len(),
            manifest.variants.len()
        );
        Ok(manifest)
    }

    /// Like [`Manifest::from_path`], but any failure yields an empty manifest. An empty variant
    /// map means no architecture could be determined.
    pub fn load_or_empty(path: impl AsRef<Path>, settings: &RebuildSettings) -> Self {
        match Manifest::from_path(path, settings) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("{e}; continuing without a manifest");
                Manifest::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.entries.is_empty() && self.variants.is_empty()
    }
}
