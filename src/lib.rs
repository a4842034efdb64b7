#![deny(unused_must_use)]
#![forbid(unsafe_code)]

//! Rebuilds per-architecture install trees from the output of an Inno Setup unpacker.
//!
//! The unpacker (`innounp`) leaves a flat tree of files plus an `install_script.iss` describing
//! where every file goes. Files that exist in several architecture flavours are written with a
//! `,<n>` suffix (`driver,2.dll`), and the script tells which `Check:` function selects each
//! flavour. This crate parses that script, derives the suffix -> architecture mapping and fans the
//! tree out into one directory per architecture.
//!
//! ```no_run
//! use innorebuild::{Manifest, OutputLayout, RebuildSettings, materialize};
//!
//! let settings = RebuildSettings::new();
//! let manifest = Manifest::load_or_empty("setup_extracted/install_script.iss", &settings);
//! let layout = OutputLayout::new("out", settings.get_output_prefix());
//! let report = materialize("setup_extracted", &manifest.entries, &manifest.variants, &layout)?;
//! println!("{} output trees", report.output_dirs.len());
//! # Ok::<(), innorebuild::err::RebuildError>(())
//! ```

pub mod err;
pub mod fanout;
pub mod manifest;
pub mod placeholder;
pub mod rebuild;
pub mod unpack;
pub mod variant;

mod fs_utils;
mod settings;

pub use fanout::{FanOutReport, OutputLayout, materialize};
pub use manifest::{FileEntry, Manifest, Metadata, MetadataKey};
pub use placeholder::{NormalizeReport, normalize_tree, strip_placeholders};
pub use rebuild::{Rebuild, RebuildSummary, Workspace};
pub use settings::RebuildSettings;
pub use unpack::{Innounp, Unpacker};
pub use variant::{Category, CheckRules, VariantCategoryMap, VariantConflict, VariantToken};
