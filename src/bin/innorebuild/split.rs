use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command};

use innorebuild::Rebuild;

use std::path::PathBuf;

use crate::{init_logging, log_file_path, print_summary, settings_from_matches};

pub fn command() -> Command {
    Command::new("split")
        .about("Rebuild per-architecture trees from an already unpacked installer")
        .arg(
            Arg::new("extracted")
                .value_name("EXTRACTED_DIR")
                .required(true)
                .help("Directory produced by `innounp -x`. Placeholder names inside it are renamed in place."),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .help("Where to create the output directories (default: parent of EXTRACTED_DIR)."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let settings = settings_from_matches(matches)?;

    let extracted = PathBuf::from(
        matches
            .get_one::<String>("extracted")
            .expect("required argument"),
    );
    if !extracted.is_dir() {
        bail!("`{}` is not a directory", extracted.display());
    }

    let output_dir = match matches.get_one::<String>("output-dir") {
        Some(dir) => PathBuf::from(dir),
        None => extracted
            .canonicalize()
            .with_context(|| format!("failed to resolve `{}`", extracted.display()))?
            .parent()
            .map(PathBuf::from)
            .context("extracted directory has no parent, pass --output-dir")?,
    };

    let log_file = log_file_path(matches, None);
    init_logging(matches, log_file.as_deref())?;

    let summary = Rebuild::new(settings, &output_dir)
        .split(&extracted, &output_dir)
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{stage} stage failed"))
        })?;

    print_summary(&summary, log_file.as_deref());
    Ok(())
}
