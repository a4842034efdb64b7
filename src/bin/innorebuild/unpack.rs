use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use dialoguer::Input;
use log::info;

use innorebuild::{Innounp, Rebuild};

use std::path::PathBuf;

use crate::{init_logging, log_file_path, print_summary, settings_from_matches};

pub fn command() -> Command {
    Command::new("unpack")
        .about("Unpack an installer with innounp and rebuild one tree per architecture")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Inno Setup installer. Prompted for when omitted."),
        )
        .arg(
            Arg::new("innounp")
                .long("innounp")
                .value_name("PATH")
                .help("innounp executable (default: bin/innounp.exe if present, otherwise innounp from PATH)."),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .default_value(".")
                .help("Directory in which the work directory is created."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let settings = settings_from_matches(matches)?;

    let input = match matches.get_one::<String>("input") {
        Some(input) => PathBuf::from(input),
        None => PathBuf::from(
            Input::<String>::new()
                .with_prompt("Inno Setup File")
                .interact_text()
                .context("failed to read the installer path")?,
        ),
    };

    let unpacker = match matches.get_one::<String>("innounp") {
        Some(path) => Innounp::new(path),
        None => Innounp::locate(std::env::current_dir().context("failed to read current dir")?),
    };

    let output_dir = PathBuf::from(matches.get_one::<String>("output-dir").expect("has default"));
    let rebuild = Rebuild::new(settings, output_dir);

    let workspace = rebuild
        .prepare(&input)
        .with_context(|| format!("failed to prepare work directory for `{}`", input.display()))?;

    let log_file = log_file_path(matches, Some(workspace.work_dir.join("innorebuild.log")));
    init_logging(matches, log_file.as_deref())?;
    info!("input file: `{}`", input.display());
    info!("unpacker: `{}`", unpacker.executable().display());

    let summary = rebuild
        .run_in(&workspace, &unpacker)
        .map_err(|e| {
            let stage = e.stage();
            anyhow::Error::new(e).context(format!("{stage} stage failed"))
        })?;

    print_summary(&summary, log_file.as_deref());
    Ok(())
}
