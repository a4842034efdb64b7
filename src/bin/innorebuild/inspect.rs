use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use serde_json::json;

use innorebuild::Manifest;

use crate::{init_logging, settings_from_matches};

pub fn command() -> Command {
    Command::new("inspect")
        .about("Parse an install script and print metadata, file entries and variants as JSONL")
        .arg(
            Arg::new("manifest")
                .value_name("MANIFEST")
                .required(true)
                .help("Path to install_script.iss."),
        )
}

pub fn run(matches: &ArgMatches) -> Result<()> {
    let settings = settings_from_matches(matches)?;
    init_logging(matches, None)?;

    let path = matches
        .get_one::<String>("manifest")
        .expect("required argument");

    let manifest = Manifest::from_path(path, &settings)
        .with_context(|| format!("failed to load manifest `{path}`"))?;

    println!("{}", json!({ "metadata": manifest.metadata }));
    for entry in &manifest.entries {
        println!("{}", json!({ "entry": entry }));
    }
    for (token, category) in manifest.variants.iter() {
        println!(
            "{}",
            json!({ "variant": { "token": token, "category": category } })
        );
    }
    for conflict in manifest.variants.conflicts() {
        println!("{}", json!({ "conflict": conflict }));
    }

    Ok(())
}
