use anyhow::{Context, Result, bail};
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use encoding::all::encodings;
use indoc::indoc;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use innorebuild::{CheckRules, MetadataKey, RebuildSettings, RebuildSummary};

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

mod inspect;
mod split;
mod unpack;

/// Builds [`RebuildSettings`] from the global options.
fn settings_from_matches(matches: &ArgMatches) -> Result<RebuildSettings> {
    let mut rules = CheckRules::default();
    if let Some(values) = matches.get_many::<String>("check") {
        for value in values {
            let Some((check, category)) = CheckRules::parse_rule(value) else {
                bail!("invalid --check value `{value}`, expected CHECK=CATEGORY");
            };
            rules = rules.with_rule(check, category);
        }
    }

    let ansi_codec = match matches.get_one::<String>("ansi-codec") {
        Some(name) => Some(
            *encodings()
                .iter()
                .find(|c| c.name() == name.as_str())
                .context("possible values are derived from `encodings()`")?,
        ),
        None => None,
    };

    Ok(RebuildSettings::new()
        .check_rules(rules)
        .manifest_name(
            matches
                .get_one::<String>("manifest-name")
                .expect("has default")
                .as_str(),
        )
        .output_prefix(
            matches
                .get_one::<String>("output-prefix")
                .expect("has default")
                .as_str(),
        )
        .ansi_codec(ansi_codec))
}

fn verbosity(matches: &ArgMatches) -> LevelFilter {
    match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logs to stderr at the `-v` level, and appends timestamped lines to `log_file` when given.
fn init_logging(matches: &ArgMatches, log_file: Option<&Path>) -> Result<()> {
    let level = verbosity(matches);
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file `{}`", path.display()))?;
        loggers.push(WriteLogger::new(level.max(LevelFilter::Info), config, file));
    }

    CombinedLogger::init(loggers).context("failed to initialize logging")
}

fn print_summary(summary: &RebuildSummary, log_file: Option<&Path>) {
    let metadata = &summary.manifest.metadata;

    println!();
    println!("#####--- Extraction Summary ---#####");
    println!("App Name: {}", metadata.display(MetadataKey::AppName));
    println!("App Version: {}", metadata.display(MetadataKey::AppVersion));
    println!("App Publisher: {}", metadata.display(MetadataKey::AppPublisher));
    println!("App Support URL: {}", metadata.display(MetadataKey::AppSupportUrl));
    println!("App Comments: {}", metadata.display(MetadataKey::AppComments));

    println!();
    println!("Variants Processed:");
    for (token, category) in summary.manifest.variants.iter() {
        println!("  Variant {token} -> {category}");
    }
    for conflict in summary.manifest.variants.conflicts() {
        println!(
            "  (line {}: variant {} was {} before, now {})",
            conflict.line, conflict.token, conflict.previous, conflict.current
        );
    }

    println!();
    println!("Output Directories Created:");
    for dir in summary.fan_out.output_dirs.values() {
        println!("  {}", dir.display());
    }

    println!();
    println!("Output Directory with raw unpack:");
    println!("  {}", summary.extracted_dir.display());

    let fan_out = &summary.fan_out;
    println!();
    println!(
        "Copied {} file(s): {} declared, {} tagged, {} common",
        fan_out.total_copies(),
        fan_out.declared_copies,
        fan_out.tagged_copies,
        fan_out.common_copies
    );
    if !fan_out.missing_sources.is_empty() {
        println!(
            "Skipped {} declared file(s) missing from the extraction",
            fan_out.missing_sources.len()
        );
    }
    if !fan_out.unmapped_tokens.is_empty() {
        let tokens: Vec<&str> = fan_out.unmapped_tokens.iter().map(|t| t.as_str()).collect();
        println!(
            "Placed files with unmapped variant(s) {} under Unknown",
            tokens.join(", ")
        );
    }
    if !summary.normalize.collisions.is_empty() {
        println!(
            "{} placeholder rename(s) skipped because the target existed",
            summary.normalize.collisions.len()
        );
    }
    if let Some(path) = log_file {
        println!("Log: {}", path.display());
    }
}

/// `--log-file` if given, `default` otherwise, nothing with `--no-log-file`.
fn log_file_path(matches: &ArgMatches, default: Option<PathBuf>) -> Option<PathBuf> {
    if matches.get_flag("no-log-file") {
        return None;
    }
    matches
        .get_one::<String>("log-file")
        .map(PathBuf::from)
        .or(default)
}

fn log_file_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("log-file")
            .long("log-file")
            .value_name("PATH")
            .help("Append a timestamped run log to PATH."),
    )
    .arg(
        Arg::new("no-log-file")
            .long("no-log-file")
            .action(ArgAction::SetTrue)
            .conflicts_with("log-file")
            .help("Do not write a run log file."),
    )
}

fn command() -> Command {
    let ascii_codecs: Vec<&'static str> = encodings()
        .iter()
        .filter(|&e| e.raw_decoder().is_ascii_compatible())
        .map(|e| e.name())
        .collect();

    Command::new("innorebuild")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Omer B. <omerbenamram@gmail.com>")
        .about("Rebuild per-architecture install trees from Inno Setup installers")
        .long_about(indoc!(r#"
            Rebuild per-architecture install trees from Inno Setup installers.

            The installer is unpacked with `innounp`, the generated `install_script.iss` is
            parsed, and every extracted file is copied into one `Output_<arch>` directory per
            architecture. Files shared by all architectures are copied into each of them.
        "#))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("check")
                .long("check")
                .global(true)
                .action(ArgAction::Append)
                .value_name("CHECK=CATEGORY")
                .help("Map an additional `Check:` function to an output category (e.g. InstallX86=x86). Can be passed multiple times."),
        )
        .arg(
            Arg::new("manifest-name")
                .long("manifest-name")
                .global(true)
                .value_name("NAME")
                .default_value("install_script.iss")
                .help("File name of the install script inside the extracted tree."),
        )
        .arg(
            Arg::new("output-prefix")
                .long("output-prefix")
                .global(true)
                .value_name("PREFIX")
                .default_value("Output_")
                .help("Prefix of the per-architecture output directories."),
        )
        .arg(
            Arg::new("ansi-codec")
                .long("ansi-codec")
                .global(true)
                .value_parser(PossibleValuesParser::new(ascii_codecs))
                .help("Codec for install scripts that are neither UTF-8 nor carry a BOM (ANSI installers)."),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
        .subcommand(log_file_args(unpack::command()))
        .subcommand(log_file_args(split::command()))
        .subcommand(inspect::command())
}

fn main() -> Result<()> {
    let matches = command().get_matches();

    match matches.subcommand() {
        Some(("unpack", sub)) => unpack::run(sub),
        Some(("split", sub)) => split::run(sub),
        Some(("inspect", sub)) => inspect::run(sub),
        _ => unreachable!("subcommand is required"),
    }
}
