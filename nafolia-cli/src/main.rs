//! Command-line interface for nafolia
//! Converts linguistic annotation documents between NAF and FoLiA.
//!
//! Usage:
//!   nafolia convert `<input>` [-o `<output>`] [--from auto|naf|folia] [--to naf|folia]
//!                   [--id `<id>`] [--sense-mode ranked|flat] [--config `<file>`]
//!                   [--set key=value]... [--diagnostics text|json]
//!   nafolia list-conversions
//!
//! Logging goes to stderr and is controlled by `NAFOLIA_LOG` (default `warn`), so every
//! skipped item shows up as a warning. `--diagnostics` prints the collected diagnostics once
//! more as a report after the conversion.

use clap::{Arg, ArgAction, ArgMatches, Command};
use nafolia_babel::{ConversionError, ConversionRegistry, Diagnostics, FormatKind};
use nafolia_config::Loader;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "NAFOLIA_LOG";

fn main() {
    let matches = Command::new("nafolia")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert linguistic annotation documents between NAF and FoLiA")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("convert")
                .about("Convert a document to the other format")
                .arg(
                    Arg::new("input")
                        .help("Path to the NAF or FoLiA document")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the result here instead of stdout"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Input format")
                        .value_parser(["auto", "naf", "folia"])
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Output format (default: the other one)")
                        .value_parser(["naf", "folia"]),
                )
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Document id for FoLiA output (default: input file name up to the first '.')"),
                )
                .arg(
                    Arg::new("sense-mode")
                        .long("sense-mode")
                        .help("How competing senses are written to FoLiA")
                        .value_parser(["ranked", "flat"]),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                )
                .arg(
                    Arg::new("set")
                        .long("set")
                        .help("Override a configuration key (e.g. folia2naf.timestamp=2024-01-01T00:00:00Z)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("diagnostics")
                        .long("diagnostics")
                        .help("Print a report of skipped items after converting")
                        .value_parser(["text", "json"]),
                ),
        )
        .subcommand(Command::new("list-conversions").about("List the available conversions"))
        .get_matches();

    init_logging();

    match matches.subcommand() {
        Some(("convert", sub)) => handle_convert_command(sub),
        Some(("list-conversions", _)) => handle_list_conversions_command(),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn fail(message: impl std::fmt::Display, code: i32) -> ! {
    eprintln!("error: {message}");
    process::exit(code);
}

/// Invalid or missing document ids get their own exit code
fn exit_code(error: &ConversionError) -> i32 {
    match error {
        ConversionError::InvalidDocumentId { .. } | ConversionError::MissingDocumentId => 2,
        _ => 1,
    }
}

fn load_config(matches: &ArgMatches) -> nafolia_babel::ConvertOptions {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(mode) = matches.get_one::<String>("sense-mode") {
        loader = loader
            .set_override("naf2folia.sense_mode", mode.as_str())
            .unwrap_or_else(|e| fail(e, 1));
    }
    for assignment in matches.get_many::<String>("set").into_iter().flatten() {
        loader = loader
            .set_assignment(assignment)
            .unwrap_or_else(|e| fail(e, 1));
    }
    let config = loader
        .build()
        .unwrap_or_else(|e| fail(format!("configuration: {e}"), 1));
    config.convert_options()
}

fn format_arg(matches: &ArgMatches, name: &str) -> Option<FormatKind> {
    matches
        .get_one::<String>(name)
        .filter(|value| value.as_str() != "auto")
        .map(|value| value.parse().unwrap_or_else(|e: String| fail(e, 1)))
}

/// Handle the convert command
fn handle_convert_command(matches: &ArgMatches) {
    let input = matches
        .get_one::<String>("input")
        .expect("input is a required argument");
    let source = fs::read_to_string(input)
        .unwrap_or_else(|e| fail(format!("can not read {input}: {e}"), 1));

    let from = match format_arg(matches, "from") {
        Some(format) => format,
        None => FormatKind::detect(&source).unwrap_or_else(|e| fail(e, 1)),
    };
    let to = format_arg(matches, "to").unwrap_or(match from {
        FormatKind::Naf => FormatKind::Folia,
        FormatKind::Folia => FormatKind::Naf,
    });

    let mut options = load_config(matches).with_source_name(input.as_str());
    if let Some(id) = matches.get_one::<String>("id") {
        options = options.with_document_id(id.as_str());
    }

    tracing::debug!(input = %input, from = %from, to = %to, "converting");
    let registry = ConversionRegistry::with_defaults();
    let output = registry
        .convert(&source, from, to, &options)
        .unwrap_or_else(|e| fail(&e, exit_code(&e)));

    if let Some(format) = matches.get_one::<String>("diagnostics") {
        print_diagnostics(&output.diagnostics, format);
    }

    match matches.get_one::<String>("output") {
        Some(path) => fs::write(path, &output.document)
            .unwrap_or_else(|e| fail(format!("can not write {path}: {e}"), 1)),
        None => print!("{}", output.document),
    }
}

fn print_diagnostics(diagnostics: &Diagnostics, format: &str) {
    if format == "json" {
        let json = diagnostics
            .to_json()
            .unwrap_or_else(|e| fail(format!("formatting diagnostics: {e}"), 1));
        eprintln!("{json}");
        return;
    }
    for diagnostic in diagnostics.iter() {
        let element = diagnostic.element.as_deref().unwrap_or("-");
        let context = diagnostic.context.as_deref().unwrap_or("-");
        eprintln!(
            "{}: {} in {}: {}",
            diagnostic.kind.as_str(),
            element,
            context,
            diagnostic.message
        );
    }
    eprintln!("{} diagnostic(s)", diagnostics.len());
}

/// Handle the list-conversions command
fn handle_list_conversions_command() {
    let registry = ConversionRegistry::with_defaults();
    println!("Available conversions:\n");

    for name in registry.list_conversions() {
        if let Some(conversion) = registry.get(&name) {
            println!("  {}", name);
            println!(
                "    {} ({} → {})",
                conversion.description(),
                conversion.source(),
                conversion.target()
            );
            println!();
        }
    }
}
