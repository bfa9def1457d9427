use clap::{Arg, ArgAction, ArgMatches, Command};
use std::fs;
use tracing::{info, Level};

use onepass::config::ParserConfig;
use onepass::error::CompileResult;
use onepass::{compile, Compilation};

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_count("verbose"));

    match run(&matches) {
        Ok(()) => {}
        Err(e) => {
            let messages = e.messages();
            for message in &messages {
                println!("{}", message);
            }
            println!("{} errors found", messages.len());
            std::process::exit(1);
        }
    }
}

fn cli() -> Command {
    Command::new("onepass")
        .version("0.1.0")
        .about("One-pass parser and semantic checker for the teaching language")
        .arg(
            Arg::new("input")
                .help("Source file to check")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .help("Artifact to print after a successful parse")
                .value_parser(["none", "ast", "symbols"])
                .default_value("none"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Output format for the emitted artifact")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("JSON file with parser settings"),
        )
        .arg(
            Arg::new("strict-conditions")
                .long("strict-conditions")
                .help("Require BOOL conditions in branches and loops")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-propagate")
                .long("no-propagate")
                .help("Do not substitute known constants for identifiers")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log more (repeat for more detail)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches) -> CompileResult<()> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ParserConfig::load(path)?,
        None => ParserConfig::default(),
    };
    if matches.get_flag("strict-conditions") {
        config.strict_conditions = true;
    }
    if matches.get_flag("no-propagate") {
        config.propagate_constants = false;
    }

    // `input` is required, so clap guarantees it is present
    let input_file = matches
        .get_one::<String>("input")
        .map(String::as_str)
        .unwrap_or_default();
    info!(input = input_file, ?config, "checking");

    let source = fs::read_to_string(input_file)?;
    let compilation = compile(&source, &config)?;

    println!("{}", summary(&compilation.diagnostics));

    let emit = matches.get_one::<String>("emit").map(String::as_str);
    let json = matches.get_one::<String>("format").map(String::as_str) == Some("json");
    emit_artifact(&compilation, emit.unwrap_or("none"), json)
}

/// Print the non-fatal diagnostics and return the closing summary line.
fn summary(diagnostics: &[String]) -> String {
    for diagnostic in diagnostics {
        println!("{}", diagnostic);
    }
    match diagnostics.len() {
        0 => "no errors found".to_string(),
        n => format!("{} non-fatal errors found", n),
    }
}

fn emit_artifact(compilation: &Compilation, emit: &str, json: bool) -> CompileResult<()> {
    match (emit, json) {
        ("ast", true) => println!("{}", serde_json::to_string_pretty(&compilation.program)?),
        ("ast", false) => {
            for statement in &compilation.program.statements {
                println!("{:#?}", statement);
            }
        }
        ("symbols", true) => println!(
            "{}",
            serde_json::to_string_pretty(compilation.symbols.symbols())?
        ),
        ("symbols", false) => {
            for symbol in compilation.symbols.symbols() {
                let value = symbol
                    .value
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<12} {:<8} line {:<4} value {}",
                    symbol.name,
                    symbol.kind.to_string(),
                    symbol.declared_at_line,
                    value
                );
            }
        }
        _ => {}
    }
    Ok(())
}
