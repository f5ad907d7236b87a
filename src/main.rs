use anyhow::Context;
use bisaya::{repl, runner};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use std::fs;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let matches = match command().try_get_matches() {
        Ok(matches) => matches,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => error.exit(),
            _ => {
                let _ = error.print();
                eprintln!("Usage: bisaya [script]");
                std::process::exit(runner::EXIT_USAGE);
            }
        },
    };

    let show_tokens = matches.get_flag("tokens");

    let exit_code = match matches.get_one::<String>("file") {
        Some(file_path) => match run_file(file_path, show_tokens) {
            Ok(code) => code,
            Err(error) => {
                eprintln!("Error: {:#}", error);
                1
            }
        },
        None => {
            repl::start(show_tokens);
            runner::EXIT_OK
        }
    };

    std::process::exit(exit_code);
}

fn command() -> Command {
    Command::new("bisaya")
        .about("An interpreter for the Bisaya++ teaching language")
        .arg(
            Arg::new("file")
                .help("The script file to execute; starts an interactive prompt when omitted")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream before running")
                .action(ArgAction::SetTrue),
        )
}

fn run_file(path: &str, show_tokens: bool) -> anyhow::Result<i32> {
    let source =
        fs::read_to_string(path).with_context(|| format!("could not read file '{}'", path))?;

    if show_tokens {
        runner::dump_tokens(&source);
    }

    Ok(runner::run(&source, Some(path)))
}

/// Logs go to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
