use std::env;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use replay_bf::commands::{self, check::CheckArgs, repl::ReplArgs, run::RunArgs};
use tracing_subscriber::EnvFilter;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run   [--tape-size N] [--wrap] "<code>"  # Run a program (args are concatenated)
  {0} run   [--tape-size N] [--wrap] --file <PATH>
  {0} check "<code>" | --file <PATH>           # Validate loops without running
  {0} repl  [--bare|--editor] [--input TEXT]   # Start a REPL (default when no subcommand is given)

Run "{0} <subcommand> --help" for more info.
Set RUST_LOG=debug (or trace) to log interpreter activity to stderr.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Check(CheckArgs),
    Repl(ReplArgs),
}

fn init_tracing() {
    // stdout carries program output only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();

    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match cli.command {
        Some(Command::Run(args)) => commands::run::run(&program, args),
        Some(Command::Check(args)) => commands::check::run(&program, args),
        Some(Command::Repl(args)) => commands::repl::run(&program, args),
        None => commands::repl::run(&program, ReplArgs::default()),
    };

    std::process::exit(code);
}
