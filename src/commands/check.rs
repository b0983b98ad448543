use std::io::{self, Write};

use clap::Args;

use crate::cli_util::{ProgramSource, print_interpreter_error};
use crate::diagnostics::validate;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct CheckArgs {
    /// Read the program from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated program parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: CheckArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let source = match ProgramSource::from_args(args.file, args.code) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            usage_and_exit(program, 2);
        }
    };

    let text = match source.read_all() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{program}: failed to read program file: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    match validate(&text) {
        Ok(()) => {
            println!("ok");
            let _ = io::stdout().flush();
            0
        }
        Err(err) => {
            print_interpreter_error(Some(program), &err);
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} check "<code>"
  {0} check --file <PATH>

Options:
  --file,  -f <PATH>  Read the program from PATH instead of positional "<code>"
  --help,  -h         Show this help

Description:
  Validates a program without running it. Reports the first of:
  - a ']' with no open '['
  - a loop with no instructions between its brackets
  - a '[' that is never closed
  Prints "ok" and exits 0 when none is found; otherwise exits 1.
  Options go before the code.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
