use std::io::{self, Write};

use clap::Args;
use tracing::debug;

use crate::cli_util::{ProgramSource, print_interpreter_error, print_warning};
use crate::commands::TapeArgs;
use crate::interpreter::StdioInterpreter;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Read the program from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Concatenated program parts
    #[arg(value_name = "code", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,

    #[command(flatten)]
    pub tape: TapeArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs { file, code, tape, .. } = args;

    let source = match ProgramSource::from_args(file, code) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            usage_and_exit(program, 2);
        }
    };

    let config = tape.resolve();
    debug!(?config, "resolved interpreter config");

    let mut bf = match StdioInterpreter::stdio(&config) {
        Ok(bf) => bf,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 2;
        }
    };

    let stream = match source.open() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: failed to open program file: {e}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    if let Err(err) = bf.run(stream) {
        let _ = io::stdout().flush();
        print_interpreter_error(Some(program), &err);
        return 1;
    }

    if let Err(open) = bf.finish() {
        print_warning(program, &open);
    }
    0
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [--tape-size N] [--wrap] "<code>"
  {0} run [--tape-size N] [--wrap] --file <PATH>

Options:
  --file,  -f <PATH>  Read the program from PATH instead of positional "<code>"
  --tape-size <N>     Number of tape cells (fallback BF_TAPE_SIZE; default 30000)
  --wrap              Wrap cell values modulo 256 instead of saturating
  --help,  -h         Show this help

Notes:
- The program is executed as it is read; characters outside ><+-.,[] are ignored.
- `.` prints "pointer: <p>, string_value: <n>, byte_value: <c>" on its own line.
- `,` reads one byte from stdin; at end of input the cell is left unchanged.
  Newlines are skipped when stdin is a terminal (BF_SKIP_NEWLINES overrides).
- The tape is circular: moving past either end wraps around.
- Options go before the code; everything after the first code part is program text.

Examples:
- Run a program from a file:
    {0} run --file ./program.bf
- Feed bytes to `,` from a file:
    {0} run ",.,." < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
