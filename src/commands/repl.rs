use std::io::{self, IsTerminal, Write};

use clap::Args;

use crate::commands::TapeArgs;
use crate::repl::{ModeFlagOverride, ReplMode, execute_bare_once, repl_loop, select_mode};

#[derive(Args, Debug, Default)]
#[command(disable_help_flag = true)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Bytes that `,` reads during the session
    #[arg(long = "input", value_name = "TEXT")]
    pub input: Option<String>,

    #[command(flatten)]
    pub tape: TapeArgs,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

impl ReplArgs {
    fn mode_flag(&self) -> ModeFlagOverride {
        match (self.bare, self.editor) {
            (true, _) => ModeFlagOverride::Bare,
            (_, true) => ModeFlagOverride::Editor,
            _ => ModeFlagOverride::None,
        }
    }
}

pub fn run(program: &str, args: ReplArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(args.mode_flag()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let config = args.tape.resolve();
    let input = args.input.unwrap_or_default().into_bytes();

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let result = match mode {
        ReplMode::Editor => {
            // Print banners only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("Brainfuck REPL (interactive editor mode)");
                eprintln!("Ctrl+d/Ctrl+z Enter (Windows) executes the current buffer. Type :help for commands, ctrl+c to exit");
                let _ = io::stderr().flush();
            }
            repl_loop(&config, input)
        }
        // Bare mode: read stdin until EOF, execute once, exit 0
        ReplMode::Bare => execute_bare_once(program, &config, input),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: REPL error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} repl [--bare|--editor] [--input TEXT] [--tape-size N] [--wrap]

Options:
  --help,   -h        Show this help
  --bare              Force non-interactive bare mode
  --editor            Force interactive editor mode (errors if stdin is not a TTY)
  --input <TEXT>      Bytes that `,` reads, shared by the whole session
  --tape-size <N>     Number of tape cells (fallback BF_TAPE_SIZE; default 30000)
  --wrap              Wrap cell values modulo 256 instead of saturating

Description:
  Starts a REPL where every submission is streamed into one interpreter:
  the tape and any open loops carry over to the next submission.

Meta commands (line starts with ":")
  :exit            Exit immediately (code 0)
  :help            Show the meta command list
  :reset           Zero the tape and forget open loops
  :tape            Show the cells around the pointer

Notes:
    - Non-Brainfuck characters are ignored.
    - Ctrl+D executes the current buffer on *nix/macOS.
    - Ctrl+Z and Enter will execute the current buffer on Windows.
    - Ctrl+C exits the REPL immediately.
    - An error resets the tape.
    - The REPL will exit after a single execution if the environment variable `BF_REPL_ONCE` is set to `1`.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: BF_REPL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
