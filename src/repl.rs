use std::env;
use std::io::{self, Cursor, IsTerminal, Write};

use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, Highlighter, HistoryItem, Signal, StyledText};
use tracing::debug;

use crate::cli_util::{print_interpreter_error, print_warning};
use crate::config::{Config, ConfigError};
use crate::error::InterpreterError;
use crate::interpreter::Interpreter;
use crate::op::{Op, ops_only};
use crate::theme;

/// Cells shown by `:tape`, aligned to a multiple of this width.
const TAPE_WINDOW: usize = 8;

/// One interactive session: a single interpreter that every submission is
/// streamed into, so the tape and any still-open loops carry over between
/// submissions.
pub struct ReplSession<O> {
    bf: Interpreter<Cursor<Vec<u8>>, O>,
}

impl<O: Write> ReplSession<O> {
    /// `input` is what `,` reads, consumed across the whole session.
    pub fn new(config: &Config, input: Vec<u8>, output: O) -> Result<Self, ConfigError> {
        Ok(Self {
            bf: Interpreter::new(config, Cursor::new(input), output)?,
        })
    }

    /// Stream `text` into the interpreter. On error the session starts over
    /// with a zeroed tape.
    pub fn submit(&mut self, text: &str) -> Result<(), InterpreterError> {
        if let Err(e) = self.bf.run(text.as_bytes()) {
            debug!(error = %e, "submission failed; resetting session");
            self.bf.reset();
            return Err(e);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.bf.reset();
    }

    pub fn open_loops(&self) -> usize {
        self.bf.loop_depth()
    }

    /// Report a loop left open at the end of the session.
    pub fn finish(&self) -> Result<(), InterpreterError> {
        self.bf.finish()
    }

    /// One line describing the tape around the cursor, e.g.
    /// `ptr=9 cells[8..16]: 0 *3 0 0 0 0 0 0`.
    pub fn tape_summary(&self) -> String {
        let tape = self.bf.tape();
        let ptr = tape.cursor();
        let base = ptr - ptr % TAPE_WINDOW;
        let end = (base + TAPE_WINDOW).min(tape.len());
        let cells: Vec<String> = (base..end)
            .map(|i| {
                let v = tape.cells()[i];
                if i == ptr { format!("*{v}") } else { v.to_string() }
            })
            .collect();
        format!("ptr={ptr} cells[{base}..{end}]: {}", cells.join(" "))
    }

    pub fn output(&self) -> &O {
        self.bf.output()
    }
}

/// A line starting with `:` is a meta command, not program text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Meta {
    Exit,
    Help,
    Reset,
    Tape,
    Unknown(String),
}

pub fn parse_meta(submission: &str) -> Option<Meta> {
    let cmd = submission.trim().strip_prefix(':')?;
    Some(match cmd.trim() {
        "exit" | "quit" | "q" => Meta::Exit,
        "help" | "h" => Meta::Help,
        "reset" => Meta::Reset,
        "tape" => Meta::Tape,
        other => Meta::Unknown(other.to_string()),
    })
}

fn print_meta_help() {
    eprintln!(
        r#"Meta commands (line starts with ":")
  :exit    Exit immediately (code 0)
  :help    Show this help
  :reset   Zero the tape and forget open loops
  :tape    Show the cells around the pointer"#
    );
    let _ = io::stderr().flush();
}

pub fn repl_loop(config: &Config, input: Vec<u8>) -> io::Result<()> {
    let mut editor = init_line_editor()?;
    let mut session = ReplSession::new(config, input, io::stdout()).map_err(io::Error::other)?;

    loop {
        let Some(submission) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        if let Some(meta) = parse_meta(&submission) {
            match meta {
                Meta::Exit => return Ok(()),
                Meta::Help => print_meta_help(),
                Meta::Reset => session.reset(),
                Meta::Tape => eprintln!("{}", session.tape_summary()),
                Meta::Unknown(cmd) => eprintln!("unknown meta command ':{cmd}' (try :help)"),
            }
            continue;
        }

        if ops_only(&submission).is_empty() {
            continue;
        }

        match session.submit(&submission) {
            Err(err) => print_interpreter_error(None, &err),
            Ok(()) if session.open_loops() > 0 => {
                eprintln!("({} open loop(s), waiting for ']')", session.open_loops());
            }
            Ok(()) => {}
        }
        let _ = io::stderr().flush();

        // Test hook: if BF_REPL_ONCE=1, exit after one execution
        if env::var("BF_REPL_ONCE").ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent, default_emacs_keybindings,
    };

    // Enter inserts a newline; Ctrl+D (Ctrl+Z on Windows) submits the buffer.
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the buffer; Alt or Ctrl with Up/Down browse history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000).map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(OpHighlighter))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

/// Collect all lines until EOF. `None` when nothing was read.
pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    let mut buffer = String::new();

    loop {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => buffer.push_str(&line),
            Err(_) => return None,
        }
    }

    if buffer.is_empty() { None } else { Some(buffer) }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("bf".to_string()),
        DefaultPromptSegment::Empty,
    );

    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted buffer
            if !buffer.trim().is_empty() {
                let _ = editor
                    .history_mut()
                    .save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Choose the mode: flag, then `BF_REPL_MODE`, then whether stdin is a terminal.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !io::stdin().is_terminal() {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BF_REPL_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Ok(val) = env::var("BF_REPL_MODE") {
        return match val.trim().to_ascii_lowercase().as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !io::stdin().is_terminal() {
                    return Err("cannot start editor: stdin is not a TTY (use BF_REPL_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid BF_REPL_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if io::stdin().is_terminal() {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

/// Read stdin to EOF and run it once as a program.
pub fn execute_bare_once(program: &str, config: &Config, input: Vec<u8>) -> io::Result<()> {
    let mut locked = io::BufReader::new(io::stdin().lock());
    let Some(submission) = read_submission(&mut locked) else {
        return Ok(());
    };

    let mut session = ReplSession::new(config, input, io::stdout()).map_err(io::Error::other)?;
    match session.submit(&submission) {
        Err(err) => print_interpreter_error(None, &err),
        Ok(()) => {
            if let Err(open) = session.finish() {
                print_warning(program, &open);
            }
        }
    }
    io::stdout().flush()
}

/// Colors each op-code by its role; everything else is dimmed.
struct OpHighlighter;

impl Highlighter for OpHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let mut current: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let op = u8::try_from(ch).ok().and_then(Op::from_byte);
            let style = theme::op_style(op);
            match current {
                Some(s) if s == style => {}
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current = Some(style);
                }
                None => current = Some(style),
            }
            buffer.push(ch);
        }

        if let Some(s) = current {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}
